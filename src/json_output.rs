//! JSON output for machine consumers
//!
//! When --json-progress is enabled, status information is emitted as one JSON
//! object per line on stdout and the styled console output is suppressed.

use serde::{Deserialize, Serialize};

use crate::image_processing::batch::{BatchReport, FileReport, FileStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Emitted once after discovery
    Started { total_files: usize },
    /// File processed and written
    FileCompleted {
        input_path: String,
        output_path: String,
        width: u32,
        height: u32,
        face_detected: bool,
    },
    /// File skipped because processing failed
    FileFailed { input_path: String, error: String },
    /// Processing summary
    Summary {
        total_files: usize,
        processed: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn from_report(report: &FileReport) -> Self {
        let input_path = report.input_path.display().to_string();

        match &report.status {
            FileStatus::Saved {
                output_path,
                width,
                height,
                face_detected,
            } => JsonMessage::FileCompleted {
                input_path,
                output_path: output_path.display().to_string(),
                width: *width,
                height: *height,
                face_detected: *face_detected,
            },
            FileStatus::Failed { error } => JsonMessage::FileFailed {
                input_path,
                error: error.clone(),
            },
        }
    }

    pub fn summary(report: &BatchReport) -> Self {
        JsonMessage::Summary {
            total_files: report.discovered,
            processed: report.successful(),
            failed: report.failed(),
            duration_secs: report.elapsed.as_secs_f64(),
        }
    }
}
