use clap::Parser;
use std::path::PathBuf;

use crate::utils::{default_model_path, parse_extensions, DEFAULT_EXTENSIONS};

pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 400;
pub const DEFAULT_DPI: u32 = 300;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "photoid-processor",
    version,
    about = "Batch processor for identification-style photos",
    long_about = "
Photo ID Processor

Finds the most prominent face in every photo of a directory, crops around it
with room for hair and shoulders, scales the crop to fit the target size and
writes a JPEG tagged with the requested DPI. Photos without a detectable face
are scaled whole. A file that cannot be processed is reported and skipped.

Example Usage:
  # Defaults: 400x400 at 300 dpi
  photoid-processor ~/Photos/originals ~/Photos/id

  # Passport-style 413x531 at 300 dpi using 4 workers
  photoid-processor ~/Photos/originals ~/Photos/id 413 531 300 --jobs 4

  # Explicit model location and machine-readable progress
  photoid-processor in out --model ./models/seeta_fd_frontal_v1.0.bin --json-progress

  # Simulate without writing anything
  photoid-processor in out --dry-run --verbose"
)]
pub struct Args {
    /// Directory containing the source photos
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Directory for processed photos (created if missing)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Maximum output width in pixels [default: 400]
    #[arg(value_name = "WIDTH")]
    pub width: Option<u32>,

    /// Maximum output height in pixels [default: 400]
    #[arg(value_name = "HEIGHT")]
    pub height: Option<u32>,

    /// Resolution written into every output file [default: 300]
    #[arg(value_name = "DPI")]
    pub dpi: Option<u32>,

    /// Face detector model [default: models/seeta_fd_frontal_v1.0.bin next to the executable]
    #[arg(short = 'm', long = "model", value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Comma separated input extensions, case-insensitive [default: jpg,jpeg,png,bmp]
    #[arg(long = "extensions", value_name = "LIST")]
    pub extensions: Option<String>,

    /// Number of parallel jobs (0 = one per CPU) [default: 1]
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// JSON config file; command-line values take precedence
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Run the whole pipeline without creating or writing any file
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Log every processing stage
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Emit progress as JSON lines on stdout instead of styled output
    #[arg(long = "json-progress")]
    pub json_progress: bool,
}

impl Args {
    pub fn target_width(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_WIDTH)
    }

    pub fn target_height(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_HEIGHT)
    }

    pub fn target_dpi(&self) -> u32 {
        self.dpi.unwrap_or(DEFAULT_DPI)
    }

    pub fn model_path(&self) -> PathBuf {
        self.model.clone().unwrap_or_else(default_model_path)
    }

    pub fn extensions(&self) -> Vec<String> {
        match &self.extensions {
            Some(list) => parse_extensions(list),
            None => DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    pub fn parallel_jobs(&self) -> usize {
        match self.jobs {
            None => 1,
            Some(0) => num_cpus::get(),
            Some(jobs) => jobs,
        }
    }
}
