use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::GrayImage;

use super::face_detection::{DetectionParams, FaceBox, FaceDetector};
use crate::error::ProcessorError;

/// Score threshold for the SeetaFace funnel cascade. The cascade has no
/// neighbour-voting stage, so this stands in for `min_neighbors`.
const SCORE_THRESHOLD: f64 = 2.0;

/// Sliding window stride in pixels.
const WINDOW_STEP: u32 = 4;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model file is read once in [`RustfaceDetector::load`]; every call to
/// `detect` builds a fresh detector from a clone of it, so the backend can be
/// shared between worker threads.
pub struct RustfaceDetector {
    model: rustface::Model,
    params: DetectionParams,
}

impl RustfaceDetector {
    /// Load the SeetaFace model at `model_path`.
    pub fn load(model_path: &Path, params: DetectionParams) -> Result<Self, ProcessorError> {
        let file = File::open(model_path).map_err(|e| {
            ProcessorError::Configuration(format!(
                "face detector model not found at {}: {}",
                model_path.display(),
                e
            ))
        })?;

        let model = rustface::read_model(BufReader::new(file)).map_err(|e| {
            ProcessorError::Configuration(format!(
                "failed to load face detector model {}: {}",
                model_path.display(),
                e
            ))
        })?;

        tracing::debug!(model = %model_path.display(), "Face detector model loaded");
        Ok(Self { model, params })
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image: &GrayImage) -> Vec<FaceBox> {
        let (width, height) = image.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.params.min_face_size);
        detector.set_score_thresh(SCORE_THRESHOLD);
        // rustface shrinks the image per pyramid level instead of growing the window
        detector.set_pyramid_scale_factor(1.0 / self.params.scale_step);
        detector.set_slide_window_step(WINDOW_STEP, WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(image.as_raw(), width, height));

        faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                FaceBox::clamped(
                    bbox.x() as i64,
                    bbox.y() as i64,
                    bbox.width() as i64,
                    bbox.height() as i64,
                    width,
                    height,
                )
            })
            .collect()
    }
}
