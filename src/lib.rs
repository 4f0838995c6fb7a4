// Library exports for the CLI and for embedding the pipeline elsewhere
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use error::ProcessorError;
pub use image_processing::batch::{
    BatchConfig, BatchEvent, BatchReport, BatchRunner, FileOutcome, FileReport, FileStatus,
};
pub use image_processing::crop::CropRegion;
pub use image_processing::face_detection::{DetectionParams, FaceBox, FaceDetector};
pub use image_processing::rustface_backend::RustfaceDetector;
pub use image_processing::{ProcessedImage, ProcessingEngine, ProcessingOptions};
pub use json_output::JsonMessage;
