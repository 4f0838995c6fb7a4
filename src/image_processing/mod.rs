pub mod batch;
pub mod crop;
pub mod encode;
pub mod face_detection;
pub mod resize;
pub mod rustface_backend;

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::error::ProcessorError;
use crop::CropRegion;
use face_detection::{DetectionParams, FaceBox, FaceDetector};
use rustface_backend::RustfaceDetector;

/// Validated, read-only settings shared by every pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOptions {
    target_width: u32,
    target_height: u32,
    dpi: u16,
    model_path: PathBuf,
}

impl ProcessingOptions {
    pub fn new(
        target_width: u32,
        target_height: u32,
        dpi: u32,
        model_path: impl Into<PathBuf>,
    ) -> Result<Self, ProcessorError> {
        let model_path = model_path.into();

        if target_width == 0 || target_height == 0 {
            return Err(ProcessorError::Configuration(format!(
                "target width and height must be greater than zero, got {}x{}",
                target_width, target_height
            )));
        }
        if dpi == 0 {
            return Err(ProcessorError::Configuration(
                "dpi must be greater than zero".to_string(),
            ));
        }
        // JFIF stores density in 16 bits
        let dpi = u16::try_from(dpi).map_err(|_| {
            ProcessorError::Configuration(format!("dpi must be at most {}, got {}", u16::MAX, dpi))
        })?;
        if model_path.to_string_lossy().trim().is_empty() {
            return Err(ProcessorError::Configuration(
                "face detector model path must not be empty".to_string(),
            ));
        }

        Ok(Self {
            target_width,
            target_height,
            dpi,
            model_path,
        })
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    pub fn target_height(&self) -> u32 {
        self.target_height
    }

    pub fn dpi(&self) -> u16 {
        self.dpi
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

/// Output of one pipeline run, ready to be written.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub image: RgbImage,
    pub dpi: u16,
    pub file_name: String,
    /// Face the crop was planned around, if one was found.
    pub face: Option<FaceBox>,
    pub crop: CropRegion,
}

impl ProcessedImage {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode::encode_jpeg(&self.image, self.dpi)
    }

    /// Encode and write into `output_dir`, returning the written path.
    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        let output_path = output_dir.join(&self.file_name);
        let data = self.encode()?;
        std::fs::write(&output_path, data)
            .with_context(|| format!("Failed to save JPEG: {}", output_path.display()))?;
        Ok(output_path)
    }
}

/// Name of the file written for `input_path`.
///
/// The input's own file name is kept unchanged, so distinct inputs of one
/// directory always map to distinct outputs. The contents are always JPEG.
pub fn output_file_name(input_path: &Path) -> String {
    input_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.jpg".to_string())
}

/// Single-image pipeline: load, detect, plan, crop, resize, tag.
pub struct ProcessingEngine {
    options: ProcessingOptions,
    detector: Box<dyn FaceDetector>,
}

impl ProcessingEngine {
    /// Build an engine with the SeetaFace backend loaded from the options'
    /// model path. Fails once, here, if the model is unusable.
    pub fn new(options: ProcessingOptions) -> Result<Self, ProcessorError> {
        let detector = RustfaceDetector::load(options.model_path(), DetectionParams::default())?;
        Ok(Self::with_detector(options, Box::new(detector)))
    }

    pub fn with_detector(options: ProcessingOptions, detector: Box<dyn FaceDetector>) -> Self {
        Self { options, detector }
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Load `input_path` and run the pipeline on it.
    pub fn process_file(&self, input_path: &Path) -> Result<ProcessedImage> {
        let img = image::open(input_path)
            .with_context(|| format!("Failed to open image: {}", input_path.display()))?
            .to_rgb8();

        self.process_image(&img, output_file_name(input_path))
    }

    /// Run detect → plan → crop → resize → tag on an already decoded image.
    pub fn process_image(&self, img: &RgbImage, file_name: String) -> Result<ProcessedImage> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!("Image has zero dimensions"));
        }

        let gray = face_detection::prepare_detection_image(img);
        let faces = self.detector.detect(&gray);
        let face = crop::select_largest_face(&faces).copied();

        tracing::debug!(
            file = %file_name,
            faces = faces.len(),
            selected = ?face,
            "Face detection finished"
        );

        let region = crop::plan_crop(width, height, face.as_ref());
        let cropped = crop::crop_image(img, &region)?;

        let resized = resize::resize_proportionally(
            &cropped,
            self.options.target_width,
            self.options.target_height,
        )?;

        tracing::debug!(
            file = %file_name,
            crop = ?region,
            output_width = resized.width(),
            output_height = resized.height(),
            "Image resized"
        );

        Ok(ProcessedImage {
            image: resized,
            dpi: self.options.dpi,
            file_name,
            face,
            crop: region,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb};

    struct FixedDetector(Vec<FaceBox>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _image: &GrayImage) -> Vec<FaceBox> {
            self.0.clone()
        }
    }

    fn engine(faces: Vec<FaceBox>, width: u32, height: u32, dpi: u32) -> ProcessingEngine {
        let options = ProcessingOptions::new(width, height, dpi, "model.bin").unwrap();
        ProcessingEngine::with_detector(options, Box::new(FixedDetector(faces)))
    }

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 3 + y) % 256) as u8])
        })
    }

    #[test]
    fn test_options_valid() {
        let options = ProcessingOptions::new(400, 400, 300, "haar.xml").unwrap();
        assert_eq!(options.target_width(), 400);
        assert_eq!(options.target_height(), 400);
        assert_eq!(options.dpi(), 300);
        assert_eq!(options.model_path(), Path::new("haar.xml"));
    }

    #[test]
    fn test_options_each_violation_is_configuration_error() {
        let cases = [
            ProcessingOptions::new(0, 400, 300, "m.bin"),
            ProcessingOptions::new(400, 0, 300, "m.bin"),
            ProcessingOptions::new(400, 400, 0, "m.bin"),
            ProcessingOptions::new(400, 400, 70_000, "m.bin"),
            ProcessingOptions::new(400, 400, 300, ""),
            ProcessingOptions::new(400, 400, 300, "   "),
        ];

        for case in cases {
            assert!(matches!(case, Err(ProcessorError::Configuration(_))));
        }
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(Path::new("in/photo.jpg")), "photo.jpg");
        assert_eq!(output_file_name(Path::new("in/photo.png")), "photo.png");
        assert_eq!(output_file_name(Path::new("in/scan.BMP")), "scan.BMP");
    }

    #[test]
    fn test_output_file_name_is_one_to_one() {
        let names = [
            "a.png", "a_png.jpg", "b.jpg", "b.JPG", "x.jpeg", "x_jpeg.jpg", "x.JPEG",
        ];
        let outputs: std::collections::HashSet<String> = names
            .iter()
            .map(|name| output_file_name(&Path::new("in").join(name)))
            .collect();

        assert_eq!(outputs.len(), names.len());
    }

    #[test]
    fn test_pipeline_face_example() {
        let engine = engine(vec![FaceBox::new(100, 100, 60, 60)], 100, 100, 300);
        let img = create_test_image(300, 300);

        let processed = engine.process_image(&img, "a.jpg".to_string()).unwrap();

        assert_eq!(
            processed.crop,
            CropRegion {
                x: 58,
                y: 58,
                width: 144,
                height: 144
            }
        );
        assert_eq!(processed.image.dimensions(), (100, 100));
        assert_eq!(processed.dpi, 300);
        assert_eq!(processed.face, Some(FaceBox::new(100, 100, 60, 60)));
    }

    #[test]
    fn test_pipeline_selects_larger_face() {
        let faces = vec![FaceBox::new(10, 10, 50, 50), FaceBox::new(0, 0, 200, 200)];
        let engine = engine(faces, 100, 100, 300);
        let img = create_test_image(800, 800);

        let processed = engine.process_image(&img, "a.jpg".to_string()).unwrap();
        assert_eq!(processed.face, Some(FaceBox::new(0, 0, 200, 200)));
        assert_eq!(processed.crop, CropRegion { x: 0, y: 0, width: 480, height: 480 });
    }

    #[test]
    fn test_pipeline_without_face_uses_whole_image() {
        let engine = engine(Vec::new(), 400, 400, 300);
        let img = create_test_image(800, 600);

        let processed = engine.process_image(&img, "a.jpg".to_string()).unwrap();
        assert_eq!(processed.face, None);
        assert_eq!(processed.crop, CropRegion::full(800, 600));
        assert_eq!(processed.image.dimensions(), (400, 300));
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let engine = engine(vec![FaceBox::new(40, 30, 50, 60)], 120, 160, 300);
        let img = create_test_image(200, 180);

        let first = engine.process_image(&img, "a.jpg".to_string()).unwrap();
        let second = engine.process_image(&img, "a.jpg".to_string()).unwrap();

        assert_eq!(first.image, second.image);
        assert_eq!(first.encode().unwrap(), second.encode().unwrap());
    }

    #[test]
    fn test_processed_image_encode_carries_dpi() {
        let engine = engine(Vec::new(), 50, 50, 150);
        let img = create_test_image(100, 100);

        let processed = engine.process_image(&img, "a.jpg".to_string()).unwrap();
        let data = processed.encode().unwrap();
        assert_eq!(encode::read_jfif_dpi(&data), Some((150, 150)));
    }

    #[test]
    fn test_process_file_rejects_corrupt_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let engine = engine(Vec::new(), 100, 100, 300);
        let err = engine.process_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.png"));
    }

    #[test]
    fn test_new_with_missing_model_fails() {
        let options = ProcessingOptions::new(100, 100, 300, "/nonexistent/model.bin").unwrap();
        assert!(matches!(
            ProcessingEngine::new(options),
            Err(ProcessorError::Configuration(_))
        ));
    }
}
