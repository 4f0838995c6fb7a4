use image::{GrayImage, RgbImage};

/// Bounding box of a detected face, in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Intersect a raw detector rectangle (which may start at negative
    /// coordinates or run past the edges) with the image bounds.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the image.
    pub fn clamped(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        let left = x.max(0);
        let top = y.max(0);
        let right = (x + width).min(image_width as i64);
        let bottom = (y + height).min(image_height as i64);

        if right <= left || bottom <= top {
            return None;
        }

        Some(Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

/// Multi-scale scan parameters handed to a detector backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Growth factor between successive scan scales.
    pub scale_step: f32,
    /// Number of overlapping candidate windows required to accept a face.
    /// Only meaningful for backends that group raw windows.
    pub min_neighbors: u32,
    /// Smallest face edge (pixels) the scan looks for.
    pub min_face_size: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_step: 1.1,
            min_neighbors: 20,
            min_face_size: 100,
        }
    }
}

/// Pluggable frontal-face detection backend.
///
/// Implementations receive the normalized grayscale image produced by
/// [`prepare_detection_image`] and return every face they find, in their own
/// output order. An empty vector is a normal result, not an error.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Vec<FaceBox>;
}

/// Grayscale + histogram equalization, the input every backend expects.
pub fn prepare_detection_image(img: &RgbImage) -> GrayImage {
    let gray = image::imageops::grayscale(img);
    imageproc::contrast::equalize_histogram(&gray)
}
