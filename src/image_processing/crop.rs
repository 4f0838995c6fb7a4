use anyhow::Result;
use image::RgbImage;

use super::face_detection::FaceBox;

/// Margin added on each side of the face, as a fraction (7/10) of the face
/// size. Leaves room for hair above and shoulders below.
const PADDING_NUMERATOR: u64 = 7;
const PADDING_DENOMINATOR: u64 = 10;

/// `floor(length * 0.7)` without going through floating point.
fn padding_for(length: u32) -> u32 {
    (length as u64 * PADDING_NUMERATOR / PADDING_DENOMINATOR) as u32
}

/// Crop region within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn full(source_width: u32, source_height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: source_width,
            height: source_height,
        }
    }

    pub fn contains(&self, face: &FaceBox) -> bool {
        face.x >= self.x
            && face.y >= self.y
            && end(face.x, face.width) <= end(self.x, self.width)
            && end(face.y, face.height) <= end(self.y, self.height)
    }
}

/// Exclusive end of a span, widened so extreme values cannot overflow.
fn end(start: u32, length: u32) -> u64 {
    start as u64 + length as u64
}

/// Pick the face with the largest area.
///
/// On equal areas the earlier face in detector order wins. `Iterator::max_by_key`
/// returns the last maximum, so it is not used here.
pub fn select_largest_face(faces: &[FaceBox]) -> Option<&FaceBox> {
    faces.iter().fold(None, |best: Option<&FaceBox>, face| match best {
        Some(current) if current.area() >= face.area() => Some(current),
        _ => Some(face),
    })
}

/// Plan the crop rectangle for a source image and an optional face.
///
/// With a face, the rectangle is the face grown by 70% of its size on every
/// side and clamped to the image. Without one, it is the whole image.
pub fn plan_crop(source_width: u32, source_height: u32, face: Option<&FaceBox>) -> CropRegion {
    let face = match face {
        Some(face) if source_width > 0 && source_height > 0 => face,
        _ => return CropRegion::full(source_width, source_height),
    };

    let padding_x = padding_for(face.width);
    let padding_y = padding_for(face.height);

    // A face starting outside the image still yields a non-empty region
    let crop_x = face.x.saturating_sub(padding_x).min(source_width - 1);
    let crop_y = face.y.saturating_sub(padding_y).min(source_height - 1);

    let crop_width = span_within(source_width - crop_x, face.width, padding_x);
    let crop_height = span_within(source_height - crop_y, face.height, padding_y);

    CropRegion {
        x: crop_x,
        y: crop_y,
        width: crop_width,
        height: crop_height,
    }
}

/// `length + 2 * padding`, capped at `available` and never below 1.
fn span_within(available: u32, length: u32, padding: u32) -> u32 {
    let padded = length as u64 + 2 * padding as u64;
    padded.min(available as u64).max(1) as u32
}

/// Copy `region` out of `img` into a new buffer.
pub fn crop_image(img: &RgbImage, region: &CropRegion) -> Result<RgbImage> {
    let (img_width, img_height) = img.dimensions();

    if end(region.x, region.width) > img_width as u64
        || end(region.y, region.height) > img_height as u64
    {
        return Err(anyhow::anyhow!(
            "Crop region exceeds image bounds: crop({},{},{}x{}) on {}x{} image",
            region.x,
            region.y,
            region.width,
            region.height,
            img_width,
            img_height
        ));
    }

    Ok(image::imageops::crop_imm(img, region.x, region.y, region.width, region.height).to_image())
}
