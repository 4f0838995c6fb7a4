use anyhow::Result;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;

/// Scale-to-fit dimensions for a `src_width`×`src_height` image inside a
/// `max_width`×`max_height` box.
///
/// The aspect ratio is preserved up to rounding, both results stay inside
/// the box, and the limiting side lands exactly on its bound.
pub fn fit_dimensions(src_width: u32, src_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let ratio_x = max_width as f64 / src_width as f64;
    let ratio_y = max_height as f64 / src_height as f64;
    let ratio = ratio_x.min(ratio_y);

    let width = (src_width as f64 * ratio).round() as u32;
    let height = (src_height as f64 * ratio).round() as u32;

    (width.clamp(1, max_width), height.clamp(1, max_height))
}

/// Resize `img` proportionally so it fits within `max_width`×`max_height`.
///
/// Upscales as well as downscales. Always returns a new buffer.
pub fn resize_proportionally(img: &RgbImage, max_width: u32, max_height: u32) -> Result<RgbImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == 0 || src_height == 0 {
        return Err(anyhow::anyhow!("Source image has zero dimensions"));
    }
    if max_width == 0 || max_height == 0 {
        return Err(anyhow::anyhow!(
            "Target bounds must be positive, got {}x{}",
            max_width,
            max_height
        ));
    }

    let (width, height) = fit_dimensions(src_width, src_height, max_width, max_height);
    resize_image(img, width, height)
}

/// Resize an image to exact dimensions with a Catmull-Rom (bicubic) filter.
fn resize_image(img: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == width && src_height == height {
        return Ok(img.clone());
    }

    let src_image = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x3)?;
    let mut dst_image = Image::new(width, height, PixelType::U8x3);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::CatmullRom));
    let mut resizer = Resizer::new();
    resizer.resize(&src_image, &mut dst_image, &options)?;

    RgbImage::from_raw(width, height, dst_image.buffer().to_vec())
        .ok_or_else(|| anyhow::anyhow!("Resized buffer does not match {}x{}", width, height))
}
