use anyhow::{Context, Result};
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::RgbImage;

/// Quality of the single output encoding.
pub const JPEG_QUALITY: u8 = 90;

/// JFIF density unit byte for dots per inch.
const JFIF_UNIT_DPI: u8 = 1;

/// Encode `img` as baseline JPEG with `dpi` written into the JFIF header.
pub fn encode_jpeg(img: &RgbImage, dpi: u16) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY);
        encoder.set_pixel_density(PixelDensity::dpi(dpi));
        encoder
            .encode_image(img)
            .context("Failed to encode JPEG")?;
    }
    Ok(data)
}

/// Read the `(x, y)` DPI pair from a JPEG's JFIF APP0 segment.
///
/// Returns `None` when the data does not start with a JFIF header or the
/// density is not expressed in dots per inch.
pub fn read_jfif_dpi(data: &[u8]) -> Option<(u16, u16)> {
    // SOI, APP0 marker, 2-byte length, "JFIF\0", 2-byte version, unit, x, y
    if data.len() < 18 || data[0..4] != [0xFF, 0xD8, 0xFF, 0xE0] || &data[6..11] != b"JFIF\0" {
        return None;
    }
    if data[13] != JFIF_UNIT_DPI {
        return None;
    }

    let x = u16::from_be_bytes([data[14], data[15]]);
    let y = u16::from_be_bytes([data[16], data[17]]);
    Some((x, y))
}
