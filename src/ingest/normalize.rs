use anyhow::{anyhow, Result};
use image::RgbImage;

/// Wrap a packed RGB24 buffer as an image, checking its length against the dimensions.
pub fn rgb_from_raw(pixels: &[u8], width: u32, height: u32) -> Result<RgbImage> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions {}x{} overflow", width, height))?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "RGB24 buffer for {}x{} must be {} bytes, got {}",
            width,
            height,
            expected,
            pixels.len()
        ));
    }
    RgbImage::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| anyhow!("pixel buffer does not fit {}x{} image", width, height))
}
