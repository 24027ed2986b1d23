//! Annotated-image encoding: `RgbImage` → PNG bytes.
//!
//! ## Why PNG?
//! Lossless compression preserves the 1–2 px verdict rectangles and the
//! rendered text underneath them. JPEG artefacts smear thin overlay lines
//! and make the debug image harder to eyeball at the closing table.

use image::RgbImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an annotated page as PNG bytes, ready to write to disk or ship
/// to a viewer.
pub fn encode_annotated(img: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded annotated page → {} bytes PNG", buf.len());
    Ok(buf)
}
