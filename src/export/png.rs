//! PNG output.

use crate::error::Result;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Encode a rendered frame as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}
