//! Animated WebP output.
//!
//! Each frame is encoded losslessly on its own, then its bitstream chunks
//! are rewrapped in `ANMF` chunks under a `VP8X` + `ANIM` header.

use crate::config::TICKS_PER_SECOND;
use crate::error::{RenderError, Result};
use image::error::{EncodingError, ImageFormatHint};
use image::{ImageError, ImageFormat, RgbaImage};
use std::io::Cursor;

const VP8X_ANIMATION: u8 = 0x02;
const VP8X_ALPHA: u8 = 0x10;
/// `ANMF` flags: overwrite the canvas instead of alpha-blending onto it.
const ANMF_NO_BLEND: u8 = 0x02;
/// 24-bit duration field limit.
const MAX_DURATION_MS: u32 = 0xFF_FFFF;

/// Milliseconds a keyframe of `ticks` game ticks is shown for, quantized to
/// the output frame rate.
pub fn frame_duration_ms(ticks: u32, framerate: u32) -> u32 {
    let framerate = framerate.max(TICKS_PER_SECOND);
    let output_frames = ticks * (framerate / TICKS_PER_SECOND);
    (output_frames * 1000 / framerate).min(MAX_DURATION_MS)
}

fn encoding_error(message: &str) -> RenderError {
    RenderError::Image(ImageError::Encoding(EncodingError::new(
        ImageFormatHint::Exact(ImageFormat::WebP),
        message.to_string(),
    )))
}

/// Encode `(frame, ticks)` pairs as a looping animated WebP.
pub fn encode_animated_webp(frames: &[(RgbaImage, u32)], framerate: u32) -> Result<Vec<u8>> {
    let Some((first, _)) = frames.first() else {
        return Err(RenderError::Config("animation has no frames".to_string()));
    };
    let (width, height) = first.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::Config("animation frames are empty".to_string()));
    }

    let mut body = Vec::new();
    body.extend_from_slice(b"WEBP");

    let mut vp8x = vec![VP8X_ANIMATION | VP8X_ALPHA, 0, 0, 0];
    push_u24(&mut vp8x, width - 1);
    push_u24(&mut vp8x, height - 1);
    push_chunk(&mut body, b"VP8X", &vp8x);

    // transparent background, loop forever
    push_chunk(&mut body, b"ANIM", &[0, 0, 0, 0, 0, 0]);

    for (image, ticks) in frames {
        if image.dimensions() != (width, height) {
            return Err(RenderError::Config(format!(
                "animation frame is {}x{}, expected {}x{}",
                image.width(),
                image.height(),
                width,
                height
            )));
        }
        let mut anmf = Vec::new();
        push_u24(&mut anmf, 0);
        push_u24(&mut anmf, 0);
        push_u24(&mut anmf, width - 1);
        push_u24(&mut anmf, height - 1);
        push_u24(&mut anmf, frame_duration_ms(*ticks, framerate));
        anmf.push(ANMF_NO_BLEND);
        anmf.extend_from_slice(&bitstream_chunks(image)?);
        push_chunk(&mut body, b"ANMF", &anmf);
    }

    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    tracing::debug!("encoded {} frame animation, {} bytes", frames.len(), out.len());
    Ok(out)
}

/// Lossless still encoding of `image`, reduced to its image-data chunks.
fn bitstream_chunks(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut still = Vec::new();
    let encoder = image::codecs::webp::WebPEncoder::new_lossless(Cursor::new(&mut still));
    image.write_with_encoder(encoder)?;

    if still.len() < 12 || &still[..4] != b"RIFF" || &still[8..12] != b"WEBP" {
        return Err(encoding_error("encoder produced no RIFF container"));
    }

    let mut out = Vec::new();
    for (fourcc, payload) in chunks(&still[12..]) {
        if matches!(&fourcc, b"ALPH" | b"VP8 " | b"VP8L") {
            push_chunk(&mut out, &fourcc, payload);
        }
    }
    if out.is_empty() {
        return Err(encoding_error("encoder produced no image data"));
    }
    Ok(out)
}

/// Iterate the `(fourcc, payload)` chunks of a RIFF body.
fn chunks(mut data: &[u8]) -> Vec<([u8; 4], &[u8])> {
    let mut out = Vec::new();
    while data.len() >= 8 {
        let fourcc = [data[0], data[1], data[2], data[3]];
        let size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let end = 8 + size;
        if end > data.len() {
            break;
        }
        out.push((fourcc, &data[8..end]));
        let padded = end + (size & 1);
        data = &data[padded.min(data.len())..];
    }
    out
}

fn push_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

fn push_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}
