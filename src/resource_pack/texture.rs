//! Texture loading, animation metadata and pixel helpers.

use serde::{Deserialize, Serialize};

/// Raw texture data loaded from PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data (4 bytes per pixel), row 0 is the top of the image.
    pub pixels: Vec<u8>,
    /// Animation metadata from the `.png.mcmeta` sidecar.
    pub animation: Option<AnimationMeta>,
}

/// `animation` block of a texture `.mcmeta` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationMeta {
    #[serde(default)]
    pub interpolate: bool,
    #[serde(default = "default_frametime")]
    pub frametime: u32,
    #[serde(default)]
    pub frames: Option<Vec<AnimationFrame>>,
}

fn default_frametime() -> u32 {
    1
}

/// One entry of `animation.frames`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationFrame {
    Index(u32),
    Timed {
        index: u32,
        #[serde(default)]
        time: Option<u32>,
    },
}

impl AnimationFrame {
    pub fn index(&self) -> u32 {
        match self {
            AnimationFrame::Index(i) => *i,
            AnimationFrame::Timed { index, .. } => *index,
        }
    }

    pub fn time(&self, default: u32) -> u32 {
        match self {
            AnimationFrame::Index(_) => default,
            AnimationFrame::Timed { time, .. } => time.unwrap_or(default),
        }
    }
}

#[derive(Deserialize)]
struct McMeta {
    animation: Option<AnimationMeta>,
}

/// Parse a `.png.mcmeta` file. Files without an `animation` block yield `None`.
pub fn parse_mcmeta(contents: &str) -> Result<Option<AnimationMeta>, serde_json::Error> {
    let meta: McMeta = serde_json::from_str(contents)?;
    Ok(meta.animation.map(|mut anim| {
        anim.frametime = anim.frametime.max(1);
        anim
    }))
}

impl TextureData {
    /// Create a new texture from RGBA data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
            animation: None,
        }
    }

    /// A texture filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self::new(width, height, pixels)
    }

    /// The 16x16 missing-texture sentinel: magenta/black checkerboard.
    pub fn placeholder() -> Self {
        let size = 16;
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let magenta = ((x / 8) + (y / 8)) % 2 == 0;
                if magenta {
                    pixels.extend_from_slice(&[248, 0, 248, 255]);
                } else {
                    pixels.extend_from_slice(&[0, 0, 0, 255]);
                }
            }
        }
        Self::new(size, size, pixels)
    }

    /// Fully transparent 16x16 stand-in for missing textures.
    pub fn transparent_placeholder() -> Self {
        Self::solid(16, 16, [0, 0, 0, 0])
    }

    pub fn with_animation(mut self, animation: AnimationMeta) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn has_transparency(&self) -> bool {
        self.pixels.chunks(4).any(|pixel| pixel[3] < 255)
    }

    /// Get a pixel at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let idx = ((y * self.width + x) * 4) as usize;
        self.pixels[idx..idx + 4].copy_from_slice(&rgba);
    }

    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }

    /// Number of square frames stacked vertically.
    pub fn frame_count(&self) -> u32 {
        if self.animation.is_some() && self.width > 0 && self.height > self.width {
            self.height / self.width
        } else {
            1
        }
    }

    /// Extract one square frame. Out-of-range indices wrap.
    pub fn frame(&self, index: u32) -> TextureData {
        let count = self.frame_count();
        if count <= 1 {
            return TextureData::new(self.width, self.height, self.pixels.clone());
        }
        let index = index % count;
        let frame_size = (self.width * self.width * 4) as usize;
        let start = index as usize * frame_size;
        TextureData::new(
            self.width,
            self.width,
            self.pixels[start..start + frame_size].to_vec(),
        )
    }

    /// Linear per-channel blend: `a * (1 - t) + b * t`.
    pub fn blend(a: &TextureData, b: &TextureData, t: f32) -> TextureData {
        let pixels = a
            .pixels
            .iter()
            .zip(b.pixels.iter())
            .map(|(&pa, &pb)| {
                let v = pa as f32 * (1.0 - t) + pb as f32 * t;
                v.round().clamp(0.0, 255.0) as u8
            })
            .collect();
        TextureData::new(a.width, a.height, pixels)
    }
}

/// Load a texture from PNG bytes.
pub fn load_texture_from_bytes(data: &[u8]) -> Result<TextureData, image::ImageError> {
    let img = image::load_from_memory(data)?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(TextureData::new(width, height, rgba.into_raw()))
}
