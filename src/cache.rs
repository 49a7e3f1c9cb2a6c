//! Byte caches for downloaded skins and rendered thumbnails.

use crate::error::{RenderError, Result};
use crate::resource_pack::TextureData;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Write-once-per-key byte store.
pub trait Cache {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Cache kept in memory for the lifetime of a run.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.borrow().get(key).cloned()
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Cache stored as one file per key under a directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a key. `:` separates directories like `/`; keys that
    /// would escape the cache directory are rejected.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = PathBuf::from(key.replace(':', "/"));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(RenderError::Config(format!("invalid cache key `{}`", key)));
        }
        Ok(self.root.join(relative))
    }
}

impl Cache for DiskCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key).ok()?;
        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!("cache hit {}", key);
                Some(bytes)
            }
            Err(_) => {
                tracing::debug!("cache miss {}", key);
                None
            }
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write then rename so readers never see a partial entry.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

/// Key of a rendered thumbnail: SHA-256 of the baked model JSON and of each
/// bound texture, combined with the output size and game version.
pub fn render_cache_key<'t>(
    model_json: &str,
    textures: impl IntoIterator<Item = &'t TextureData>,
    render_size: u32,
    minecraft_version: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(Sha256::digest(model_json.as_bytes()));
    for texture in textures {
        let mut texture_hasher = Sha256::new();
        texture_hasher.update(texture.width.to_le_bytes());
        texture_hasher.update(texture.height.to_le_bytes());
        texture_hasher.update(&texture.pixels);
        hasher.update(texture_hasher.finalize());
    }
    hasher.update(render_size.to_le_bytes());
    hasher.update(minecraft_version.as_bytes());
    format!("render/{}.png", hex(&hasher.finalize()))
}
