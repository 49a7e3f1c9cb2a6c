//! Render configuration.
//!
//! Loaded from a JSON file; every field has a default so an empty object is
//! a valid configuration.

use crate::error::{RenderError, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Smallest and largest supported output side, in pixels.
pub const MIN_RENDER_SIZE: u32 = 16;
pub const MAX_RENDER_SIZE: u32 = 4096;

/// Game ticks per second; animation timing is expressed in ticks.
pub const TICKS_PER_SECOND: u32 = 20;

/// Directional light used for `gui_light: side` models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Diffuse strength.
    pub power: f32,
    pub ambient: f32,
    /// Homogeneous light position; `w = 0` makes it directional.
    pub position: [f32; 4],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            power: 0.6727,
            ambient: 0.1973,
            position: [-0.4234, -0.6577, 0.4159, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationMode {
    /// Only the first keyframe is rendered, to PNG.
    #[default]
    None,
    /// Every keyframe is rendered and muxed into a looping WebP.
    Webp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output image side in pixels.
    pub render_size: u32,
    /// Vanilla release the pack is rendered against; part of the cache key.
    pub minecraft_version: String,
    pub load_vanilla: bool,
    /// Also expand atlases that come from the vanilla pack.
    pub resolve_vanilla_atlas: bool,
    /// Apply biome and redstone colors to structure blocks.
    pub colorize_blocks: bool,
    /// Draw missing textures fully transparent instead of magenta/black.
    pub transparent_missingno: bool,
    pub use_cache: bool,
    /// Namespace used for in-pack output keys; defaults to the model's own.
    pub save_namespace: Option<String>,
    /// Glob patterns selecting which keys to render; `#namespace:tag`
    /// entries select the members of an item tag. Empty means all.
    pub filter: Vec<String>,
    /// Fixed output paths for specific model keys.
    pub special_filter: BTreeMap<String, String>,
    pub light: LightConfig,
    pub animation_mode: AnimationMode,
    /// Output frames per second for animated WebP.
    pub animation_framerate: u32,
    pub cache_dir: Option<PathBuf>,
    /// Seed for weighted variant and palette choice.
    pub structure_seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            render_size: 128,
            minecraft_version: "latest".to_string(),
            load_vanilla: true,
            resolve_vanilla_atlas: false,
            colorize_blocks: true,
            transparent_missingno: false,
            use_cache: false,
            save_namespace: None,
            filter: Vec::new(),
            special_filter: BTreeMap::new(),
            light: LightConfig::default(),
            animation_mode: AnimationMode::None,
            animation_framerate: TICKS_PER_SECOND,
            cache_dir: None,
            structure_seed: 0,
        }
    }
}

impl RenderConfig {
    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&contents)?;
        let config = RenderConfig::deserialize(&value)
            .map_err(|e| RenderError::schema(path.display().to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_RENDER_SIZE..=MAX_RENDER_SIZE).contains(&self.render_size) {
            return Err(RenderError::Config(format!(
                "render_size {} outside {}..={}",
                self.render_size, MIN_RENDER_SIZE, MAX_RENDER_SIZE
            )));
        }
        if self.animation_framerate == 0 || self.animation_framerate % TICKS_PER_SECOND != 0 {
            return Err(RenderError::Config(format!(
                "animation_framerate {} is not a positive multiple of {}",
                self.animation_framerate, TICKS_PER_SECOND
            )));
        }
        self.compile_filter(|_| Vec::new()).map(|_| ())
    }

    /// Compile `filter` into a matcher. Tag entries are handed to
    /// `expand_tag`, which returns the keys they stand for.
    pub fn compile_filter<F>(&self, expand_tag: F) -> Result<FilterSet>
    where
        F: Fn(&str) -> Vec<String>,
    {
        let mut set = FilterSet {
            patterns: Vec::new(),
            tagged: HashSet::new(),
            open: self.filter.is_empty(),
        };
        for entry in &self.filter {
            if entry.is_empty() {
                return Err(RenderError::Config("empty filter pattern".to_string()));
            }
            if entry.starts_with('#') {
                set.tagged.extend(expand_tag(entry));
                continue;
            }
            let pattern = Pattern::new(entry)
                .map_err(|e| RenderError::Config(format!("filter pattern {:?}: {}", entry, e)))?;
            set.patterns.push(pattern);
        }
        Ok(set)
    }
}

/// Compiled `filter` entries.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    patterns: Vec<Pattern>,
    tagged: HashSet<String>,
    open: bool,
}

impl FilterSet {
    /// Whether `key` passes any pattern or belongs to a listed tag.
    pub fn accepts(&self, key: &str) -> bool {
        self.open || self.tagged.contains(key) || self.patterns.iter().any(|p| p.matches(key))
    }
}
