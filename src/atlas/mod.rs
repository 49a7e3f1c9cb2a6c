//! Texture atlas definitions.
//!
//! Only `paletted_permutations` sources produce new textures; every other
//! source kind just registers existing files and is ignored here.

mod paletted;

pub use paletted::{remap_with_palette, AtlasResolver};

use crate::types::NamespacedKey;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Contents of `assets/<ns>/atlases/<name>.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AtlasDefinition {
    #[serde(default)]
    pub sources: Vec<AtlasSource>,
}

/// One entry of an atlas `sources` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum AtlasSource {
    #[serde(rename = "paletted_permutations", alias = "minecraft:paletted_permutations")]
    PalettedPermutations(PalettedPermutations),
    #[serde(other)]
    Other,
}

/// Recolors grayscale textures by mapping a key palette onto color palettes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PalettedPermutations {
    pub textures: Vec<NamespacedKey>,
    pub palette_key: NamespacedKey,
    /// Variant suffix to color palette texture.
    pub permutations: BTreeMap<String, NamespacedKey>,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    "_".to_string()
}
