//! Resource pack loading and lookup.
//!
//! A `ResourcePack` is a read-only view over the assets of one or more packs
//! (a user pack overlaid on a vanilla release): models, item model
//! definitions, blockstates, textures, atlases, structures and tags.

pub mod blockstate;
pub mod loader;
pub mod model;
pub mod texture;

pub use blockstate::{BlockstateDefinition, ModelVariant, MultipartCase, MultipartCondition};
pub use model::{BlockModel, GuiLight, Model, ModelElement, ModelFace, TextureLayer, TextureRef};
pub use texture::{AnimationFrame, AnimationMeta, TextureData};

use crate::atlas::AtlasDefinition;
use crate::error::{RenderError, Result};
use crate::types::NamespacedKey;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Asset kinds, used for lookups and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Model,
    ItemDefinition,
    Blockstate,
    Texture,
    Atlas,
    Structure,
    Tag,
}

impl AssetKind {
    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Model => "model",
            AssetKind::ItemDefinition => "item definition",
            AssetKind::Blockstate => "blockstate",
            AssetKind::Texture => "texture",
            AssetKind::Atlas => "atlas",
            AssetKind::Structure => "structure",
            AssetKind::Tag => "tag",
        }
    }

    /// Path of the file backing an asset, for error reports.
    pub fn file_path(&self, key: &NamespacedKey) -> String {
        let (root, dir, ext) = match self {
            AssetKind::Model => ("assets", "models", "json"),
            AssetKind::ItemDefinition => ("assets", "items", "json"),
            AssetKind::Blockstate => ("assets", "blockstates", "json"),
            AssetKind::Texture => ("assets", "textures", "png"),
            AssetKind::Atlas => ("assets", "atlases", "json"),
            AssetKind::Structure => ("data", "structure", "nbt"),
            AssetKind::Tag => ("data", "tags", "json"),
        };
        format!("{}/{}/{}/{}.{}", root, key.namespace(), dir, key.path(), ext)
    }
}

/// A loaded Minecraft resource pack.
#[derive(Debug, Default, Clone)]
pub struct ResourcePack {
    /// Raw model JSON, parsed on demand so schema errors carry the file path.
    pub models: HashMap<NamespacedKey, serde_json::Value>,
    /// Raw item model definitions from `assets/<ns>/items`.
    pub item_definitions: HashMap<NamespacedKey, serde_json::Value>,
    pub blockstates: HashMap<NamespacedKey, BlockstateDefinition>,
    pub textures: HashMap<NamespacedKey, Arc<TextureData>>,
    /// Atlas definitions that belong to the user pack.
    pub atlases: HashMap<NamespacedKey, AtlasDefinition>,
    /// Atlas definitions inherited from the vanilla release.
    pub vanilla_atlases: HashMap<NamespacedKey, AtlasDefinition>,
    /// Raw structure NBT files (possibly gzipped).
    pub structures: HashMap<NamespacedKey, Vec<u8>>,
    /// Tag values, keyed by `<ns>:<registry>/<path>`.
    pub tags: HashMap<NamespacedKey, Vec<String>>,
    /// Files that were present but failed to parse.
    pub invalid: HashMap<(AssetKind, NamespacedKey), String>,
}

impl ResourcePack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_model(&self, key: &NamespacedKey) -> Option<&serde_json::Value> {
        self.models.get(key)
    }

    pub fn get_item_definition(&self, key: &NamespacedKey) -> Option<&serde_json::Value> {
        self.item_definitions.get(key)
    }

    pub fn get_blockstate(&self, key: &NamespacedKey) -> Option<&BlockstateDefinition> {
        self.blockstates.get(key)
    }

    pub fn get_texture(&self, key: &NamespacedKey) -> Option<&Arc<TextureData>> {
        self.textures.get(key)
    }

    pub fn get_structure(&self, key: &NamespacedKey) -> Option<&[u8]> {
        self.structures.get(key).map(Vec::as_slice)
    }

    /// Error for an asset that could not be found, or a schema error if the
    /// file exists but did not parse.
    pub fn missing(&self, kind: AssetKind, key: &NamespacedKey) -> RenderError {
        match self.invalid.get(&(kind, key.clone())) {
            Some(message) => RenderError::schema(kind.file_path(key), message),
            None => RenderError::not_found(kind.label(), key),
        }
    }

    pub fn require_blockstate(&self, key: &NamespacedKey) -> Result<&BlockstateDefinition> {
        self.get_blockstate(key)
            .ok_or_else(|| self.missing(AssetKind::Blockstate, key))
    }

    pub fn require_item_definition(&self, key: &NamespacedKey) -> Result<&serde_json::Value> {
        self.get_item_definition(key)
            .ok_or_else(|| self.missing(AssetKind::ItemDefinition, key))
    }

    pub fn require_structure(&self, key: &NamespacedKey) -> Result<&[u8]> {
        self.get_structure(key)
            .ok_or_else(|| self.missing(AssetKind::Structure, key))
    }

    pub fn add_model(&mut self, key: impl Into<NamespacedKey>, model: serde_json::Value) {
        self.models.insert(key.into(), model);
    }

    pub fn add_item_definition(&mut self, key: impl Into<NamespacedKey>, def: serde_json::Value) {
        self.item_definitions.insert(key.into(), def);
    }

    pub fn add_blockstate(&mut self, key: impl Into<NamespacedKey>, def: BlockstateDefinition) {
        self.blockstates.insert(key.into(), def);
    }

    pub fn add_texture(&mut self, key: impl Into<NamespacedKey>, texture: TextureData) {
        self.textures.insert(key.into(), Arc::new(texture));
    }

    pub fn add_atlas(&mut self, key: impl Into<NamespacedKey>, atlas: AtlasDefinition) {
        self.atlases.insert(key.into(), atlas);
    }

    pub fn add_structure(&mut self, key: impl Into<NamespacedKey>, nbt: Vec<u8>) {
        self.structures.insert(key.into(), nbt);
    }

    pub fn add_tag(&mut self, key: impl Into<NamespacedKey>, values: Vec<String>) {
        self.tags.insert(key.into(), values);
    }

    pub(crate) fn mark_invalid(
        &mut self,
        kind: AssetKind,
        key: NamespacedKey,
        message: impl ToString,
    ) {
        tracing::warn!("failed to parse {} {}: {}", kind.label(), key, message.to_string());
        self.invalid.insert((kind, key), message.to_string());
    }

    /// Layer this pack over `base`; entries of `self` win per key.
    /// Atlases of `base` are kept apart as vanilla atlases.
    pub fn overlay(mut self, base: ResourcePack) -> ResourcePack {
        fn fill<V>(top: &mut HashMap<NamespacedKey, V>, bottom: HashMap<NamespacedKey, V>) {
            for (k, v) in bottom {
                top.entry(k).or_insert(v);
            }
        }

        fill(&mut self.models, base.models);
        fill(&mut self.item_definitions, base.item_definitions);
        fill(&mut self.blockstates, base.blockstates);
        fill(&mut self.textures, base.textures);
        fill(&mut self.structures, base.structures);
        fill(&mut self.tags, base.tags);
        fill(&mut self.vanilla_atlases, base.atlases);
        fill(&mut self.vanilla_atlases, base.vanilla_atlases);
        for (k, v) in base.invalid {
            self.invalid.entry(k).or_insert(v);
        }
        self
    }

    /// Expand a tag (`#` prefix optional) to the keys it lists, following
    /// nested tag references. `registry` is e.g. `item` or `block`.
    pub fn expand_tag(&self, registry: &str, tag: &str) -> Vec<NamespacedKey> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.expand_tag_into(registry, tag.trim_start_matches('#'), &mut seen, &mut out);
        out
    }

    fn expand_tag_into(
        &self,
        registry: &str,
        tag: &str,
        seen: &mut HashSet<NamespacedKey>,
        out: &mut Vec<NamespacedKey>,
    ) {
        let name = NamespacedKey::parse(tag);
        if !seen.insert(name.clone()) {
            return;
        }
        let plural = format!("{}s", registry);
        let values = [registry, plural.as_str()]
            .iter()
            .find_map(|dir| self.tags.get(&name.with_path(format!("{}/{}", dir, name.path()))));
        let Some(values) = values else {
            tracing::warn!("unknown {} tag #{}", registry, name);
            return;
        };
        for value in values {
            match value.strip_prefix('#') {
                Some(nested) => self.expand_tag_into(registry, nested, seen, out),
                None => out.push(NamespacedKey::parse(value)),
            }
        }
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// All namespaces that contribute assets.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<_> = self
            .models
            .keys()
            .chain(self.item_definitions.keys())
            .chain(self.blockstates.keys())
            .chain(self.textures.keys())
            .map(|k| k.namespace())
            .collect();
        namespaces.sort_unstable();
        namespaces.dedup();
        namespaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_user_wins() {
        let mut user = ResourcePack::new();
        user.add_texture("block/stone", TextureData::solid(1, 1, [1, 1, 1, 255]));
        let mut vanilla = ResourcePack::new();
        vanilla.add_texture("block/stone", TextureData::solid(1, 1, [9, 9, 9, 255]));
        vanilla.add_texture("block/dirt", TextureData::solid(1, 1, [5, 5, 5, 255]));
        vanilla.add_atlas("blocks", AtlasDefinition::default());

        let merged = user.overlay(vanilla);
        let stone = NamespacedKey::parse("block/stone");
        assert_eq!(merged.get_texture(&stone).unwrap().get_pixel(0, 0), [1, 1, 1, 255]);
        assert!(merged.get_texture(&NamespacedKey::parse("block/dirt")).is_some());
        assert!(merged.atlases.is_empty());
        assert_eq!(merged.vanilla_atlases.len(), 1);
    }

    #[test]
    fn test_missing_reports_schema_error_for_broken_file() {
        let mut pack = ResourcePack::new();
        let key = NamespacedKey::parse("stone");
        pack.mark_invalid(AssetKind::Blockstate, key.clone(), "expected value");
        let err = pack.require_blockstate(&key).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Schema { ref path, .. } if path == "assets/minecraft/blockstates/stone.json"
        ));
        let err = pack
            .require_blockstate(&NamespacedKey::parse("dirt"))
            .unwrap_err();
        assert_eq!(err.kind(), "AssetNotFound");
    }

    #[test]
    fn test_expand_nested_tag() {
        let mut pack = ResourcePack::new();
        pack.add_tag(
            "item/swords",
            vec!["diamond_sword".into(), "#minecraft:gold_tools".into()],
        );
        pack.add_tag("items/gold_tools", vec!["golden_sword".into(), "#swords".into()]);

        let keys: Vec<String> = pack
            .expand_tag("item", "#swords")
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["minecraft:diamond_sword", "minecraft:golden_sword"]);
    }
}
