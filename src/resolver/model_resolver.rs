//! Model inheritance resolution and baking.

use crate::error::{RenderError, Result};
use crate::resource_pack::model::{is_builtin, BUILTIN_GENERATED};
use crate::resource_pack::{
    AssetKind, BlockModel, Model, ModelElement, ModelFace, ResourcePack, TextureRef,
};
use crate::types::{Direction, NamespacedKey};
use std::cell::RefCell;
use std::collections::HashMap;

/// Maximum length of a `#variable` indirection chain.
pub const MAX_TEXTURE_DEPTH: usize = 20;

/// Resolves model inheritance chains into baked models.
pub struct ModelResolver<'a> {
    pack: &'a ResourcePack,
    cache: RefCell<HashMap<(NamespacedKey, bool), Model>>,
}

impl<'a> ModelResolver<'a> {
    pub fn new(pack: &'a ResourcePack) -> Self {
        Self {
            pack,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn pack(&self) -> &'a ResourcePack {
        self.pack
    }

    /// Resolve and bake a model by key.
    pub fn resolve(&self, key: &NamespacedKey) -> Result<Model> {
        self.resolve_with(key, false)
    }

    /// Resolve and bake a model by key; `delete_parent_elements` makes an
    /// explicit empty `elements` list in a child hide the parent's elements.
    pub fn resolve_with(&self, key: &NamespacedKey, delete_parent_elements: bool) -> Result<Model> {
        let cache_key = (key.clone(), delete_parent_elements);
        if let Some(cached) = self.cache.borrow().get(&cache_key) {
            return Ok(cached.clone());
        }

        let model = self.load(key, false)?;
        let mut visited = vec![key.clone()];
        let flat = self.flatten(model, &mut visited, delete_parent_elements)?;
        let baked = bake(flat);

        self.cache.borrow_mut().insert(cache_key, baked.clone());
        Ok(baked)
    }

    /// Resolve and bake a model that is not stored in the pack, such as one
    /// synthesized by a special model factory.
    pub fn resolve_model(&self, model: BlockModel, delete_parent_elements: bool) -> Result<Model> {
        let mut visited = Vec::new();
        let flat = self.flatten(model, &mut visited, delete_parent_elements)?;
        Ok(bake(flat))
    }

    fn load(&self, key: &NamespacedKey, as_parent: bool) -> Result<BlockModel> {
        let broken = self
            .pack
            .invalid
            .contains_key(&(AssetKind::Model, key.clone()));
        let raw = match self.pack.get_model(key) {
            Some(raw) => raw,
            None if as_parent && !broken => {
                return Err(RenderError::ParentMissing(key.to_string()))
            }
            None => return Err(self.pack.missing(AssetKind::Model, key)),
        };
        BlockModel::from_json(raw, &AssetKind::Model.file_path(key))
    }

    /// Inline the parent chain. The result's parent is `None` or a builtin.
    fn flatten(
        &self,
        model: BlockModel,
        visited: &mut Vec<NamespacedKey>,
        delete_parent_elements: bool,
    ) -> Result<BlockModel> {
        let parent_key = match &model.parent {
            Some(parent) if !is_builtin(parent) => parent.clone(),
            _ => return Ok(model),
        };

        if visited.contains(&parent_key) {
            return Err(RenderError::CyclicParent(parent_key.to_string()));
        }
        visited.push(parent_key.clone());

        let parent = self.load(&parent_key, true)?;
        let parent = self.flatten(parent, visited, delete_parent_elements)?;
        Ok(merge(&model, &parent, delete_parent_elements))
    }
}

/// Merge a child model over its parent. Child values win; textures and
/// display contexts merge key by key. The result inherits the parent's parent.
pub fn merge(child: &BlockModel, parent: &BlockModel, delete_parent_elements: bool) -> BlockModel {
    let mut merged = parent.clone();

    for (key, value) in &child.textures {
        merged.textures.insert(key.clone(), value.clone());
    }

    match &child.elements {
        Some(elements) if delete_parent_elements || !elements.is_empty() => {
            merged.elements = Some(elements.clone());
        }
        _ => {}
    }

    for (context, transform) in &child.display {
        merged.display.insert(context.clone(), *transform);
    }

    if child.ambient_occlusion.is_some() {
        merged.ambient_occlusion = child.ambient_occlusion;
    }
    if child.gui_light.is_some() {
        merged.gui_light = child.gui_light;
    }
    if child.overrides.is_some() {
        merged.overrides = child.overrides.clone();
    }
    if child.zoom.is_some() {
        merged.zoom = child.zoom;
    }

    merged.parent = parent.parent.clone();
    merged
}

/// Materialize a flattened model. Item sprites (`builtin/generated`) get one
/// flat north-facing element per `layerN` texture.
pub fn bake(model: BlockModel) -> Model {
    let mut baked = Model {
        parent: model.parent,
        ambient_occlusion: model.ambient_occlusion.unwrap_or(true),
        gui_light: model.gui_light.unwrap_or_default(),
        display: model.display,
        textures: model.textures,
        elements: model.elements.unwrap_or_default(),
        zoom: model.zoom.unwrap_or(1.0),
    };

    let generated = NamespacedKey::parse(BUILTIN_GENERATED);
    if baked.parent.as_ref() == Some(&generated) && !baked.textures.is_empty() {
        let max_layer = baked
            .textures
            .keys()
            .filter_map(|k| k.strip_prefix("layer"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max();

        if let Some(max_layer) = max_layer {
            for i in 0..=max_layer {
                baked.elements.push(generated_layer(i));
            }
        }

        let mut gui = baked.gui_transform();
        gui.rotation = [180.0, 0.0, 180.0];
        baked.display.insert("gui".to_string(), gui);
        baked.parent = None;
    }

    baked
}

/// Flat 16x16 quad for sprite layer `i`, pushed `i` units toward the camera.
fn generated_layer(i: u32) -> ModelElement {
    let z = -(i as f32);
    ModelElement::new([0.0, 0.0, z], [16.0, 16.0, z]).with_face(
        Direction::North,
        ModelFace::new(format!("#layer{}", i))
            .with_uv([0.0, 0.0, 16.0, 16.0])
            .with_tint(i as i32),
    )
}

/// Follow `#variable` indirection to a concrete texture. `None` means the
/// chain ends in an undefined variable or is longer than `MAX_TEXTURE_DEPTH`.
pub fn resolve_texture_ref(model: &Model, reference: &str) -> Option<TextureRef> {
    let mut current = TextureRef::parse(reference);
    for _ in 0..MAX_TEXTURE_DEPTH {
        match current {
            TextureRef::Variable(name) => {
                current = model.textures.get(&name)?.clone();
            }
            other => return Some(other),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_pack::GuiLight;
    use serde_json::json;

    fn create_test_pack() -> ResourcePack {
        let mut pack = ResourcePack::new();
        pack.add_model(
            "block/cube",
            json!({
                "gui_light": "side",
                "elements": [{
                    "from": [0, 0, 0], "to": [16, 16, 16],
                    "faces": {
                        "north": { "texture": "#north" },
                        "up": { "texture": "#up" }
                    }
                }],
                "display": { "gui": { "rotation": [30, 225, 0], "scale": [0.625, 0.625, 0.625] } }
            }),
        );
        pack.add_model(
            "block/cube_all",
            json!({
                "parent": "block/cube",
                "textures": { "particle": "#all", "north": "#all", "up": "#all" }
            }),
        );
        pack.add_model(
            "block/stone",
            json!({ "parent": "block/cube_all", "textures": { "all": "block/stone" } }),
        );
        pack.add_model("builtin_generated_holder", json!({ "parent": "builtin/generated" }));
        pack.add_model(
            "item/generated",
            json!({ "parent": "builtin/generated", "gui_light": "front" }),
        );
        pack.add_model(
            "item/gem",
            json!({ "parent": "item/generated", "textures": { "layer0": "custom:item/gem", "layer1": "custom:item/gem_overlay" } }),
        );
        pack
    }

    #[test]
    fn test_resolve_with_inheritance() {
        let pack = create_test_pack();
        let resolver = ModelResolver::new(&pack);

        let model = resolver.resolve(&NamespacedKey::parse("block/stone")).unwrap();
        assert!(model.parent.is_none());
        assert_eq!(model.elements.len(), 1);
        assert_eq!(model.gui_light, GuiLight::Side);
        assert_eq!(
            resolve_texture_ref(&model, "#north"),
            Some(TextureRef::Key(NamespacedKey::parse("block/stone")))
        );
    }

    #[test]
    fn test_generated_layers() {
        let pack = create_test_pack();
        let resolver = ModelResolver::new(&pack);

        let model = resolver.resolve(&NamespacedKey::parse("item/gem")).unwrap();
        assert!(model.parent.is_none());
        assert_eq!(model.elements.len(), 2);
        assert_eq!(model.elements[1].from, [0.0, 0.0, -1.0]);
        let face = &model.elements[1].faces[&Direction::North];
        assert_eq!(face.texture, "#layer1");
        assert_eq!(face.tintindex, 1);
        let gui = model.gui_transform();
        assert_eq!(gui.rotation, [180.0, 0.0, 180.0]);
        assert_eq!(gui.scale, [0.625; 3]);
        assert_eq!(model.gui_light, GuiLight::Front);
    }

    #[test]
    fn test_builtin_generated_without_textures_keeps_sentinel() {
        let pack = create_test_pack();
        let resolver = ModelResolver::new(&pack);
        let model = resolver
            .resolve(&NamespacedKey::parse("builtin_generated_holder"))
            .unwrap();
        assert_eq!(model.parent, Some(NamespacedKey::parse(BUILTIN_GENERATED)));
        assert!(model.elements.is_empty());
    }

    #[test]
    fn test_missing_parent() {
        let mut pack = create_test_pack();
        pack.add_model("block/orphan", json!({ "parent": "block/nowhere" }));
        let resolver = ModelResolver::new(&pack);

        let err = resolver.resolve(&NamespacedKey::parse("block/orphan")).unwrap_err();
        assert!(matches!(err, RenderError::ParentMissing(ref k) if k == "minecraft:block/nowhere"));

        let err = resolver.resolve(&NamespacedKey::parse("block/absent")).unwrap_err();
        assert_eq!(err.kind(), "AssetNotFound");
    }

    #[test]
    fn test_cycle_rejected() {
        let mut pack = ResourcePack::new();
        pack.add_model("a", json!({ "parent": "b" }));
        pack.add_model("b", json!({ "parent": "a" }));
        let resolver = ModelResolver::new(&pack);
        let err = resolver.resolve(&NamespacedKey::parse("a")).unwrap_err();
        assert!(matches!(err, RenderError::CyclicParent(_)));
        assert_eq!(err.kind(), "SchemaError");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let parent = BlockModel::from_json(
            &json!({
                "ambientocclusion": false,
                "textures": { "a": "x", "b": "y" },
                "elements": [],
                "display": { "head": { "scale": [2, 2, 2] } }
            }),
            "p",
        )
        .unwrap();
        let child = BlockModel::from_json(
            &json!({ "textures": { "b": "z" }, "display": { "gui": { "rotation": [1, 2, 3] } } }),
            "c",
        )
        .unwrap();

        for delete in [false, true] {
            let once = merge(&child, &parent, delete);
            let twice = merge(&once, &parent, delete);
            assert_eq!(once, twice);
            assert_eq!(once.ambient_occlusion, Some(false));
            assert_eq!(once.display.len(), 2);
        }
    }

    #[test]
    fn test_delete_parent_elements() {
        let parent = ModelElement::new([0.0; 3], [16.0; 3]);
        let parent = BlockModel::new().with_elements(vec![parent]);
        let child = BlockModel::new().with_elements(vec![]);

        assert_eq!(merge(&child, &parent, false).elements.map(|e| e.len()), Some(1));
        assert_eq!(merge(&child, &parent, true).elements.map(|e| e.len()), Some(0));
    }

    #[test]
    fn test_texture_chain_limits() {
        let mut model = Model::default();
        model.textures.insert("a".into(), TextureRef::Variable("a".into()));
        assert_eq!(resolve_texture_ref(&model, "#a"), None);
        assert_eq!(resolve_texture_ref(&model, "#undefined"), None);
        assert_eq!(
            resolve_texture_ref(&model, "block/dirt"),
            Some(TextureRef::Key(NamespacedKey::parse("block/dirt")))
        );
    }
}
