//! Model parsing.
//!
//! Models describe geometry as a list of cuboid elements plus a map of
//! texture variables. `BlockModel` is the file as written, with every
//! inheritable field optional; `Model` is the baked form with the parent
//! chain inlined.

use crate::error::{RenderError, Result};
use crate::resource_pack::TextureData;
use crate::types::{Direction, DisplayTransform, ElementRotation, NamespacedKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Parent of flat item sprites; triggers layer synthesis in `bake()`.
pub const BUILTIN_GENERATED: &str = "minecraft:builtin/generated";
/// Parent of models drawn by an entity renderer.
pub const BUILTIN_ENTITY: &str = "minecraft:builtin/entity";

pub fn is_builtin(key: &NamespacedKey) -> bool {
    key.namespace() == "minecraft" && key.path().starts_with("builtin/")
}

/// Which light set a model is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuiLight {
    Front,
    #[default]
    Side,
}

/// Value of a texture variable.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureRef {
    /// Direct texture key, e.g. `minecraft:block/stone`.
    Key(NamespacedKey),
    /// Indirection to another variable, stored without the leading `#`.
    Variable(String),
    /// Inline image, used for skins, atlas outputs and animation frames.
    Image(Arc<TextureData>),
    /// Several textures drawn on top of each other, each with an optional tint.
    Layered(Vec<TextureLayer>),
}

/// One layer of a `TextureRef::Layered` stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextureLayer {
    pub texture: TextureRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<[u8; 3]>,
}

impl TextureLayer {
    pub fn new(texture: TextureRef, tint: Option<[u8; 3]>) -> Self {
        Self { texture, tint }
    }
}

impl TextureRef {
    /// Parse a texture string: `#name` is a variable, anything else a key.
    pub fn parse(value: &str) -> Self {
        match value.strip_prefix('#') {
            Some(var) => TextureRef::Variable(var.to_string()),
            None => TextureRef::Key(NamespacedKey::parse(value)),
        }
    }

    pub fn as_variable(&self) -> Option<&str> {
        match self {
            TextureRef::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for TextureRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TextureRef::Key(key) => serializer.collect_str(key),
            TextureRef::Variable(var) => serializer.collect_str(&format_args!("#{}", var)),
            TextureRef::Image(img) => {
                serializer.collect_str(&format_args!("inline:{}x{}", img.width, img.height))
            }
            TextureRef::Layered(layers) => layers.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TextureRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Sprite { sprite: String },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(s) | Raw::Sprite { sprite: s } => TextureRef::parse(&s),
        })
    }
}

/// A model file as written, before parent resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NamespacedKey>,

    #[serde(default, rename = "ambientocclusion", skip_serializing_if = "Option::is_none")]
    pub ambient_occlusion: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gui_light: Option<GuiLight>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub textures: BTreeMap<String, TextureRef>,

    /// `None` means inherit from the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<ModelElement>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub display: BTreeMap<String, DisplayTransform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<serde_json::Value>,

    /// Camera zoom override set by special model factories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f32>,
}

impl BlockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw model JSON, reporting schema violations against `path`.
    pub fn from_json(value: &serde_json::Value, path: &str) -> Result<Self> {
        BlockModel::deserialize(value).map_err(|e| RenderError::schema(path, e))
    }

    pub fn with_parent(mut self, parent: impl Into<NamespacedKey>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_texture(mut self, name: impl Into<String>, texture: TextureRef) -> Self {
        self.textures.insert(name.into(), texture);
        self
    }

    pub fn with_elements(mut self, elements: Vec<ModelElement>) -> Self {
        self.elements = Some(elements);
        self
    }
}

/// A fully baked model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    /// Only ever a builtin sentinel after baking.
    pub parent: Option<NamespacedKey>,
    pub ambient_occlusion: bool,
    pub gui_light: GuiLight,
    pub display: BTreeMap<String, DisplayTransform>,
    pub textures: BTreeMap<String, TextureRef>,
    pub elements: Vec<ModelElement>,
    pub zoom: f32,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            parent: None,
            ambient_occlusion: true,
            gui_light: GuiLight::Side,
            display: BTreeMap::new(),
            textures: BTreeMap::new(),
            elements: Vec::new(),
            zoom: 1.0,
        }
    }
}

impl Model {
    /// The `gui` display transform, defaulted when absent.
    pub fn gui_transform(&self) -> DisplayTransform {
        self.display
            .get("gui")
            .copied()
            .unwrap_or(DisplayTransform::GUI)
    }

    /// Canonical JSON used for cache keys.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A cuboid element within a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelElement {
    pub from: [f32; 3],
    pub to: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<ElementRotation>,
    #[serde(default = "default_shade")]
    pub shade: bool,
    #[serde(default)]
    pub faces: BTreeMap<Direction, ModelFace>,
}

fn default_shade() -> bool {
    true
}

impl ModelElement {
    pub fn new(from: [f32; 3], to: [f32; 3]) -> Self {
        Self {
            from,
            to,
            rotation: None,
            shade: true,
            faces: BTreeMap::new(),
        }
    }

    pub fn with_face(mut self, direction: Direction, face: ModelFace) -> Self {
        self.faces.insert(direction, face);
        self
    }

    pub fn min(&self) -> [f32; 3] {
        [
            self.from[0].min(self.to[0]),
            self.from[1].min(self.to[1]),
            self.from[2].min(self.to[2]),
        ]
    }

    pub fn max(&self) -> [f32; 3] {
        [
            self.from[0].max(self.to[0]),
            self.from[1].max(self.to[1]),
            self.from[2].max(self.to[2]),
        ]
    }
}

/// A face of a model element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFace {
    /// UV coordinates [u1, v1, u2, v2] in 0-16 range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv: Option<[f32; 4]>,
    /// Texture reference, `#name` for a variable.
    pub texture: String,
    /// Parsed but not used; the renderer does no adjacency culling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cullface: Option<Direction>,
    /// UV rotation in degrees (0, 90, 180, 270).
    #[serde(default)]
    pub rotation: i32,
    #[serde(default = "default_tint_index")]
    pub tintindex: i32,
}

fn default_tint_index() -> i32 {
    -1
}

impl ModelFace {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            uv: None,
            texture: texture.into(),
            cullface: None,
            rotation: 0,
            tintindex: -1,
        }
    }

    pub fn with_uv(mut self, uv: [f32; 4]) -> Self {
        self.uv = Some(uv);
        self
    }

    pub fn with_tint(mut self, tintindex: i32) -> Self {
        self.tintindex = tintindex;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_model() {
        let json = serde_json::json!({
            "parent": "block/cube_all",
            "textures": { "all": "block/stone" }
        });

        let model = BlockModel::from_json(&json, "models/stone.json").unwrap();
        assert_eq!(model.parent, Some(NamespacedKey::parse("minecraft:block/cube_all")));
        assert_eq!(
            model.textures.get("all"),
            Some(&TextureRef::Key(NamespacedKey::parse("block/stone")))
        );
        assert!(model.elements.is_none());
    }

    #[test]
    fn test_parse_model_with_elements() {
        let json = serde_json::json!({
            "textures": { "texture": "block/stone", "side": "#texture" },
            "elements": [{
                "from": [0, 0, 0],
                "to": [16, 16, 16],
                "faces": {
                    "down":  { "texture": "#texture", "cullface": "down" },
                    "north": { "texture": "#side", "tintindex": 0, "rotation": 90 }
                }
            }]
        });

        let model = BlockModel::from_json(&json, "models/cube.json").unwrap();
        let elements = model.elements.unwrap();
        assert_eq!(elements.len(), 1);
        let north = &elements[0].faces[&Direction::North];
        assert_eq!(north.tintindex, 0);
        assert_eq!(north.rotation, 90);
        assert!(elements[0].shade);
        assert_eq!(
            model.textures.get("side").and_then(|t| t.as_variable()),
            Some("texture")
        );
    }

    #[test]
    fn test_unknown_face_is_schema_error() {
        let json = serde_json::json!({
            "elements": [{ "from": [0, 0, 0], "to": [1, 1, 1], "faces": { "left": { "texture": "#x" } } }]
        });
        let err = BlockModel::from_json(&json, "models/bad.json").unwrap_err();
        assert!(matches!(err, RenderError::Schema { ref path, .. } if path == "models/bad.json"));
    }

    #[test]
    fn test_sprite_object_texture() {
        let json = serde_json::json!({ "textures": { "all": { "sprite": "custom:block/ore" } } });
        let model = BlockModel::from_json(&json, "m").unwrap();
        assert_eq!(
            model.textures["all"],
            TextureRef::Key(NamespacedKey::parse("custom:block/ore"))
        );
    }

    #[test]
    fn test_gui_transform_default() {
        let model = Model::default();
        assert_eq!(model.gui_transform(), DisplayTransform::GUI);
    }

    #[test]
    fn test_element_min_max_swapped() {
        let el = ModelElement::new([16.0, 0.0, 4.0], [0.0, 8.0, 2.0]);
        assert_eq!(el.min(), [0.0, 0.0, 2.0]);
        assert_eq!(el.max(), [16.0, 8.0, 4.0]);
    }

    #[test]
    fn test_texture_ref_serializes_as_string() {
        let json = serde_json::to_string(&TextureRef::parse("#layer0")).unwrap();
        assert_eq!(json, "\"#layer0\"");
        let json = serde_json::to_string(&TextureRef::parse("item/gem")).unwrap();
        assert_eq!(json, "\"minecraft:item/gem\"");
    }
}
