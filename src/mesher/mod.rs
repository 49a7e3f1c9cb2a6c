//! Model geometry and texture binding.
//!
//! `element` turns baked model elements into quads, `tint` computes face
//! colors, and `bind_model` attaches the images and colors the rasterizer
//! needs so drawing never touches the resource pack.

pub mod element;
pub mod geometry;
pub mod tint;

pub use element::GeometryBuilder;
pub use geometry::{Mesh, Quad, Vertex};
pub use tint::{Rgb, TintResolver, TintSource};

use crate::resolver::{resolve_texture_ref, MAX_TEXTURE_DEPTH};
use crate::resource_pack::{GuiLight, Model, ResourcePack, TextureData, TextureRef};
use crate::types::NamespacedKey;
use std::collections::HashMap;
use std::sync::Arc;

const WHITE: Rgb = [255, 255, 255];

/// One textured pass of a face.
#[derive(Debug, Clone)]
pub struct FaceLayer {
    pub texture: Arc<TextureData>,
    /// Vertex color for this pass.
    pub color: Rgb,
}

/// A quad with its texture passes resolved.
#[derive(Debug, Clone)]
pub struct DrawQuad {
    pub vertices: [Vertex; 4],
    pub layers: Vec<FaceLayer>,
    pub shade: bool,
}

/// Everything needed to draw one model.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub quads: Vec<DrawQuad>,
    pub gui_light: GuiLight,
}

impl DrawList {
    pub fn extend(&mut self, other: DrawList) {
        self.quads.extend(other.quads);
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}

/// Texture lookup for one run: derived textures first, then the pack, then
/// the missing-texture image.
pub struct TextureSource<'a> {
    pack: &'a ResourcePack,
    derived: &'a HashMap<NamespacedKey, Arc<TextureData>>,
    missing: Arc<TextureData>,
}

impl<'a> TextureSource<'a> {
    pub fn new(
        pack: &'a ResourcePack,
        derived: &'a HashMap<NamespacedKey, Arc<TextureData>>,
        transparent_missing: bool,
    ) -> Self {
        let missing = if transparent_missing {
            TextureData::transparent_placeholder()
        } else {
            TextureData::placeholder()
        };
        Self {
            pack,
            derived,
            missing: Arc::new(missing),
        }
    }

    pub fn missing(&self) -> Arc<TextureData> {
        self.missing.clone()
    }

    /// Raw texture as stored, without frame extraction.
    pub fn raw(&self, key: &NamespacedKey) -> Option<&Arc<TextureData>> {
        self.derived.get(key).or_else(|| self.pack.get_texture(key))
    }

    /// Texture by key; animated strips yield their first frame.
    pub fn lookup(&self, key: &NamespacedKey) -> Arc<TextureData> {
        match self.raw(key) {
            Some(texture) if texture.is_animated() => Arc::new(texture.frame(0)),
            Some(texture) => texture.clone(),
            None => {
                tracing::warn!("missing texture {}", key);
                self.missing.clone()
            }
        }
    }

    /// Texture passes for a face texture reference, each colored by `color`
    /// unless the layer carries its own tint.
    pub fn layers(&self, model: &Model, reference: &str, color: Rgb) -> Vec<FaceLayer> {
        self.layers_at(model, reference, color, 0)
    }

    fn layers_at(&self, model: &Model, reference: &str, color: Rgb, depth: usize) -> Vec<FaceLayer> {
        match resolve_texture_ref(model, reference) {
            Some(resolved) if depth < MAX_TEXTURE_DEPTH => self.expand(model, resolved, color, depth + 1),
            Some(_) => {
                tracing::warn!("texture {} nests deeper than {}", reference, MAX_TEXTURE_DEPTH);
                self.missing_layer(color)
            }
            None => {
                tracing::warn!("unresolved texture variable {}", reference);
                self.missing_layer(color)
            }
        }
    }

    fn missing_layer(&self, color: Rgb) -> Vec<FaceLayer> {
        vec![FaceLayer {
            texture: self.missing.clone(),
            color,
        }]
    }

    fn expand(&self, model: &Model, texture: TextureRef, color: Rgb, depth: usize) -> Vec<FaceLayer> {
        match texture {
            TextureRef::Key(key) => vec![FaceLayer {
                texture: self.lookup(&key),
                color,
            }],
            TextureRef::Image(image) => vec![FaceLayer { texture: image, color }],
            TextureRef::Variable(var) => self.layers_at(model, &format!("#{}", var), color, depth),
            TextureRef::Layered(_) if depth > MAX_TEXTURE_DEPTH => {
                tracing::warn!("layered texture nests deeper than {}", MAX_TEXTURE_DEPTH);
                self.missing_layer(color)
            }
            TextureRef::Layered(layers) => layers
                .into_iter()
                .flat_map(|layer| {
                    let color = layer.tint.unwrap_or(color);
                    self.expand(model, layer.texture, color, depth + 1)
                })
                .collect(),
        }
    }
}

/// Attach textures and tint colors to a built mesh.
pub fn bind_model(model: &Model, mesh: Mesh, tints: &[Rgb], textures: &TextureSource<'_>) -> DrawList {
    let quads = mesh
        .quads
        .into_iter()
        .map(|quad| {
            let color = usize::try_from(quad.tintindex)
                .ok()
                .and_then(|i| tints.get(i).copied())
                .unwrap_or(WHITE);
            DrawQuad {
                layers: textures.layers(model, &quad.texture, color),
                vertices: quad.vertices,
                shade: quad.shade,
            }
        })
        .collect();

    DrawList {
        quads,
        gui_light: model.gui_light,
    }
}
