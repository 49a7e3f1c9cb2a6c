//! Geometry for item models drawn by entity renderers.
//!
//! Chests, mob heads, player heads and banners have no element list in the
//! pack; their shape lives in entity model code. The factory rebuilds those
//! shapes as ordinary model elements with box-mapped UVs so they go through
//! the same resolver, geometry builder and rasterizer as any other model.

use super::node::short_tag;
use crate::error::{RenderError, Result};
use crate::item::Item;
use crate::mesher::Rgb;
use crate::resource_pack::{BlockModel, ModelElement, ModelFace, TextureLayer, TextureRef};
use crate::skin::{ProfileResolver, STEVE_TEXTURE};
use crate::types::{Axis, Direction, ElementRotation, NamespacedKey};
use serde_json::{json, Map, Value};
use std::f32::consts::PI;
use std::sync::Arc;

/// Kinds accepted in item definitions that draw only their base model.
const BASE_ONLY: &[&str] = &[
    "bed",
    "conduit",
    "shulker_box",
    "shield",
    "trident",
    "decorated_pot",
    "standing_sign",
    "hanging_sign",
    "copper_golem_statue",
];

/// The `model` object of a `special` item model node.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialModelSpec {
    Chest {
        texture: NamespacedKey,
        openness: f32,
    },
    Head {
        kind: String,
        texture: Option<NamespacedKey>,
        animation: f32,
    },
    PlayerHead,
    Banner {
        color: String,
    },
    /// Any other kind, kept verbatim.
    Other {
        kind: String,
        fields: Map<String, Value>,
    },
}

impl SpecialModelSpec {
    pub fn parse(value: &Value, path: &str) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| RenderError::schema(path, "special model must be an object"))?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::schema(path, "special model needs a `type`"))?;
        let number = |name: &str| obj.get(name).and_then(Value::as_f64).unwrap_or(0.0) as f32;
        let key = |name: &str| obj.get(name).and_then(Value::as_str).map(NamespacedKey::parse);

        Ok(match short_tag(kind) {
            "chest" => SpecialModelSpec::Chest {
                texture: key("texture")
                    .ok_or_else(|| RenderError::schema(path, "chest needs a `texture`"))?,
                openness: number("openness").clamp(0.0, 1.0),
            },
            "head" => SpecialModelSpec::Head {
                kind: obj
                    .get("kind")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RenderError::schema(path, "head needs a `kind`"))?
                    .to_string(),
                texture: key("texture"),
                animation: number("animation"),
            },
            "player_head" => SpecialModelSpec::PlayerHead,
            "banner" => SpecialModelSpec::Banner {
                color: obj
                    .get("color")
                    .and_then(Value::as_str)
                    .unwrap_or("white")
                    .to_string(),
            },
            other => SpecialModelSpec::Other {
                kind: other.to_string(),
                fields: obj.clone(),
            },
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            SpecialModelSpec::Chest { texture, openness } => json!({
                "type": "minecraft:chest",
                "texture": texture.to_string(),
                "openness": openness,
            }),
            SpecialModelSpec::Head {
                kind,
                texture,
                animation,
            } => {
                let mut v = json!({ "type": "minecraft:head", "kind": kind, "animation": animation });
                if let Some(texture) = texture {
                    v["texture"] = json!(texture.to_string());
                }
                v
            }
            SpecialModelSpec::PlayerHead => json!({ "type": "minecraft:player_head" }),
            SpecialModelSpec::Banner { color } => json!({ "type": "minecraft:banner", "color": color }),
            SpecialModelSpec::Other { fields, .. } => Value::Object(fields.clone()),
        }
    }
}

/// A box-mapped cuboid in block space.
///
/// Entity textures lay out a box as a net: the top and bottom in the first
/// row, then west, front, east and back. Entity models face their front
/// toward north with y pointing down; drawn upright that front ends up
/// facing south, so the net regions are assigned accordingly.
#[derive(Debug, Clone)]
struct EntityCube {
    from: [f32; 3],
    to: [f32; 3],
    /// Width, height and depth in texture pixels.
    size: [f32; 3],
    tex_offset: [u32; 2],
    mirror: bool,
    texture: &'static str,
    rotation: Option<ElementRotation>,
}

impl EntityCube {
    /// Box given directly in block space.
    fn block(from: [f32; 3], to: [f32; 3], tex_offset: [u32; 2]) -> Self {
        Self {
            from,
            to,
            size: [to[0] - from[0], to[1] - from[1], to[2] - from[2]],
            tex_offset,
            mirror: false,
            texture: "entity",
            rotation: None,
        }
    }

    /// Box in entity space (y down, front toward -z) below a root at
    /// `root`, scaled by `scale`.
    fn entity(root: [f32; 3], scale: f32, origin: [f32; 3], size: [f32; 3], tex_offset: [u32; 2]) -> Self {
        let [ox, oy, oz] = origin;
        let [w, h, d] = size;
        Self {
            from: [
                root[0] + scale * ox,
                root[1] - scale * (oy + h),
                root[2] - scale * (oz + d),
            ],
            to: [
                root[0] + scale * (ox + w),
                root[1] - scale * oy,
                root[2] - scale * oz,
            ],
            size,
            tex_offset,
            mirror: false,
            texture: "entity",
            rotation: None,
        }
    }

    fn inflate(mut self, amount: f32) -> Self {
        for i in 0..3 {
            self.from[i] -= amount;
            self.to[i] += amount;
        }
        self
    }

    fn mirrored(mut self) -> Self {
        self.mirror = true;
        self
    }

    fn textured(mut self, variable: &'static str) -> Self {
        self.texture = variable;
        self
    }

    fn rotated(mut self, origin: [f32; 3], axis: Axis, degrees: f32) -> Self {
        if degrees != 0.0 {
            self.rotation = Some(ElementRotation::new(origin, axis, degrees));
        }
        self
    }

    /// UV rectangle of one face in texture pixels.
    fn face_rect(&self, direction: Direction) -> [f32; 4] {
        let u = self.tex_offset[0] as f32;
        let v = self.tex_offset[1] as f32;
        let [w, h, d] = self.size;
        let rect = match direction {
            Direction::Up => [u + d, v, u + d + w, v + d],
            Direction::Down => [u + d + w, v, u + d + 2.0 * w, v + d],
            Direction::West => [u, v + d, u + d, v + d + h],
            Direction::South => [u + d, v + d, u + d + w, v + d + h],
            Direction::East => [u + d + w, v + d, u + 2.0 * d + w, v + d + h],
            Direction::North => [u + 2.0 * d + w, v + d, u + 2.0 * d + 2.0 * w, v + d + h],
        };
        if self.mirror {
            [rect[2], rect[1], rect[0], rect[3]]
        } else {
            rect
        }
    }

    fn to_element(&self, texture_size: [u32; 2]) -> ModelElement {
        let su = 16.0 / texture_size[0] as f32;
        let sv = 16.0 / texture_size[1] as f32;
        let mut element = ModelElement::new(self.from, self.to);
        element.rotation = self.rotation.clone();
        for direction in Direction::ALL {
            let [u1, v1, u2, v2] = self.face_rect(direction);
            element.faces.insert(
                direction,
                ModelFace::new(format!("#{}", self.texture)).with_uv([u1 * su, v1 * sv, u2 * su, v2 * sv]),
            );
        }
        element
    }
}

/// Dye colors as used to tint banner layers.
pub fn dye_color(name: &str) -> Option<Rgb> {
    let rgb: u32 = match short_tag(name) {
        "white" => 0xF9FFFE,
        "orange" => 0xF9801D,
        "magenta" => 0xC74EBD,
        "light_blue" => 0x3AB3DA,
        "yellow" => 0xFED83D,
        "lime" => 0x80C71F,
        "pink" => 0xF38BAA,
        "gray" => 0x474F52,
        "light_gray" => 0x9D9D97,
        "cyan" => 0x169C9C,
        "purple" => 0x8932B8,
        "blue" => 0x3C44AA,
        "brown" => 0x835432,
        "green" => 0x5E7C16,
        "red" => 0xB02E26,
        "black" => 0x1D1D21,
        _ => return None,
    };
    Some([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8])
}

/// Builds unbaked models for `special` item model nodes.
#[derive(Default)]
pub struct SpecialModelFactory<'a> {
    profiles: Option<&'a dyn ProfileResolver>,
}

impl<'a> SpecialModelFactory<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(mut self, profiles: &'a dyn ProfileResolver) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Geometry and textures for a special model. The caller sets the parent.
    pub fn build(&self, spec: &SpecialModelSpec, item: &Item) -> Result<BlockModel> {
        match spec {
            SpecialModelSpec::Chest { texture, openness } => Ok(chest(texture, *openness)),
            SpecialModelSpec::Head {
                kind,
                texture,
                animation,
            } => {
                if kind == "player" {
                    return self.player_head(item);
                }
                mob_head(kind, texture.as_ref(), *animation)
            }
            SpecialModelSpec::PlayerHead => self.player_head(item),
            SpecialModelSpec::Banner { color } => Ok(banner(color, item)),
            SpecialModelSpec::Other { kind, .. } if BASE_ONLY.contains(&kind.as_str()) => {
                tracing::debug!("special model `{}` drawn from its base model", kind);
                Ok(BlockModel::new())
            }
            SpecialModelSpec::Other { kind, .. } => Err(RenderError::UnsupportedFeature(format!(
                "special model `{}`",
                kind
            ))),
        }
    }

    fn player_head(&self, item: &Item) -> Result<BlockModel> {
        let skin = match (item.get("profile"), self.profiles) {
            (Some(profile), Some(profiles)) => profiles.fetch_skin(profile)?,
            _ => None,
        };
        let texture = match skin {
            Some(skin) => TextureRef::Image(Arc::new(skin)),
            None => TextureRef::Key(NamespacedKey::parse(STEVE_TEXTURE)),
        };

        let size = [64, 64];
        let elements = vec![
            EntityCube::block([4.0, 0.0, 4.0], [12.0, 8.0, 12.0], [0, 0]).to_element(size),
            EntityCube::block([4.0, 0.0, 4.0], [12.0, 8.0, 12.0], [32, 0])
                .inflate(0.25)
                .to_element(size),
        ];
        Ok(BlockModel::new()
            .with_texture("entity", texture)
            .with_elements(elements))
    }
}

fn chest(texture: &NamespacedKey, openness: f32) -> BlockModel {
    let size = [64, 64];
    let angle = -openness * 90.0;
    let hinge = [8.0, 10.0, 1.0];
    let elements = vec![
        EntityCube::block([1.0, 0.0, 1.0], [15.0, 10.0, 15.0], [0, 19]).to_element(size),
        EntityCube::block([1.0, 9.0, 1.0], [15.0, 14.0, 15.0], [0, 0])
            .rotated(hinge, Axis::X, angle)
            .to_element(size),
        EntityCube::block([7.0, 7.0, 14.0], [9.0, 11.0, 16.0], [0, 0])
            .rotated(hinge, Axis::X, angle)
            .to_element(size),
    ];
    BlockModel::new()
        .with_texture(
            "entity",
            TextureRef::Key(texture.with_prefix("entity/chest/")),
        )
        .with_elements(elements)
}

fn mob_head(kind: &str, texture: Option<&NamespacedKey>, animation: f32) -> Result<BlockModel> {
    let (default_texture, size): (&str, [u32; 2]) = match kind {
        "skeleton" => ("entity/skeleton/skeleton", [64, 32]),
        "wither_skeleton" => ("entity/skeleton/wither_skeleton", [64, 32]),
        "zombie" => ("entity/zombie/zombie", [64, 64]),
        "creeper" => ("entity/creeper/creeper", [64, 32]),
        "piglin" => ("entity/piglin/piglin", [64, 64]),
        "dragon" => ("entity/enderdragon/dragon", [256, 256]),
        other => {
            return Err(RenderError::UnsupportedFeature(format!("head kind `{}`", other)))
        }
    };
    let texture = match texture {
        Some(key) => key.with_prefix("entity/"),
        None => NamespacedKey::minecraft(default_texture),
    };

    let root = [8.0, 0.0, 8.0];
    let cubes = match kind {
        "piglin" => piglin_head(root, animation),
        "dragon" => dragon_head(animation),
        "zombie" => vec![
            EntityCube::entity(root, 1.0, [-4.0, -8.0, -4.0], [8.0; 3], [0, 0]),
            EntityCube::entity(root, 1.0, [-4.0, -8.0, -4.0], [8.0; 3], [32, 0]).inflate(0.25),
        ],
        _ => vec![EntityCube::entity(root, 1.0, [-4.0, -8.0, -4.0], [8.0; 3], [0, 0])],
    };

    let mut model = BlockModel::new()
        .with_texture("entity", TextureRef::Key(texture))
        .with_elements(cubes.iter().map(|c| c.to_element(size)).collect());
    if kind == "dragon" {
        model.zoom = Some(0.75);
    }
    Ok(model)
}

fn piglin_head(root: [f32; 3], animation: f32) -> Vec<EntityCube> {
    let cube = |origin, size, tex| EntityCube::entity(root, 1.0, origin, size, tex);
    // Ear angles are in entity space; flipping y and z upright negates a z rotation.
    let left = -(((animation * PI * 0.2 * 1.2).cos() + 2.5) * 0.2);
    let right = ((animation * PI * 0.2).cos() + 2.5) * 0.2;
    vec![
        cube([-5.0, -8.0, -4.0], [10.0, 8.0, 8.0], [0, 0]),
        cube([-2.0, -4.0, -5.0], [4.0, 4.0, 1.0], [31, 1]),
        cube([2.0, -2.0, -5.0], [1.0, 2.0, 1.0], [2, 4]),
        cube([-3.0, -2.0, -5.0], [1.0, 2.0, 1.0], [2, 0]),
        cube([4.5, -6.0, -2.0], [1.0, 5.0, 4.0], [51, 6]).rotated(
            [root[0] + 4.5, root[1] + 6.0, root[2]],
            Axis::Z,
            -left.to_degrees(),
        ),
        cube([-5.5, -6.0, -2.0], [1.0, 5.0, 4.0], [39, 6]).rotated(
            [root[0] - 4.5, root[1] + 6.0, root[2]],
            Axis::Z,
            -right.to_degrees(),
        ),
    ]
}

fn dragon_head(animation: f32) -> Vec<EntityCube> {
    let root = [8.0, 8.0, 8.0];
    let cube = |origin, size, tex| EntityCube::entity(root, 1.0, origin, size, tex);
    let jaw_angle = ((animation * PI * 0.2).sin() + 1.0) * 0.2;
    vec![
        cube([-6.0, -1.0, -24.0], [12.0, 5.0, 16.0], [176, 44]),
        cube([-8.0, -8.0, -10.0], [16.0, 16.0, 16.0], [112, 30]),
        cube([-5.0, -12.0, -4.0], [2.0, 4.0, 6.0], [0, 0]).mirrored(),
        cube([-5.0, -3.0, -22.0], [2.0, 2.0, 4.0], [112, 0]).mirrored(),
        cube([3.0, -12.0, -4.0], [2.0, 4.0, 6.0], [0, 0]),
        cube([3.0, -3.0, -22.0], [2.0, 2.0, 4.0], [112, 0]),
        cube([-6.0, 4.0, -24.0], [12.0, 4.0, 16.0], [176, 65]).rotated(
            [root[0], root[1] - 4.0, root[2] + 8.0],
            Axis::X,
            jaw_angle.to_degrees(),
        ),
    ]
}

fn banner(color: &str, item: &Item) -> BlockModel {
    let size = [64, 64];
    let scale = 2.0 / 3.0;
    let root = [8.0, 16.0, 8.0];
    let cube = |origin, dims, tex| EntityCube::entity(root, scale, origin, dims, tex);

    let base_color = dye_color(color).unwrap_or([255, 255, 255]);
    let mut layers = vec![
        TextureLayer::new(TextureRef::Key(NamespacedKey::minecraft("entity/banner_base")), Some([255; 3])),
        TextureLayer::new(TextureRef::Key(NamespacedKey::minecraft("entity/banner/base")), Some(base_color)),
    ];
    for pattern in item
        .get("banner_patterns")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(id) = pattern.get("pattern").and_then(Value::as_str) else {
            continue;
        };
        let color = pattern
            .get("color")
            .and_then(Value::as_str)
            .and_then(dye_color)
            .unwrap_or([255, 255, 255]);
        let key = NamespacedKey::parse(id);
        let texture = key.with_path(format!("entity/banner/{}", key.path()));
        layers.push(TextureLayer::new(TextureRef::Key(texture), Some(color)));
    }

    let cubes = [
        cube([-10.0, 2.0, -2.0], [20.0, 40.0, 1.0], [0, 0]).textured("flag"),
        cube([-1.0, -4.0, -1.0], [2.0, 42.0, 2.0], [44, 0]),
        cube([-10.0, -6.0, -1.0], [20.0, 2.0, 2.0], [0, 42]),
    ];
    BlockModel::new()
        .with_texture("entity", TextureRef::Key(NamespacedKey::minecraft("entity/banner_base")))
        .with_texture("flag", TextureRef::Layered(layers))
        .with_elements(cubes.iter().map(|c| c.to_element(size)).collect())
}
