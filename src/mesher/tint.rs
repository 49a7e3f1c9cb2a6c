//! Tint sources for item and block faces.
//!
//! A face with `tintindex >= 0` is multiplied by the color of the tint source
//! at that index. Item models carry their tint sources in the item model
//! definition; blocks in structures get them from their block category.

use crate::error::{RenderError, Result};
use crate::item::Item;
use crate::resource_pack::ResourcePack;
use crate::types::{BlockState, NamespacedKey};
use serde_json::{json, Value};

/// 24-bit RGB color.
pub type Rgb = [u8; 3];

/// Grass color used when the colormap texture is unavailable.
const FALLBACK_GRASS: Rgb = [0x91, 0xBD, 0x59];

/// A tagged tint source.
#[derive(Debug, Clone, PartialEq)]
pub enum TintSource {
    Constant(Rgb),
    Dye { default: Rgb },
    Grass { temperature: f32, downfall: f32 },
    Firework { default: Rgb },
    Potion { default: Rgb },
    Map { default: Rgb },
    CustomModelData { index: usize, default: Option<Rgb> },
    Team { default: Rgb },
}

/// Parse a color given as a big-endian RGB integer or an `[r, g, b]` list.
/// Lists of floats are 0..1; lists with any value above 1 are 0..255.
pub fn parse_color(value: &Value) -> Option<Rgb> {
    match value {
        Value::Number(n) => {
            let v = n.as_i64()? as u32;
            Some([(v >> 16) as u8, (v >> 8) as u8, v as u8])
        }
        Value::Array(items) if items.len() >= 3 => {
            let items = &items[..3];
            let channels: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if channels.len() != 3 {
                return None;
            }
            // floats are 0..1, integers are 0..255
            let floats = items.iter().any(|v| matches!(v, Value::Number(n) if n.is_f64()));
            let scale = if floats { 255.0 } else { 1.0 };
            let c = |v: f64| (v * scale).round().clamp(0.0, 255.0) as u8;
            Some([c(channels[0]), c(channels[1]), c(channels[2])])
        }
        _ => None,
    }
}

pub fn color_to_int(rgb: Rgb) -> u32 {
    ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32
}

impl TintSource {
    /// Parse a tint source object; `type` accepts names with or without `minecraft:`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| RenderError::schema("tints", format!("expected an object, got {}", value)))?;
        let kind = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::schema("tints", "missing `type`"))?;
        let kind = kind.strip_prefix("minecraft:").unwrap_or(kind);

        let color = |field: &str| -> Result<Rgb> {
            obj.get(field).and_then(parse_color).ok_or_else(|| {
                RenderError::schema("tints", format!("{} tint needs a `{}` color", kind, field))
            })
        };
        let number = |field: &str, default: f64| obj.get(field).and_then(Value::as_f64).unwrap_or(default);

        Ok(match kind {
            "constant" => TintSource::Constant(color("value")?),
            "dye" => TintSource::Dye { default: color("default")? },
            "grass" => TintSource::Grass {
                temperature: number("temperature", 0.5) as f32,
                downfall: number("downfall", 1.0) as f32,
            },
            "firework" => TintSource::Firework { default: color("default")? },
            "potion" => TintSource::Potion { default: color("default")? },
            "map_color" | "map" => TintSource::Map { default: color("default")? },
            "custom_model_data" => TintSource::CustomModelData {
                index: number("index", 0.0).max(0.0) as usize,
                default: obj.get("default").and_then(parse_color),
            },
            "team" => TintSource::Team { default: color("default")? },
            other => {
                return Err(RenderError::schema(
                    "tints",
                    format!("unknown tint source type `{}`", other),
                ))
            }
        })
    }

    /// Serialize back to item model JSON with the `minecraft:` prefix.
    pub fn to_json(&self) -> Value {
        match self {
            TintSource::Constant(c) => json!({ "type": "minecraft:constant", "value": color_to_int(*c) }),
            TintSource::Dye { default } => json!({ "type": "minecraft:dye", "default": color_to_int(*default) }),
            TintSource::Grass { temperature, downfall } => {
                json!({ "type": "minecraft:grass", "temperature": temperature, "downfall": downfall })
            }
            TintSource::Firework { default } => {
                json!({ "type": "minecraft:firework", "default": color_to_int(*default) })
            }
            TintSource::Potion { default } => {
                json!({ "type": "minecraft:potion", "default": color_to_int(*default) })
            }
            TintSource::Map { default } => {
                json!({ "type": "minecraft:map_color", "default": color_to_int(*default) })
            }
            TintSource::CustomModelData { index, default } => {
                let mut v = json!({ "type": "minecraft:custom_model_data", "index": index });
                if let Some(d) = default {
                    v["default"] = json!(color_to_int(*d));
                }
                v
            }
            TintSource::Team { default } => json!({ "type": "minecraft:team", "default": color_to_int(*default) }),
        }
    }
}

/// Evaluates tint sources against an item.
pub struct TintResolver<'a> {
    pack: &'a ResourcePack,
}

impl<'a> TintResolver<'a> {
    pub fn new(pack: &'a ResourcePack) -> Self {
        Self { pack }
    }

    pub fn resolve(&self, source: &TintSource, item: &Item) -> Rgb {
        match source {
            TintSource::Constant(c) => *c,
            TintSource::Dye { default } => item
                .get("dyed_color")
                .and_then(|v| v.get("rgb").and_then(parse_color).or_else(|| parse_color(v)))
                .unwrap_or(*default),
            TintSource::Grass { temperature, downfall } => self.grass(*temperature, *downfall),
            TintSource::Firework { default } => item
                .get("firework_color")
                .and_then(|v| v.get("colors"))
                .and_then(Value::as_array)
                .and_then(|colors| mean_color(colors))
                .unwrap_or(*default),
            TintSource::Potion { default } => {
                let contents = item.get("potion_contents");
                let custom = contents.and_then(|c| c.get("custom_color")).and_then(parse_color);
                let has_effects = contents
                    .and_then(|c| c.get("custom_effects"))
                    .and_then(Value::as_array)
                    .map(|e| !e.is_empty())
                    .unwrap_or(false);
                match custom {
                    Some(color) if has_effects => color,
                    _ => *default,
                }
            }
            TintSource::Map { default } => item
                .get("map_color")
                .and_then(parse_color)
                .unwrap_or(*default),
            TintSource::CustomModelData { index, default } => item
                .custom_model_data("colors")
                .and_then(|colors| colors.get(*index))
                .and_then(parse_color)
                .or(*default)
                .unwrap_or([0, 0, 0]),
            TintSource::Team { default } => *default,
        }
    }

    /// Sample the grass colormap.
    pub fn grass(&self, temperature: f32, downfall: f32) -> Rgb {
        let key = NamespacedKey::minecraft("colormap/grass");
        let Some(colormap) = self.pack.get_texture(&key) else {
            tracing::warn!("{} missing, using fallback grass color", key);
            return FALLBACK_GRASS;
        };
        if colormap.width == 0 || colormap.height == 0 {
            return FALLBACK_GRASS;
        }

        let temperature = temperature.clamp(0.0, 1.0);
        let downfall = downfall.clamp(0.0, 1.0) * temperature;
        let w = (colormap.width - 1) as f32;
        let h = (colormap.height - 1) as f32;
        let x = (w - (temperature * w).round()) as u32;
        let y = (h - (downfall * h).round()) as u32;
        let [r, g, b, _] = colormap.get_pixel(x, y);
        [r, g, b]
    }
}

fn mean_color(colors: &[Value]) -> Option<Rgb> {
    let parsed: Vec<Rgb> = colors.iter().filter_map(parse_color).collect();
    if parsed.is_empty() {
        return None;
    }
    let n = parsed.len() as u32;
    let mut sum = [0u32; 3];
    for c in &parsed {
        for i in 0..3 {
            sum[i] += c[i] as u32;
        }
    }
    Some([(sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8])
}

/// Tint category of a block, for `colorize_blocks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TintCategory {
    Grass,
    Foliage,
    Water,
    Redstone,
    Stem,
    LilyPad,
    None,
}

pub fn categorize_block(block_id: &str) -> TintCategory {
    match block_id {
        "grass_block" | "grass" | "short_grass" | "tall_grass" | "fern" | "large_fern"
        | "potted_fern" | "sugar_cane" => TintCategory::Grass,
        "vine" => TintCategory::Foliage,
        "water" | "water_cauldron" | "bubble_column" => TintCategory::Water,
        "redstone_wire" => TintCategory::Redstone,
        "melon_stem" | "pumpkin_stem" | "attached_melon_stem" | "attached_pumpkin_stem" => {
            TintCategory::Stem
        }
        "lily_pad" => TintCategory::LilyPad,
        id if id.ends_with("_leaves")
            && !matches!(id, "azalea_leaves" | "flowering_azalea_leaves" | "cherry_leaves") =>
        {
            TintCategory::Foliage
        }
        _ => TintCategory::None,
    }
}

/// Tint sources for a block drawn in a structure. Every tint index of the
/// block's faces maps to the same color.
pub fn block_tint_sources(state: &BlockState) -> Vec<TintSource> {
    let color = match categorize_block(state.name.path()) {
        TintCategory::Grass => {
            return vec![TintSource::Grass {
                temperature: 0.5,
                downfall: 1.0,
            }]
        }
        TintCategory::Foliage => [0x48, 0xB5, 0x18],
        TintCategory::Water => [0x3F, 0x76, 0xE4],
        TintCategory::LilyPad => [0x20, 0x80, 0x30],
        TintCategory::Redstone => {
            let power = property_number(state, "power").min(15);
            redstone_color(power)
        }
        TintCategory::Stem => {
            let age = property_number(state, "age").min(7);
            if state.name.path().starts_with("attached_") {
                [0xE0, 0xC7, 0x1C]
            } else {
                [(age * 32) as u8, (255 - age * 8) as u8, (age * 4) as u8]
            }
        }
        TintCategory::None => return Vec::new(),
    };
    vec![TintSource::Constant(color)]
}

fn property_number(state: &BlockState, name: &str) -> u32 {
    state
        .properties
        .get(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Redstone dust color for a power level 0..=15.
pub fn redstone_color(power: u32) -> Rgb {
    let f = power as f32 / 15.0;
    let r = f * 0.6 + if f > 0.0 { 0.4 } else { 0.3 };
    let g = (f * f * 0.7 - 0.5).max(0.0);
    let b = (f * f * 0.6 - 0.7).max(0.0);
    [r, g, b].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_pack::TextureData;

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color(&json!(0xFF8000)), Some([255, 128, 0]));
        assert_eq!(parse_color(&json!([1.0, 0.5, 0.0])), Some([255, 128, 0]));
        assert_eq!(parse_color(&json!([255, 128, 0])), Some([255, 128, 0]));
        assert_eq!(parse_color(&json!([1, 0, 0])), Some([1, 0, 0]));
        assert_eq!(parse_color(&json!([1.0, 0, 0])), Some([255, 0, 0]));
        assert_eq!(parse_color(&json!("red")), None);
    }

    #[test]
    fn test_tint_source_roundtrip() {
        let src = TintSource::from_json(&json!({ "type": "dye", "default": -6265536 }));
        // negative ints wrap like the game's signed colors
        assert!(src.is_ok());
        let src = TintSource::from_json(&json!({ "type": "minecraft:constant", "value": 0x00FF00 })).unwrap();
        assert_eq!(src, TintSource::Constant([0, 255, 0]));
        assert_eq!(TintSource::from_json(&src.to_json()).unwrap(), src);
        assert!(TintSource::from_json(&json!({ "type": "rainbow" })).is_err());
    }

    #[test]
    fn test_dye_and_map() {
        let pack = ResourcePack::new();
        let resolver = TintResolver::new(&pack);
        let item = Item::new("leather_helmet").with_component("dyed_color", json!(0x123456));
        let dye = TintSource::Dye { default: [1, 2, 3] };
        assert_eq!(resolver.resolve(&dye, &item), [0x12, 0x34, 0x56]);
        assert_eq!(resolver.resolve(&dye, &Item::new("leather_helmet")), [1, 2, 3]);

        let map = TintSource::Map { default: [9, 9, 9] };
        assert_eq!(resolver.resolve(&map, &item), [9, 9, 9]);
    }

    #[test]
    fn test_potion_requires_effects() {
        let pack = ResourcePack::new();
        let resolver = TintResolver::new(&pack);
        let potion = TintSource::Potion { default: [0, 0, 255] };

        let plain = Item::new("potion").with_component("potion_contents", json!({ "custom_color": 0xFF0000 }));
        assert_eq!(resolver.resolve(&potion, &plain), [0, 0, 255]);

        let with_effects = Item::new("potion").with_component(
            "potion_contents",
            json!({ "custom_color": 0xFF0000, "custom_effects": [{ "id": "speed" }] }),
        );
        assert_eq!(resolver.resolve(&potion, &with_effects), [255, 0, 0]);
    }

    #[test]
    fn test_firework_mean_and_custom_model_data() {
        let pack = ResourcePack::new();
        let resolver = TintResolver::new(&pack);
        let item = Item::new("firework_star")
            .with_component("firework_color", json!({ "colors": [0xFF0000, 0x0000FF] }))
            .with_component("custom_model_data", json!({ "colors": [0x00FF00] }));

        let fw = TintSource::Firework { default: [0, 0, 0] };
        assert_eq!(resolver.resolve(&fw, &item), [127, 0, 127]);

        let cmd = |index| TintSource::CustomModelData { index, default: None };
        assert_eq!(resolver.resolve(&cmd(0), &item), [0, 255, 0]);
        assert_eq!(resolver.resolve(&cmd(3), &item), [0, 0, 0]);
    }

    #[test]
    fn test_grass_colormap_index() {
        let mut pixels = Vec::new();
        for y in 0..3u8 {
            for x in 0..3u8 {
                pixels.extend_from_slice(&[x, y, 0, 255]);
            }
        }
        let mut pack = ResourcePack::new();
        pack.add_texture("colormap/grass", TextureData::new(3, 3, pixels));
        let resolver = TintResolver::new(&pack);

        assert_eq!(resolver.grass(1.0, 1.0), [0, 0, 0]);
        assert_eq!(resolver.grass(0.0, 0.0), [2, 2, 0]);
        assert_eq!(resolver.grass(0.5, 1.0), [1, 1, 0]);
        assert_eq!(resolver.grass(7.0, -3.0), [0, 2, 0]);

        let source = TintSource::Grass { temperature: 0.5, downfall: 1.0 };
        let item = Item::new("grass_block");
        assert_eq!(resolver.resolve(&source, &item), resolver.resolve(&source, &item));
    }

    #[test]
    fn test_block_categories() {
        assert_eq!(categorize_block("oak_leaves"), TintCategory::Foliage);
        assert_eq!(categorize_block("cherry_leaves"), TintCategory::None);
        assert_eq!(categorize_block("grass_block"), TintCategory::Grass);
        assert_eq!(
            block_tint_sources(&BlockState::new("redstone_wire").with_property("power", "15")),
            vec![TintSource::Constant([255, 51, 0])]
        );
        assert!(block_tint_sources(&BlockState::new("stone")).is_empty());
    }
}
