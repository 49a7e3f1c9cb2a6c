//! End-to-end renders through the scheduler.

use pack_renderer::animation::AnimationUnroller;
use pack_renderer::atlas::{AtlasDefinition, AtlasSource, PalettedPermutations};
use pack_renderer::export::OutputFormat;
use pack_renderer::mesher::TextureSource;
use pack_renderer::resolver::ModelResolver;
use pack_renderer::resource_pack::{AnimationFrame, AnimationMeta, BlockstateDefinition, TextureData};
use pack_renderer::{
    AnimationMode, Item, LightConfig, MemorySink, NamespacedKey, RenderConfig, RenderRequest,
    ResourcePack, TaskScheduler,
};
use quartz_nbt::io::{write_nbt, Flavor};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

/// Vanilla-like sprite parents.
fn base_pack() -> ResourcePack {
    let mut pack = ResourcePack::new();
    pack.add_model(
        "item/generated",
        json!({ "parent": "builtin/generated", "gui_light": "front" }),
    );
    pack
}

fn add_sprite(pack: &mut ResourcePack, model: &str, texture: &str, rgba: [u8; 4]) {
    pack.add_texture(texture, TextureData::solid(16, 16, rgba));
    pack.add_model(
        model,
        json!({ "parent": "minecraft:item/generated", "textures": { "layer0": texture } }),
    );
}

fn render(pack: &ResourcePack, config: RenderConfig, request: RenderRequest) -> MemorySink {
    let mut scheduler = TaskScheduler::new(pack, config).unwrap();
    scheduler.push(request);
    let mut sink = MemorySink::new();
    assert_eq!(scheduler.run(&mut sink).unwrap(), 1);
    sink
}

#[test]
fn flat_item_fills_gui_square() {
    let mut pack = base_pack();
    add_sprite(&mut pack, "custom:item/gem", "custom:item/gem", RED);

    let key = NamespacedKey::parse("custom:item/gem");
    let sink = render(&pack, RenderConfig::default(), RenderRequest::Model(key.clone()));
    assert_eq!(sink.outputs[0].format, OutputFormat::Png);
    let image = sink.image(&key).unwrap();
    assert_eq!(image.dimensions(), (128, 128));

    let inside = 24..104;
    for (x, y, pixel) in image.enumerate_pixels() {
        if inside.contains(&x) && inside.contains(&y) {
            assert_eq!(pixel.0, RED, "({}, {})", x, y);
        } else {
            assert_eq!(pixel.0, [0; 4], "({}, {})", x, y);
        }
    }
}

#[test]
fn tinted_cube_face_is_pure_tint() {
    let mut pack = ResourcePack::new();
    pack.add_texture("block/white", TextureData::solid(16, 16, [255; 4]));
    pack.add_model(
        "custom:block/cube",
        json!({
            "textures": { "all": "block/white" },
            "display": { "gui": { "rotation": [0, 180, 0], "scale": [0.625, 0.625, 0.625] } },
            "elements": [{ "from": [0, 0, 0], "to": [16, 16, 16],
                "faces": { "north": { "texture": "#all", "tintindex": 0 } } }]
        }),
    );
    pack.add_item_definition(
        "custom:cube",
        json!({ "model": { "type": "minecraft:model", "model": "custom:block/cube",
            "tints": [{ "type": "minecraft:constant", "value": [0, 255, 0] }] } }),
    );

    let config = RenderConfig {
        render_size: 32,
        light: LightConfig {
            power: 0.0,
            ambient: 1.0,
            ..LightConfig::default()
        },
        ..RenderConfig::default()
    };
    let sink = render(&pack, config, RenderRequest::Item(Item::new("custom:cube")));
    let image = sink.image(&NamespacedKey::parse("custom:item/cube")).unwrap();

    let drawn: Vec<[u8; 4]> = image.pixels().map(|p| p.0).filter(|p| p[3] > 0).collect();
    assert!(!drawn.is_empty());
    assert!(drawn.iter().all(|p| *p == GREEN));
}

/// Item definitions choosing between red, green and blue sprites.
fn dispatch_pack(definition: serde_json::Value) -> ResourcePack {
    let mut pack = base_pack();
    add_sprite(&mut pack, "custom:item/a", "custom:item/red", RED);
    add_sprite(&mut pack, "custom:item/b", "custom:item/blue", BLUE);
    add_sprite(&mut pack, "custom:item/c", "custom:item/green", GREEN);
    pack.add_item_definition("minecraft:diamond_pickaxe", json!({ "model": definition }));
    pack
}

fn center_of_pickaxe(pack: &ResourcePack, item: Item) -> [u8; 4] {
    let config = RenderConfig {
        render_size: 32,
        ..RenderConfig::default()
    };
    let sink = render(pack, config, RenderRequest::Item(item));
    let image = sink
        .image(&NamespacedKey::parse("minecraft:item/diamond_pickaxe"))
        .unwrap();
    image.get_pixel(16, 16).0
}

#[test]
fn damaged_condition_picks_true_branch() {
    let pack = dispatch_pack(json!({
        "type": "minecraft:condition",
        "property": "minecraft:damaged",
        "on_true": { "type": "minecraft:model", "model": "custom:item/a" },
        "on_false": { "type": "minecraft:model", "model": "custom:item/b" }
    }));
    let item = Item::new("minecraft:diamond_pickaxe")
        .with_component("damage", json!(5))
        .with_component("max_damage", json!(1561));
    assert_eq!(center_of_pickaxe(&pack, item), RED);

    let pristine = Item::new("minecraft:diamond_pickaxe").with_component("max_damage", json!(1561));
    assert_eq!(center_of_pickaxe(&pack, pristine), BLUE);
}

#[test]
fn range_dispatch_normalizes_damage() {
    let pack = dispatch_pack(json!({
        "type": "minecraft:range_dispatch",
        "property": "minecraft:damage",
        "scale": 1.0,
        "entries": [
            { "threshold": 0, "model": { "type": "minecraft:model", "model": "custom:item/a" } },
            { "threshold": 0.5, "model": { "type": "minecraft:model", "model": "custom:item/b" } }
        ],
        "fallback": { "type": "minecraft:model", "model": "custom:item/c" }
    }));
    let item = Item::new("minecraft:diamond_pickaxe")
        .with_component("damage", json!(780))
        .with_component("max_damage", json!(1560));
    assert_eq!(center_of_pickaxe(&pack, item), BLUE);
}

#[test]
fn paletted_permutation_recolors_sprite() {
    let gray_a = [10, 10, 10, 255];
    let gray_b = [20, 20, 20, 128];
    let strip = |a: [u8; 4], b: [u8; 4]| TextureData::new(2, 1, a.iter().chain(b.iter()).copied().collect());

    let mut pack = base_pack();
    pack.add_texture("custom:trims/coast", strip(gray_a, gray_b));
    pack.add_texture("custom:trims/palette", strip([10, 10, 10, 255], [20, 20, 20, 255]));
    pack.add_texture("custom:trims/gold", strip([250, 200, 0, 255], [120, 60, 0, 255]));
    let mut permutations = BTreeMap::new();
    permutations.insert("gold".to_string(), NamespacedKey::parse("custom:trims/gold"));
    pack.add_atlas(
        "custom:armor_trims",
        AtlasDefinition {
            sources: vec![AtlasSource::PalettedPermutations(PalettedPermutations {
                textures: vec![NamespacedKey::parse("custom:trims/coast")],
                palette_key: NamespacedKey::parse("custom:trims/palette"),
                permutations,
                separator: "_".to_string(),
            })],
        },
    );
    pack.add_model(
        "custom:item/trim",
        json!({ "parent": "minecraft:item/generated", "textures": { "layer0": "custom:trims/coast_gold" } }),
    );

    let key = NamespacedKey::parse("custom:item/trim");
    let sink = render(&pack, RenderConfig::default(), RenderRequest::Model(key.clone()));
    let image = sink.image(&key).unwrap();
    assert_eq!(image.get_pixel(40, 64).0, [250, 200, 0, 255]);
    assert_eq!(image.get_pixel(88, 64).0, [120, 60, 0, 128]);
}

fn animated_pack() -> ResourcePack {
    let mut pixels = vec![0u8; 16 * 32 * 4];
    for (i, px) in pixels.chunks_exact_mut(4).enumerate() {
        let color = if i < 16 * 16 { [0, 0, 0, 255] } else { [200, 100, 50, 255] };
        px.copy_from_slice(&color);
    }
    let texture = TextureData::new(16, 32, pixels).with_animation(AnimationMeta {
        interpolate: true,
        frametime: 2,
        frames: Some(vec![AnimationFrame::Index(0), AnimationFrame::Index(1)]),
    });

    let mut pack = base_pack();
    pack.add_texture("custom:item/glow", texture);
    pack.add_model(
        "custom:item/glow",
        json!({ "parent": "minecraft:item/generated", "textures": { "layer0": "custom:item/glow" } }),
    );
    pack
}

#[test]
fn interpolated_animation_unrolls_to_blended_keyframes() {
    let pack = animated_pack();
    let derived = HashMap::new();
    let textures = TextureSource::new(&pack, &derived, false);
    let model = ModelResolver::new(&pack)
        .resolve(&NamespacedKey::parse("custom:item/glow"))
        .unwrap();

    let keyframes = AnimationUnroller::new(&textures).unroll(&[&model]);
    assert_eq!(keyframes.len(), 4);
    assert_eq!(keyframes.iter().map(|k| k.duration).sum::<u32>(), 4);
    let blended = &keyframes[1].bindings[&(0, "layer0".to_string())];
    assert_eq!(blended.get_pixel(3, 3), [100, 50, 25, 255]);
}

#[test]
fn animated_item_renders_to_webp() {
    let pack = animated_pack();
    let key = NamespacedKey::parse("custom:item/glow");
    let config = RenderConfig {
        render_size: 32,
        animation_mode: AnimationMode::Webp,
        ..RenderConfig::default()
    };
    let sink = render(&pack, config, RenderRequest::Model(key.clone()));

    let output = sink.get(&key).unwrap();
    assert_eq!(output.format, OutputFormat::Webp);
    assert_eq!(&output.bytes[0..4], b"RIFF");
    assert_eq!(&output.bytes[8..12], b"WEBP");
    let frames = output.bytes.windows(4).filter(|w| *w == b"ANMF").count();
    assert_eq!(frames, 4);

    // PNG mode renders the first keyframe only
    let still = render(&pack, RenderConfig { render_size: 32, ..RenderConfig::default() }, RenderRequest::Model(key.clone()));
    assert_eq!(still.image(&key).unwrap().get_pixel(16, 16).0, [0, 0, 0, 255]);
}

fn int_list(values: &[i32]) -> NbtTag {
    let mut list = NbtList::new();
    for v in values {
        list.push(NbtTag::Int(*v));
    }
    NbtTag::List(list)
}

#[test]
fn structure_renders_placed_blocks() {
    let mut pack = ResourcePack::new();
    pack.add_texture("block/stone", TextureData::solid(16, 16, [128, 128, 128, 255]));
    pack.add_model(
        "block/stone",
        json!({
            "textures": { "all": "block/stone" },
            "elements": [{ "from": [0, 0, 0], "to": [16, 16, 16], "faces": {
                "up": { "texture": "#all" }, "north": { "texture": "#all" },
                "south": { "texture": "#all" }, "east": { "texture": "#all" },
                "west": { "texture": "#all" }, "down": { "texture": "#all" } } }]
        }),
    );
    let stone: BlockstateDefinition =
        serde_json::from_value(json!({ "variants": { "": { "model": "block/stone" } } })).unwrap();
    pack.add_blockstate("stone", stone);

    let mut root = NbtCompound::new();
    root.insert("size", int_list(&[2, 1, 1]));
    let mut palette = NbtList::new();
    let mut entry = NbtCompound::new();
    entry.insert("Name", NbtTag::String("minecraft:stone".to_string()));
    palette.push(NbtTag::Compound(entry));
    root.insert("palette", NbtTag::List(palette));
    let mut blocks = NbtList::new();
    for x in 0..2 {
        let mut block = NbtCompound::new();
        block.insert("state", NbtTag::Int(0));
        block.insert("pos", int_list(&[x, 0, 0]));
        blocks.push(NbtTag::Compound(block));
    }
    root.insert("blocks", NbtTag::List(blocks));
    let mut bytes = Vec::new();
    write_nbt(&mut bytes, None, &root, Flavor::GzCompressed).unwrap();
    pack.add_structure("house", bytes);

    let config = RenderConfig {
        render_size: 32,
        ..RenderConfig::default()
    };
    let sink = render(&pack, config, RenderRequest::Structure(NamespacedKey::parse("house")));
    let image = sink
        .image(&NamespacedKey::parse("minecraft:structure/house"))
        .unwrap();
    assert!(image.pixels().any(|p| p.0[3] == 255));
    assert_eq!(image.get_pixel(0, 0).0, [0; 4]);
}

#[test]
fn missing_item_definition_aborts_run() {
    let pack = base_pack();
    let mut scheduler = TaskScheduler::new(&pack, RenderConfig::default()).unwrap();
    scheduler.push(RenderRequest::Item(Item::new("custom:nothing")));
    let err = scheduler.run(&mut MemorySink::new()).unwrap_err();
    assert_eq!(err.kind(), "AssetNotFound");
}
