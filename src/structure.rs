//! Structure templates rendered as a single scene.
//!
//! A structure is an NBT file with a `size`, one `palette` (or several
//! `palettes`, one chosen per render) and a list of `blocks` indexing into
//! it. Every block becomes one or more positioned model draws sharing a
//! camera scaled to fit the whole structure into one block's footprint.

use crate::error::{RenderError, Result};
use crate::item::Item;
use crate::mesher::tint::block_tint_sources;
use crate::mesher::{GeometryBuilder, TintResolver};
use crate::raster::Camera;
use crate::resolver::{resolve_block, ModelResolver};
use crate::scheduler::ScenePart;
use crate::types::{BlockPosition, BlockState, DisplayTransform, NamespacedKey};
use flate2::read::GzDecoder;
use glam::Vec3;
use quartz_nbt::io::{read_nbt, Flavor};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use rand::seq::SliceRandom;
use rand::Rng;
use std::io::{Cursor, Read};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// One placed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureBlock {
    pub pos: BlockPosition,
    /// Index into the chosen palette.
    pub state: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub size: [i32; 3],
    /// At least one palette; `palettes` files carry several.
    pub palettes: Vec<Vec<BlockState>>,
    pub blocks: Vec<StructureBlock>,
}

impl Structure {
    /// Parse a structure file, gzipped or not. Errors name `path`.
    pub fn parse(bytes: &[u8], path: &str) -> Result<Self> {
        let mut raw = Vec::new();
        if bytes.starts_with(&GZIP_MAGIC) {
            GzDecoder::new(bytes).read_to_end(&mut raw)?;
        } else {
            raw.extend_from_slice(bytes);
        }
        let (root, _) = read_nbt(&mut Cursor::new(&raw), Flavor::Uncompressed)?;
        Self::from_nbt(&root, path)
    }

    pub fn from_nbt(root: &NbtCompound, path: &str) -> Result<Self> {
        let schema = |message: String| RenderError::schema(path, message);

        let size = root
            .get::<_, &NbtList>("size")
            .map_err(|e| schema(e.to_string()))?;
        let size = int_list(size).ok_or_else(|| schema("size must be three ints".into()))?;
        let size: [i32; 3] = size
            .try_into()
            .map_err(|_| schema("size must be three ints".into()))?;

        let palettes = if let Ok(list) = root.get::<_, &NbtList>("palettes") {
            list.iter()
                .map(|tag| match tag {
                    NbtTag::List(palette) => parse_palette(palette).map_err(&schema),
                    _ => Err(schema("palettes entries must be lists".into())),
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            let palette = root
                .get::<_, &NbtList>("palette")
                .map_err(|e| schema(e.to_string()))?;
            vec![parse_palette(palette).map_err(&schema)?]
        };
        if palettes.is_empty() {
            return Err(schema("no palette".into()));
        }

        let blocks = root
            .get::<_, &NbtList>("blocks")
            .map_err(|e| schema(e.to_string()))?
            .iter()
            .map(|tag| match tag {
                NbtTag::Compound(block) => parse_block(block).map_err(&schema),
                _ => Err(schema("blocks entries must be compounds".into())),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            size,
            palettes,
            blocks,
        })
    }

    /// Pick the palette for one render.
    pub fn choose_palette<R: Rng + ?Sized>(&self, rng: &mut R) -> &[BlockState] {
        self.palettes
            .choose(rng)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn max_dimension(&self) -> i32 {
        self.size.into_iter().max().unwrap_or(1).max(1)
    }
}

fn int_list(list: &NbtList) -> Option<Vec<i32>> {
    list.iter()
        .map(|tag| match tag {
            NbtTag::Int(v) => Some(*v),
            _ => None,
        })
        .collect()
}

fn parse_palette(list: &NbtList) -> std::result::Result<Vec<BlockState>, String> {
    list.iter()
        .map(|tag| match tag {
            NbtTag::Compound(entry) => parse_state(entry),
            _ => Err("palette entries must be compounds".to_string()),
        })
        .collect()
}

fn parse_state(entry: &NbtCompound) -> std::result::Result<BlockState, String> {
    let name = entry
        .get::<_, &str>("Name")
        .map_err(|e| format!("palette entry: {}", e))?;
    let mut state = BlockState::new(NamespacedKey::parse(name));
    if let Ok(props) = entry.get::<_, &NbtCompound>("Properties") {
        for (key, value) in props.inner() {
            if let NbtTag::String(value) = value {
                state.properties.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(state)
}

fn parse_block(block: &NbtCompound) -> std::result::Result<StructureBlock, String> {
    let state = block
        .get::<_, i32>("state")
        .map_err(|e| format!("block: {}", e))?;
    let pos = block
        .get::<_, &NbtList>("pos")
        .map_err(|e| format!("block: {}", e))?;
    let pos = int_list(pos)
        .filter(|p| p.len() == 3)
        .ok_or_else(|| "block pos must be three ints".to_string())?;
    let state = usize::try_from(state).map_err(|_| format!("negative palette index {}", state))?;
    Ok(StructureBlock {
        pos: BlockPosition::new(pos[0], pos[1], pos[2]),
        state,
    })
}

/// Turns structures into positioned model draws.
pub struct StructureRenderer<'a> {
    models: &'a ModelResolver<'a>,
    tints: TintResolver<'a>,
    colorize: bool,
}

impl<'a> StructureRenderer<'a> {
    pub fn new(models: &'a ModelResolver<'a>, colorize: bool) -> Self {
        Self {
            models,
            tints: TintResolver::new(models.pack()),
            colorize,
        }
    }

    /// Camera that fits a structure of the given size into the GUI frame.
    pub fn camera(structure: &Structure) -> Camera {
        let scale = 0.625 / structure.max_dimension() as f32;
        Camera::new(
            DisplayTransform::new([30.0, 225.0, 0.0], [0.0; 3], [scale; 3]),
            1.0,
        )
    }

    /// Draw parts for every non-air block, in block order.
    pub fn scene<R: Rng + ?Sized>(&self, structure: &Structure, rng: &mut R) -> Result<Vec<ScenePart>> {
        let palette = structure.choose_palette(rng).to_vec();
        let camera = Self::camera(structure);
        let [sx, sy, sz] = structure.size;
        let center_offset = Vec3::new(sx as f32, sy as f32, sz as f32) * 8.0 - Vec3::splat(8.0);

        let mut parts = Vec::new();
        for block in &structure.blocks {
            let state = palette.get(block.state).ok_or_else(|| {
                RenderError::schema(
                    "structure",
                    format!("palette index {} out of range ({})", block.state, palette.len()),
                )
            })?;
            if state.is_air() {
                continue;
            }

            let tints = if self.colorize {
                let item = Item::new(state.name.clone());
                block_tint_sources(state)
                    .iter()
                    .map(|source| self.tints.resolve(source, &item))
                    .collect()
            } else {
                Vec::new()
            };

            let offset = Vec3::from_array(block.pos.as_array()) * 16.0;
            for resolved in resolve_block(self.models, state, true, rng)? {
                parts.push(ScenePart {
                    model: resolved.model,
                    tints: tints.clone(),
                    geometry: GeometryBuilder::new()
                        .with_offsets(center_offset, offset)
                        .with_block_transform(resolved.transform),
                    camera,
                });
            }
        }
        tracing::debug!(
            "structure {}x{}x{}: {} draws",
            sx,
            sy,
            sz,
            parts.len()
        );
        Ok(parts)
    }
}
