//! Paletted permutation textures.

use super::{AtlasDefinition, AtlasSource, PalettedPermutations};
use crate::resource_pack::{ResourcePack, TextureData};
use crate::types::NamespacedKey;
use std::collections::HashMap;
use std::sync::Arc;

/// Generates the derived textures described by atlas definitions.
pub struct AtlasResolver<'a> {
    pack: &'a ResourcePack,
    include_vanilla: bool,
}

impl<'a> AtlasResolver<'a> {
    pub fn new(pack: &'a ResourcePack, include_vanilla: bool) -> Self {
        Self {
            pack,
            include_vanilla,
        }
    }

    /// Build every permutation texture. The result lives only for the run and
    /// is consulted before the pack's own textures.
    pub fn resolve(&self) -> HashMap<NamespacedKey, Arc<TextureData>> {
        let mut derived = HashMap::new();

        let mut atlases: Vec<(&NamespacedKey, &AtlasDefinition)> = self.pack.atlases.iter().collect();
        if self.include_vanilla {
            atlases.extend(self.pack.vanilla_atlases.iter());
        }
        atlases.sort_by(|a, b| a.0.cmp(b.0));

        for (atlas_key, atlas) in atlases {
            for source in &atlas.sources {
                if let AtlasSource::PalettedPermutations(source) = source {
                    tracing::debug!("resolving paletted permutations of atlas {}", atlas_key);
                    self.resolve_source(source, &mut derived);
                }
            }
        }

        derived
    }

    fn resolve_source(
        &self,
        source: &PalettedPermutations,
        out: &mut HashMap<NamespacedKey, Arc<TextureData>>,
    ) {
        let Some(palette) = self.texture(&source.palette_key) else {
            return;
        };

        for (variant, color_palette_key) in &source.permutations {
            let Some(color_palette) = self.texture(color_palette_key) else {
                continue;
            };
            for texture_key in &source.textures {
                let Some(grayscale) = self.texture(texture_key) else {
                    continue;
                };
                let derived_key = texture_key.with_path(format!(
                    "{}{}{}",
                    texture_key.path(),
                    source.separator,
                    variant
                ));
                let texture = remap_with_palette(grayscale, palette, color_palette);
                out.entry(derived_key).or_insert_with(|| Arc::new(texture));
            }
        }
    }

    fn texture(&self, key: &NamespacedKey) -> Option<&'a TextureData> {
        let found = self.pack.get_texture(key).map(|t| t.as_ref());
        if found.is_none() {
            tracing::warn!("paletted permutation input {} is missing", key);
        }
        found
    }
}

/// Replace every pixel whose RGB appears in `palette` with the color at the
/// same position in `color_palette`, keeping the source alpha. Pixels not in
/// the palette pass through unchanged.
pub fn remap_with_palette(
    grayscale: &TextureData,
    palette: &TextureData,
    color_palette: &TextureData,
) -> TextureData {
    let mut lookup: HashMap<[u8; 3], (u32, u32)> = HashMap::new();
    for y in 0..palette.height {
        for x in 0..palette.width {
            let [r, g, b, _] = palette.get_pixel(x, y);
            lookup.entry([r, g, b]).or_insert((x, y));
        }
    }

    let mut out = grayscale.clone();
    out.animation = None;
    for y in 0..grayscale.height {
        for x in 0..grayscale.width {
            let [r, g, b, a] = grayscale.get_pixel(x, y);
            if let Some(&(px, py)) = lookup.get(&[r, g, b]) {
                if px < color_palette.width && py < color_palette.height {
                    let [cr, cg, cb, _] = color_palette.get_pixel(px, py);
                    out.set_pixel(x, y, [cr, cg, cb, a]);
                }
            }
        }
    }
    out
}
