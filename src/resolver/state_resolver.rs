//! Block state to model variant resolution.

use super::multipart::resolve_multipart;
use crate::error::{RenderError, Result};
use crate::resource_pack::blockstate::variant_key_matches;
use crate::resource_pack::{BlockstateDefinition, ModelVariant, ResourcePack};
use crate::types::BlockState;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Resolves block states to model variants.
pub struct StateResolver<'a> {
    pack: &'a ResourcePack,
}

impl<'a> StateResolver<'a> {
    pub fn new(pack: &'a ResourcePack) -> Self {
        Self { pack }
    }

    /// Resolve a block state to the variants to draw. Weighted lists are
    /// sampled with `rng`.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        state: &BlockState,
        rng: &mut R,
    ) -> Result<Vec<ModelVariant>> {
        let blockstate = self.pack.require_blockstate(&state.name)?;

        match blockstate {
            BlockstateDefinition::Variants(variants) => {
                let list = find_variant(variants, state)?;
                Ok(choose_weighted(list, rng).into_iter().collect())
            }
            BlockstateDefinition::Multipart(cases) => {
                Ok(resolve_multipart(cases, &state.properties, rng))
            }
        }
    }
}

/// Find the variant list whose key matches the state. Keys are tried in
/// sorted order, so the result is deterministic.
fn find_variant<'b>(
    variants: &'b HashMap<String, Vec<ModelVariant>>,
    state: &BlockState,
) -> Result<&'b [ModelVariant]> {
    let mut keys: Vec<&String> = variants.keys().collect();
    keys.sort();

    keys.into_iter()
        .find(|key| variant_key_matches(key, &state.properties))
        .and_then(|key| variants.get(key))
        .map(Vec::as_slice)
        .ok_or_else(|| {
            let mut props: Vec<String> = state
                .properties
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            props.sort();
            RenderError::not_found(
                "blockstate variant",
                format!("{}[{}]", state.name, props.join(",")),
            )
        })
}

/// Pick one variant by weight. A list of zero total weight yields its first entry.
pub fn choose_weighted<R: Rng + ?Sized>(
    list: &[ModelVariant],
    rng: &mut R,
) -> Option<ModelVariant> {
    if list.len() <= 1 {
        return list.first().cloned();
    }
    list.choose_weighted(rng, |v| v.weight)
        .ok()
        .or_else(|| list.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pack() -> ResourcePack {
        let mut pack = ResourcePack::new();
        let furnace: BlockstateDefinition = serde_json::from_str(
            r#"{
                "variants": {
                    "facing=east,lit=false": { "model": "block/furnace", "y": 90 },
                    "facing=east,lit=true": { "model": "block/furnace_on", "y": 90 },
                    "facing=north,lit=false": { "model": "block/furnace" }
                }
            }"#,
        )
        .unwrap();
        pack.add_blockstate("furnace", furnace);
        let stone: BlockstateDefinition = serde_json::from_str(
            r#"{ "variants": { "": [
                { "model": "block/stone", "weight": 3 },
                { "model": "block/stone_mirrored", "weight": 1 }
            ] } }"#,
        )
        .unwrap();
        pack.add_blockstate("stone", stone);
        pack
    }

    #[test]
    fn test_resolve_variant_by_properties() {
        let pack = pack();
        let resolver = StateResolver::new(&pack);
        let mut rng = StdRng::seed_from_u64(1);

        let state = BlockState::new("furnace")
            .with_property("facing", "east")
            .with_property("lit", "true");
        let variants = resolver.resolve(&state, &mut rng).unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].model.to_string(), "minecraft:block/furnace_on");
        assert_eq!(variants[0].y, 90);
    }

    #[test]
    fn test_missing_blockstate_and_variant() {
        let pack = pack();
        let resolver = StateResolver::new(&pack);
        let mut rng = StdRng::seed_from_u64(1);

        let err = resolver.resolve(&BlockState::new("dirt"), &mut rng).unwrap_err();
        assert_eq!(err.kind(), "AssetNotFound");

        let state = BlockState::new("furnace").with_property("facing", "up");
        assert!(resolver.resolve(&state, &mut rng).is_err());
    }

    #[test]
    fn test_weighted_choice_is_seedable() {
        let pack = pack();
        let resolver = StateResolver::new(&pack);
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            resolver.resolve(&BlockState::new("stone"), &mut rng).unwrap()[0]
                .model
                .clone()
        };
        assert_eq!(pick(42), pick(42));

        let mut rng = StdRng::seed_from_u64(7);
        let mirrored = (0..400)
            .filter(|_| {
                resolver.resolve(&BlockState::new("stone"), &mut rng).unwrap()[0]
                    .model
                    .path()
                    .ends_with("mirrored")
            })
            .count();
        assert!(mirrored > 40 && mirrored < 180, "got {}", mirrored);
    }
}
