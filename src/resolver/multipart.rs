//! Multipart blockstate evaluation.

use super::state_resolver::choose_weighted;
use crate::resource_pack::{ModelVariant, MultipartCase};
use rand::Rng;
use std::collections::HashMap;

/// Collect one variant from every case whose condition holds, in file order.
pub fn resolve_multipart<R: Rng + ?Sized>(
    cases: &[MultipartCase],
    properties: &HashMap<String, String>,
    rng: &mut R,
) -> Vec<ModelVariant> {
    cases
        .iter()
        .filter(|case| {
            case.when
                .as_ref()
                .map(|cond| cond.matches(properties))
                .unwrap_or(true)
        })
        .filter_map(|case| choose_weighted(case.apply.as_slice(), rng))
        .collect()
}
