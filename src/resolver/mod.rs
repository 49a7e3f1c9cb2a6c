//! Block state and model resolution.
//!
//! This module handles resolving block states to concrete model variants
//! and resolving model inheritance chains.

pub mod model_resolver;
pub mod multipart;
pub mod state_resolver;

pub use model_resolver::{bake, merge, resolve_texture_ref, ModelResolver, MAX_TEXTURE_DEPTH};
pub use state_resolver::StateResolver;

use crate::error::Result;
use crate::resource_pack::Model;
use crate::types::{BlockState, BlockTransform};
use rand::Rng;

/// A baked model plus the blockstate rotation it is drawn with.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub model: Model,
    pub transform: BlockTransform,
}

/// Resolve a block state to its baked models. Structures pass
/// `delete_parent_elements = true`.
pub fn resolve_block<R: Rng + ?Sized>(
    models: &ModelResolver<'_>,
    state: &BlockState,
    delete_parent_elements: bool,
    rng: &mut R,
) -> Result<Vec<ResolvedModel>> {
    let variants = StateResolver::new(models.pack()).resolve(state, rng)?;

    variants
        .into_iter()
        .map(|variant| {
            Ok(ResolvedModel {
                model: models.resolve_with(&variant.model, delete_parent_elements)?,
                transform: BlockTransform::new(variant.x, variant.y),
            })
        })
        .collect()
}
