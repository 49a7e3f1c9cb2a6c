//! Item model definitions (`assets/<ns>/items/*.json`).
//!
//! An item definition is a tree of selector nodes over item components.
//! Evaluating it against an item yields the baked models to draw, in order,
//! each with the tint sources its faces refer to.

pub mod evaluate;
pub mod node;
pub mod properties;
pub mod special;

pub use evaluate::{ItemModelEvaluator, ResolvedLayer};
pub use node::{ItemDefinition, ItemModelNode, PropertyRef, RangeEntry, SelectCase};
pub use special::{SpecialModelFactory, SpecialModelSpec};
