//! Shared types used throughout the library.

mod direction;
mod key;
mod transform;

pub use direction::{Axis, Direction};
pub use key::{normalize_tag, NamespacedKey, DEFAULT_NAMESPACE};
pub use transform::{BlockTransform, DisplayTransform, ElementRotation};

use std::collections::HashMap;

/// A block position inside a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPosition {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}

/// A block name plus its state properties, e.g. `minecraft:furnace[facing=east]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub name: NamespacedKey,
    pub properties: HashMap<String, String>,
}

impl BlockState {
    pub fn new(name: impl Into<NamespacedKey>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn is_air(&self) -> bool {
        self.name.namespace() == "minecraft"
            && matches!(self.name.path(), "air" | "cave_air" | "void_air")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_state_builder() {
        let state = BlockState::new("furnace").with_property("facing", "east");
        assert_eq!(state.name.to_string(), "minecraft:furnace");
        assert_eq!(state.properties.get("facing").map(String::as_str), Some("east"));
        assert!(!state.is_air());
        assert!(BlockState::new("minecraft:cave_air").is_air());
    }
}
