//! Data-driven item stacks and their default components.

use crate::error::{RenderError, Result};
use crate::types::NamespacedKey;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Marker component set once defaults have been merged.
pub const RESOLVED_MARKER: &str = "__resolved__";

/// Stack size used when neither the item nor the catalog specifies one.
pub const DEFAULT_MAX_STACK_SIZE: u32 = 64;

fn normalize_component(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}

/// An item stack: id, count and a sparse component map.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: NamespacedKey,
    pub count: u32,
    /// Merged components (user-supplied plus defaults after `fill`).
    pub components: Map<String, Value>,
    /// Names of components supplied by the caller.
    user_components: HashSet<String>,
}

impl Item {
    pub fn new(id: impl Into<NamespacedKey>) -> Self {
        Self {
            id: id.into(),
            count: 1,
            components: Map::new(),
            user_components: HashSet::new(),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Add a user-supplied component. `minecraft:` prefixes are dropped.
    pub fn with_component(mut self, name: &str, value: Value) -> Self {
        self.set_component(name, value);
        self
    }

    pub fn set_component(&mut self, name: &str, value: Value) {
        let name = normalize_component(name).to_string();
        self.user_components.insert(name.clone());
        self.components.insert(name, value);
    }

    /// Build an item from a JSON object of components.
    pub fn from_components(id: impl Into<NamespacedKey>, components: &Value) -> Result<Self> {
        let mut item = Item::new(id);
        match components {
            Value::Null => {}
            Value::Object(map) => {
                for (k, v) in map {
                    item.set_component(k, v.clone());
                }
            }
            other => {
                return Err(RenderError::schema(
                    "components",
                    format!("expected an object, got {}", other),
                ))
            }
        }
        Ok(item)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.components.get(normalize_component(name))
    }

    /// Presence check. With `ignore_default` only user-supplied components count.
    pub fn has_component(&self, name: &str, ignore_default: bool) -> bool {
        let name = normalize_component(name);
        if ignore_default {
            self.user_components.contains(name)
        } else {
            self.components.contains_key(name)
        }
    }

    pub fn is_filled(&self) -> bool {
        self.components.contains_key(RESOLVED_MARKER)
    }

    /// Merge default components from the catalog unless already done.
    pub fn fill(&mut self, catalog: &ItemCatalog) {
        if self.is_filled() {
            return;
        }
        if let Some(defaults) = catalog.defaults(&self.id) {
            for (k, v) in defaults {
                self.components
                    .entry(normalize_component(k).to_string())
                    .or_insert_with(|| v.clone());
            }
        }
        self.components
            .insert(RESOLVED_MARKER.to_string(), Value::Bool(true));
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn damage(&self) -> f64 {
        self.number("damage").unwrap_or(0.0)
    }

    pub fn max_damage(&self) -> Option<f64> {
        self.number("max_damage")
    }

    pub fn max_stack_size(&self) -> u32 {
        self.number("max_stack_size")
            .map(|n| n.max(1.0) as u32)
            .unwrap_or(DEFAULT_MAX_STACK_SIZE)
    }

    /// One list of `custom_model_data` (`flags`, `strings`, `floats`, `colors`).
    pub fn custom_model_data(&self, list: &str) -> Option<&Vec<Value>> {
        self.get("custom_model_data")
            .and_then(|cmd| cmd.get(list))
            .and_then(Value::as_array)
    }
}

/// Default components per item id, as shipped with a game release.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    defaults: HashMap<NamespacedKey, Map<String, Value>>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "<item id>": { "<component>": value, ... }, ... }`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| RenderError::schema("item catalog", "expected an object"))?;
        let mut catalog = Self::new();
        for (id, components) in obj {
            let components = components.as_object().ok_or_else(|| {
                RenderError::schema("item catalog", format!("components of {} must be an object", id))
            })?;
            catalog.insert(id.as_str(), components.clone());
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        Self::from_json(&value)
            .map_err(|e| RenderError::schema(path.display().to_string(), e))
    }

    pub fn insert(&mut self, id: impl Into<NamespacedKey>, components: Map<String, Value>) {
        self.defaults.insert(id.into(), components);
    }

    pub fn defaults(&self, id: &NamespacedKey) -> Option<&Map<String, Value>> {
        self.defaults.get(id)
    }

    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_json(&json!({
            "minecraft:diamond_pickaxe": { "minecraft:max_damage": 1561, "max_stack_size": 1, "damage": 0 }
        }))
        .unwrap()
    }

    #[test]
    fn test_fill_merges_defaults_once() {
        let mut item = Item::new("diamond_pickaxe").with_component("minecraft:damage", json!(5));
        item.fill(&catalog());
        assert_eq!(item.max_damage(), Some(1561.0));
        assert_eq!(item.damage(), 5.0);
        assert_eq!(item.max_stack_size(), 1);
        assert!(item.is_filled());

        item.components.remove("max_damage");
        item.fill(&catalog());
        assert_eq!(item.max_damage(), None);
    }

    #[test]
    fn test_has_component_ignore_default() {
        let mut item = Item::new("diamond_pickaxe").with_component("damage", json!(1));
        item.fill(&catalog());
        assert!(item.has_component("max_damage", false));
        assert!(!item.has_component("max_damage", true));
        assert!(item.has_component("minecraft:damage", true));
    }

    #[test]
    fn test_unknown_components_preserved() {
        let item = Item::from_components("stick", &json!({ "mymod:glow": { "level": 3 } })).unwrap();
        assert_eq!(item.get("mymod:glow"), Some(&json!({ "level": 3 })));
        assert_eq!(item.max_stack_size(), DEFAULT_MAX_STACK_SIZE);
    }

    #[test]
    fn test_custom_model_data_lists() {
        let item = Item::new("stick").with_component(
            "custom_model_data",
            json!({ "flags": [true], "floats": [0.5] }),
        );
        assert_eq!(item.custom_model_data("flags").map(Vec::len), Some(1));
        assert!(item.custom_model_data("strings").is_none());
    }
}
