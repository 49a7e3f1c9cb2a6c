//! Namespaced resource keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Namespace used when a key carries none.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A normalized `<namespace>:<path>` resource location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedKey {
    namespace: String,
    path: String,
}

impl NamespacedKey {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// Parse a key, defaulting the namespace to `minecraft`.
    /// "block/stone" -> minecraft:block/stone
    pub fn parse(key: &str) -> Self {
        match key.split_once(':') {
            Some((namespace, path)) if !namespace.is_empty() => Self::new(namespace, path),
            Some((_, path)) => Self::new(DEFAULT_NAMESPACE, path),
            None => Self::new(DEFAULT_NAMESPACE, key),
        }
    }

    pub fn minecraft(path: impl Into<String>) -> Self {
        Self::new(DEFAULT_NAMESPACE, path)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Same namespace, new path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self::new(self.namespace.clone(), path)
    }

    /// Prefix the path with a directory, e.g. `item/` for item models.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        if self.path.starts_with(prefix) {
            self.clone()
        } else {
            self.with_path(format!("{}{}", prefix, self.path))
        }
    }

    /// Last path segment ("block/oak_log" -> "oak_log").
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl From<&str> for NamespacedKey {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for NamespacedKey {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl Serialize for NamespacedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NamespacedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Normalize a namespaced tag string, accepting both `foo` and `minecraft:foo`.
pub fn normalize_tag(tag: &str) -> String {
    NamespacedKey::parse(tag).to_string()
}
