//! Blockstate definition parsing.
//!
//! Blockstates map block properties to model variants, either through a
//! `variants` table or a list of conditional `multipart` cases.

use crate::types::NamespacedKey;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// A blockstate definition from blockstates/*.json.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockstateDefinition {
    /// Property combinations (`"facing=east,lit=true"`) to weighted variants.
    Variants(HashMap<String, Vec<ModelVariant>>),
    /// Conditional parts, all matching ones are drawn.
    Multipart(Vec<MultipartCase>),
}

impl<'de> Deserialize<'de> for BlockstateDefinition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawBlockstate {
            variants: Option<HashMap<String, OneOrMany>>,
            multipart: Option<Vec<MultipartCase>>,
        }

        let raw = RawBlockstate::deserialize(deserializer)?;

        if let Some(variants) = raw.variants {
            Ok(BlockstateDefinition::Variants(
                variants
                    .into_iter()
                    .map(|(k, v)| (k, v.into_vec()))
                    .collect(),
            ))
        } else if let Some(multipart) = raw.multipart {
            Ok(BlockstateDefinition::Multipart(multipart))
        } else {
            Err(serde::de::Error::custom(
                "blockstate needs either `variants` or `multipart`",
            ))
        }
    }
}

/// A single variant or a weighted list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(ModelVariant),
    Many(Vec<ModelVariant>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<ModelVariant> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }

    pub fn as_slice(&self) -> &[ModelVariant] {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v),
            OneOrMany::Many(v) => v,
        }
    }
}

/// A model reference with optional rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariant {
    pub model: NamespacedKey,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    /// Read for completeness only. GUI renders draw rotated blocks with
    /// their face UVs as authored.
    #[serde(default)]
    pub uvlock: bool,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl ModelVariant {
    pub fn new(model: impl Into<NamespacedKey>) -> Self {
        Self {
            model: model.into(),
            x: 0,
            y: 0,
            uvlock: false,
            weight: 1,
        }
    }
}

/// A multipart case with optional condition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MultipartCase {
    #[serde(default)]
    pub when: Option<MultipartCondition>,
    pub apply: OneOrMany,
}

/// Condition of a multipart case.
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartCondition {
    Or(Vec<MultipartCondition>),
    And(Vec<MultipartCondition>),
    /// Every listed property must hold one of its `|`-separated values.
    Leaf(HashMap<String, String>),
}

impl<'de> Deserialize<'de> for MultipartCondition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        MultipartCondition::from_value(&value).map_err(serde::de::Error::custom)
    }
}

impl MultipartCondition {
    fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("condition must be an object, got {}", value))?;

        for (tag, is_or) in [("OR", true), ("AND", false)] {
            if let Some(list) = obj.get(tag) {
                let items = list
                    .as_array()
                    .ok_or_else(|| format!("{} must be an array", tag))?
                    .iter()
                    .map(Self::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(if is_or {
                    MultipartCondition::Or(items)
                } else {
                    MultipartCondition::And(items)
                });
            }
        }

        let leaf = obj
            .iter()
            .map(|(k, v)| {
                let s = match v {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Number(n) => n.to_string(),
                    other => return Err(format!("bad value for `{}`: {}", k, other)),
                };
                Ok((k.clone(), s))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(MultipartCondition::Leaf(leaf))
    }

    /// Check the condition against block properties.
    pub fn matches(&self, properties: &HashMap<String, String>) -> bool {
        match self {
            MultipartCondition::Or(items) => items.iter().any(|c| c.matches(properties)),
            MultipartCondition::And(items) => items.iter().all(|c| c.matches(properties)),
            MultipartCondition::Leaf(cond) => cond.iter().all(|(key, expected)| {
                properties
                    .get(key)
                    .map(|actual| expected.split('|').any(|v| v == actual))
                    .unwrap_or(false)
            }),
        }
    }
}

/// Parse a variant key into property pairs.
/// "facing=north,half=bottom" -> [("facing","north"), ("half","bottom")]
pub fn parse_variant_key(key: &str) -> Vec<(&str, &str)> {
    key.split(',')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .collect()
}

/// A variant key matches when every property it names has that value.
pub fn variant_key_matches(key: &str, properties: &HashMap<String, String>) -> bool {
    parse_variant_key(key)
        .into_iter()
        .all(|(k, v)| properties.get(k).map(|p| p == v).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_weighted_variants() {
        let json = r#"{
            "variants": {
                "": [
                    { "model": "block/stone", "weight": 10 },
                    { "model": "block/stone_mirrored", "y": 180 }
                ]
            }
        }"#;

        let def: BlockstateDefinition = serde_json::from_str(json).unwrap();
        match def {
            BlockstateDefinition::Variants(variants) => {
                let list = &variants[""];
                assert_eq!(list.len(), 2);
                assert_eq!(list[0].weight, 10);
                assert_eq!(list[1].weight, 1);
                assert_eq!(list[1].y, 180);
                assert_eq!(list[0].model.to_string(), "minecraft:block/stone");
            }
            _ => panic!("Expected Variants"),
        }
    }

    #[test]
    fn test_parse_multipart() {
        let json = r#"{
            "multipart": [
                { "apply": { "model": "block/fence_post" } },
                { "when": { "north": "true" }, "apply": { "model": "block/fence_side", "uvlock": true } }
            ]
        }"#;

        let def: BlockstateDefinition = serde_json::from_str(json).unwrap();
        match def {
            BlockstateDefinition::Multipart(cases) => {
                assert_eq!(cases.len(), 2);
                assert!(cases[0].when.is_none());
                assert!(cases[1].apply.as_slice()[0].uvlock);
            }
            _ => panic!("Expected Multipart"),
        }
    }

    #[test]
    fn test_empty_blockstate_rejected() {
        assert!(serde_json::from_str::<BlockstateDefinition>("{}").is_err());
    }

    #[test]
    fn test_condition_pipe_values() {
        let cond: MultipartCondition =
            serde_json::from_str(r#"{ "facing": "north|south" }"#).unwrap();
        assert!(cond.matches(&props(&[("facing", "north")])));
        assert!(cond.matches(&props(&[("facing", "south")])));
        assert!(!cond.matches(&props(&[("facing", "east")])));
        assert!(!cond.matches(&props(&[])));
    }

    #[test]
    fn test_condition_or_and() {
        let or: MultipartCondition =
            serde_json::from_str(r#"{ "OR": [{ "north": "true" }, { "south": true }] }"#).unwrap();
        assert!(or.matches(&props(&[("south", "true")])));
        assert!(!or.matches(&props(&[("east", "true")])));

        let and: MultipartCondition =
            serde_json::from_str(r#"{ "AND": [{ "north": "true" }, { "south": "true" }] }"#)
                .unwrap();
        assert!(and.matches(&props(&[("north", "true"), ("south", "true")])));
        assert!(!and.matches(&props(&[("north", "true")])));
    }

    #[test]
    fn test_variant_key_matches_subset() {
        let p = props(&[("facing", "east"), ("lit", "false")]);
        assert!(variant_key_matches("facing=east", &p));
        assert!(variant_key_matches("facing=east,lit=false", &p));
        assert!(variant_key_matches("", &p));
        assert!(!variant_key_matches("facing=west", &p));
    }
}
