//! Item model definition tree.
//!
//! Nodes are tagged by `type`; both `name` and `minecraft:name` are accepted
//! as tags and as property names. Property arguments other than the ones a
//! node needs structurally are kept in `args` so a parsed tree serializes
//! back to the same shape.

use super::special::SpecialModelSpec;
use crate::error::{RenderError, Result};
use crate::mesher::TintSource;
use crate::types::NamespacedKey;
use serde_json::{json, Map, Value};

/// Strip an optional `minecraft:` prefix from a tag.
pub(crate) fn short_tag(tag: &str) -> &str {
    tag.strip_prefix("minecraft:").unwrap_or(tag)
}

/// A property reference with its extra arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRef {
    /// Name without namespace, e.g. `damage`.
    pub name: String,
    pub args: Map<String, Value>,
}

impl PropertyRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: short_tag(name).to_string(),
            args: Map::new(),
        }
    }

    pub fn with_arg(mut self, key: &str, value: Value) -> Self {
        self.args.insert(key.to_string(), value);
        self
    }

    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(Value::as_str)
    }

    pub fn arg_bool(&self, key: &str, default: bool) -> bool {
        self.args.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn arg_index(&self) -> usize {
        self.args
            .get("index")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectCase {
    /// Accepted values; a single string is stored as a one-element list.
    pub when: Vec<String>,
    pub model: ItemModelNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeEntry {
    pub threshold: f32,
    pub model: ItemModelNode,
}

/// One node of an item model definition.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemModelNode {
    Model {
        model: NamespacedKey,
        tints: Vec<TintSource>,
    },
    Composite(Vec<ItemModelNode>),
    Condition {
        property: PropertyRef,
        on_true: Box<ItemModelNode>,
        on_false: Box<ItemModelNode>,
    },
    Select {
        property: PropertyRef,
        cases: Vec<SelectCase>,
        fallback: Option<Box<ItemModelNode>>,
    },
    RangeDispatch {
        property: PropertyRef,
        /// Ascending by threshold.
        entries: Vec<RangeEntry>,
        fallback: Option<Box<ItemModelNode>>,
        scale: f32,
    },
    BundleSelectedItem,
    Special {
        base: NamespacedKey,
        spec: SpecialModelSpec,
    },
    Empty,
}

const CONDITION_FIELDS: &[&str] = &["type", "property", "on_true", "on_false"];
const SELECT_FIELDS: &[&str] = &["type", "property", "cases", "fallback"];
const RANGE_FIELDS: &[&str] = &["type", "property", "entries", "fallback", "scale"];

fn field<'v>(obj: &'v Map<String, Value>, name: &str, path: &str) -> Result<&'v Value> {
    obj.get(name)
        .ok_or_else(|| RenderError::schema(path, format!("missing `{}`", name)))
}

fn property_ref(obj: &Map<String, Value>, structural: &[&str], path: &str) -> Result<PropertyRef> {
    let name = field(obj, "property", path)?
        .as_str()
        .ok_or_else(|| RenderError::schema(path, "`property` must be a string"))?;
    let mut property = PropertyRef::new(name);
    for (k, v) in obj {
        if !structural.contains(&k.as_str()) {
            property.args.insert(k.clone(), v.clone());
        }
    }
    Ok(property)
}

fn when_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().flat_map(when_values).collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    }
}

impl ItemModelNode {
    /// Parse a node. `path` names the definition file for error messages.
    pub fn parse(value: &Value, path: &str) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| RenderError::schema(path, "item model node must be an object"))?;
        let kind = field(obj, "type", path)?
            .as_str()
            .ok_or_else(|| RenderError::schema(path, "`type` must be a string"))?;

        let child = |name: &str| -> Result<Box<ItemModelNode>> {
            Ok(Box::new(ItemModelNode::parse(field(obj, name, path)?, path)?))
        };
        let optional_child = |name: &str| -> Result<Option<Box<ItemModelNode>>> {
            obj.get(name)
                .map(|v| ItemModelNode::parse(v, path).map(Box::new))
                .transpose()
        };

        Ok(match short_tag(kind) {
            "model" => {
                let model = field(obj, "model", path)?
                    .as_str()
                    .ok_or_else(|| RenderError::schema(path, "`model` must be a string"))?;
                let tints = match obj.get("tints") {
                    Some(Value::Array(tints)) => tints
                        .iter()
                        .map(TintSource::from_json)
                        .collect::<Result<Vec<_>>>()
                        .map_err(|e| RenderError::schema(path, e))?,
                    Some(_) => return Err(RenderError::schema(path, "`tints` must be a list")),
                    None => Vec::new(),
                };
                ItemModelNode::Model {
                    model: NamespacedKey::parse(model),
                    tints,
                }
            }
            "composite" => {
                let models = field(obj, "models", path)?
                    .as_array()
                    .ok_or_else(|| RenderError::schema(path, "`models` must be a list"))?;
                ItemModelNode::Composite(
                    models
                        .iter()
                        .map(|m| ItemModelNode::parse(m, path))
                        .collect::<Result<_>>()?,
                )
            }
            "condition" => ItemModelNode::Condition {
                property: property_ref(obj, CONDITION_FIELDS, path)?,
                on_true: child("on_true")?,
                on_false: child("on_false")?,
            },
            "select" => {
                let cases = field(obj, "cases", path)?
                    .as_array()
                    .ok_or_else(|| RenderError::schema(path, "`cases` must be a list"))?
                    .iter()
                    .map(|case| {
                        Ok(SelectCase {
                            when: when_values(field_of(case, "when", path)?),
                            model: ItemModelNode::parse(field_of(case, "model", path)?, path)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                ItemModelNode::Select {
                    property: property_ref(obj, SELECT_FIELDS, path)?,
                    cases,
                    fallback: optional_child("fallback")?,
                }
            }
            "range_dispatch" => {
                let mut entries = match obj.get("entries") {
                    Some(Value::Array(entries)) => entries
                        .iter()
                        .map(|entry| {
                            let threshold = field_of(entry, "threshold", path)?
                                .as_f64()
                                .ok_or_else(|| RenderError::schema(path, "`threshold` must be a number"))?;
                            Ok(RangeEntry {
                                threshold: threshold as f32,
                                model: ItemModelNode::parse(field_of(entry, "model", path)?, path)?,
                            })
                        })
                        .collect::<Result<Vec<_>>>()?,
                    Some(_) => return Err(RenderError::schema(path, "`entries` must be a list")),
                    None => Vec::new(),
                };
                entries.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
                ItemModelNode::RangeDispatch {
                    property: property_ref(obj, RANGE_FIELDS, path)?,
                    entries,
                    fallback: optional_child("fallback")?,
                    scale: obj.get("scale").and_then(Value::as_f64).unwrap_or(1.0) as f32,
                }
            }
            "bundle/selected_item" => ItemModelNode::BundleSelectedItem,
            "special" => {
                let base = field(obj, "base", path)?
                    .as_str()
                    .ok_or_else(|| RenderError::schema(path, "`base` must be a string"))?;
                ItemModelNode::Special {
                    base: NamespacedKey::parse(base),
                    spec: SpecialModelSpec::parse(field(obj, "model", path)?, path)?,
                }
            }
            "empty" => ItemModelNode::Empty,
            other => {
                return Err(RenderError::schema(
                    path,
                    format!("unknown item model type `{}`", other),
                ))
            }
        })
    }

    /// Serialize with namespaced tags.
    pub fn to_json(&self) -> Value {
        match self {
            ItemModelNode::Model { model, tints } => {
                let mut v = json!({ "type": "minecraft:model", "model": model.to_string() });
                if !tints.is_empty() {
                    v["tints"] = Value::Array(tints.iter().map(TintSource::to_json).collect());
                }
                v
            }
            ItemModelNode::Composite(models) => json!({
                "type": "minecraft:composite",
                "models": models.iter().map(ItemModelNode::to_json).collect::<Vec<_>>(),
            }),
            ItemModelNode::Condition {
                property,
                on_true,
                on_false,
            } => {
                let mut v = with_property("minecraft:condition", property);
                v["on_true"] = on_true.to_json();
                v["on_false"] = on_false.to_json();
                v
            }
            ItemModelNode::Select {
                property,
                cases,
                fallback,
            } => {
                let mut v = with_property("minecraft:select", property);
                v["cases"] = cases
                    .iter()
                    .map(|case| {
                        let when = match case.when.as_slice() {
                            [single] => json!(single),
                            many => json!(many),
                        };
                        json!({ "when": when, "model": case.model.to_json() })
                    })
                    .collect();
                if let Some(fallback) = fallback {
                    v["fallback"] = fallback.to_json();
                }
                v
            }
            ItemModelNode::RangeDispatch {
                property,
                entries,
                fallback,
                scale,
            } => {
                let mut v = with_property("minecraft:range_dispatch", property);
                v["entries"] = entries
                    .iter()
                    .map(|e| json!({ "threshold": e.threshold, "model": e.model.to_json() }))
                    .collect();
                if *scale != 1.0 {
                    v["scale"] = json!(scale);
                }
                if let Some(fallback) = fallback {
                    v["fallback"] = fallback.to_json();
                }
                v
            }
            ItemModelNode::BundleSelectedItem => json!({ "type": "minecraft:bundle/selected_item" }),
            ItemModelNode::Special { base, spec } => json!({
                "type": "minecraft:special",
                "base": base.to_string(),
                "model": spec.to_json(),
            }),
            ItemModelNode::Empty => json!({ "type": "minecraft:empty" }),
        }
    }
}

fn field_of<'v>(value: &'v Value, name: &str, path: &str) -> Result<&'v Value> {
    let obj = value
        .as_object()
        .ok_or_else(|| RenderError::schema(path, format!("expected an object with `{}`", name)))?;
    field(obj, name, path)
}

fn with_property(kind: &str, property: &PropertyRef) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), json!(kind));
    obj.insert("property".into(), json!(format!("minecraft:{}", property.name)));
    for (k, v) in &property.args {
        obj.insert(k.clone(), v.clone());
    }
    Value::Object(obj)
}

/// An item model definition file: `assets/<ns>/items/<id>.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDefinition {
    pub model: ItemModelNode,
}

impl ItemDefinition {
    pub fn parse(value: &Value, path: &str) -> Result<Self> {
        let model = value
            .get("model")
            .ok_or_else(|| RenderError::schema(path, "missing `model`"))?;
        Ok(Self {
            model: ItemModelNode::parse(model, path)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_short_and_namespaced_tags() {
        let short = ItemModelNode::parse(&json!({ "type": "model", "model": "item/stick" }), "t").unwrap();
        let long = ItemModelNode::parse(
            &json!({ "type": "minecraft:model", "model": "minecraft:item/stick" }),
            "t",
        )
        .unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn test_roundtrip_normalizes_namespaces() {
        let source = json!({
            "type": "select",
            "property": "block_state",
            "block_state_property": "honey_level",
            "cases": [
                { "when": "5", "model": { "type": "model", "model": "item/full" } },
                { "when": ["0", "1"], "model": { "type": "model", "model": "item/low" } }
            ],
            "fallback": {
                "type": "range_dispatch",
                "property": "custom_model_data",
                "index": 1,
                "scale": 2.0,
                "entries": [
                    { "threshold": 1.0, "model": { "type": "empty" } },
                    { "threshold": 0.0, "model": { "type": "bundle/selected_item" } }
                ]
            }
        });
        let node = ItemModelNode::parse(&source, "t").unwrap();
        let reparsed = ItemModelNode::parse(&node.to_json(), "t").unwrap();
        assert_eq!(node, reparsed);

        let ItemModelNode::Select { property, cases, fallback } = &node else {
            panic!("expected select");
        };
        assert_eq!(property.name, "block_state");
        assert_eq!(property.arg_str("block_state_property"), Some("honey_level"));
        assert_eq!(cases[1].when, vec!["0", "1"]);
        let Some(ItemModelNode::RangeDispatch { entries, .. }) = fallback.as_deref() else {
            panic!("expected range dispatch");
        };
        assert_eq!(entries[0].threshold, 0.0);
    }

    #[test]
    fn test_model_with_tints() {
        let node = ItemModelNode::parse(
            &json!({
                "type": "minecraft:model",
                "model": "item/leather_helmet",
                "tints": [{ "type": "minecraft:dye", "default": -6265536 }]
            }),
            "t",
        )
        .unwrap();
        let ItemModelNode::Model { tints, .. } = node else {
            panic!("expected model");
        };
        assert_eq!(tints.len(), 1);
    }

    #[test]
    fn test_errors_name_the_file() {
        let err = ItemModelNode::parse(&json!({ "type": "teleport" }), "items/x.json").unwrap_err();
        assert!(err.to_string().contains("items/x.json"));
        assert!(ItemDefinition::parse(&json!({}), "items/x.json").is_err());
    }
}
