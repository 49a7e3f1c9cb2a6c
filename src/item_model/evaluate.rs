//! Item model tree evaluation.

use super::node::{ItemDefinition, ItemModelNode};
use super::properties;
use super::special::SpecialModelFactory;
use crate::error::Result;
use crate::item::Item;
use crate::mesher::TintSource;
use crate::resolver::ModelResolver;
use crate::resource_pack::{AssetKind, Model};
use crate::types::NamespacedKey;
use serde_json::Value;

/// A baked model to draw plus the tint sources its faces index into.
#[derive(Debug, Clone)]
pub struct ResolvedLayer {
    pub model: Model,
    pub tints: Vec<TintSource>,
}

/// Reduces item model trees to flat lists of layers for a given item.
pub struct ItemModelEvaluator<'a> {
    models: &'a ModelResolver<'a>,
    specials: SpecialModelFactory<'a>,
}

impl<'a> ItemModelEvaluator<'a> {
    pub fn new(models: &'a ModelResolver<'a>) -> Self {
        Self {
            models,
            specials: SpecialModelFactory::new(),
        }
    }

    pub fn with_specials(mut self, specials: SpecialModelFactory<'a>) -> Self {
        self.specials = specials;
        self
    }

    /// Key of the item definition to use: the `item_model` component if
    /// present, otherwise the item id.
    pub fn definition_key(item: &Item) -> NamespacedKey {
        item.get("item_model")
            .and_then(Value::as_str)
            .map(NamespacedKey::parse)
            .unwrap_or_else(|| item.id.clone())
    }

    /// Look up and evaluate the item's definition.
    pub fn evaluate_item(&self, item: &Item) -> Result<Vec<ResolvedLayer>> {
        let key = Self::definition_key(item);
        let raw = self.models.pack().require_item_definition(&key)?;
        let definition = ItemDefinition::parse(raw, &AssetKind::ItemDefinition.file_path(&key))?;
        self.evaluate(&definition.model, item)
    }

    pub fn evaluate(&self, node: &ItemModelNode, item: &Item) -> Result<Vec<ResolvedLayer>> {
        let mut layers = Vec::new();
        self.collect(node, item, &mut layers)?;
        Ok(layers)
    }

    fn collect(&self, node: &ItemModelNode, item: &Item, out: &mut Vec<ResolvedLayer>) -> Result<()> {
        match node {
            ItemModelNode::Model { model, tints } => {
                out.push(ResolvedLayer {
                    model: self.models.resolve(model)?,
                    tints: tints.clone(),
                });
            }
            ItemModelNode::Composite(children) => {
                for child in children {
                    self.collect(child, item, out)?;
                }
            }
            ItemModelNode::Condition {
                property,
                on_true,
                on_false,
            } => {
                let branch = if properties::condition(property, item) {
                    on_true
                } else {
                    on_false
                };
                self.collect(branch, item, out)?;
            }
            ItemModelNode::Select {
                property,
                cases,
                fallback,
            } => {
                let chosen = properties::select(property, item).and_then(|value| {
                    cases.iter().find(|case| {
                        case.when
                            .iter()
                            .any(|w| properties::select_matches(property, w, &value))
                    })
                });
                match (chosen, fallback) {
                    (Some(case), _) => self.collect(&case.model, item, out)?,
                    (None, Some(fallback)) => self.collect(fallback, item, out)?,
                    (None, None) => {}
                }
            }
            ItemModelNode::RangeDispatch {
                property,
                entries,
                fallback,
                scale,
            } => {
                let value = properties::range(property, item) * scale;
                let chosen = entries.iter().rev().find(|e| e.threshold <= value);
                match (chosen, fallback) {
                    (Some(entry), _) => self.collect(&entry.model, item, out)?,
                    (None, Some(fallback)) => self.collect(fallback, item, out)?,
                    (None, None) => {}
                }
            }
            ItemModelNode::BundleSelectedItem | ItemModelNode::Empty => {}
            ItemModelNode::Special { base, spec } => {
                let model = self.specials.build(spec, item)?.with_parent(base.clone());
                out.push(ResolvedLayer {
                    model: self.models.resolve_model(model, false)?,
                    tints: Vec::new(),
                });
            }
        }
        Ok(())
    }
}
