//! Item properties read by condition, select and range dispatch nodes.
//!
//! Properties that depend on live game state resolve to fixed fallbacks:
//! conditions are false, selects use the fallback branch, ranges are 0.

use super::node::PropertyRef;
use crate::item::Item;
use crate::types::NamespacedKey;
use serde_json::Value;

/// Context the thumbnail is drawn in.
pub const DISPLAY_CONTEXT: &str = "gui";
/// Entity assumed to hold the item.
pub const HOLDER_TYPE: &str = "minecraft:player";

const FIREWORK_ROCKET: &str = "minecraft:firework_rocket";

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Null => false,
        _ => true,
    }
}

fn value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn condition(property: &PropertyRef, item: &Item) -> bool {
    match property.name.as_str() {
        "broken" => match item.max_damage() {
            Some(max) => max - item.damage() <= 1.0,
            None => false,
        },
        "damaged" => item.damage() > 0.0,
        "has_component" => match property.arg_str("component") {
            Some(component) => {
                item.has_component(component, property.arg_bool("ignore_default", false))
            }
            None => false,
        },
        "custom_model_data" => item
            .custom_model_data("flags")
            .and_then(|flags| flags.get(property.arg_index()))
            .map(truthy)
            .unwrap_or(false),
        other => {
            tracing::debug!("condition `{}` depends on game state, using false", other);
            false
        }
    }
}

/// Discriminator for a select node; `None` selects the fallback.
pub fn select(property: &PropertyRef, item: &Item) -> Option<String> {
    match property.name.as_str() {
        "charge_type" => Some(charge_type(item).to_string()),
        "trim_material" => item
            .get("trim")
            .and_then(|trim| trim.get("material"))
            .and_then(Value::as_str)
            .map(|m| NamespacedKey::parse(m).to_string()),
        "block_state" => {
            let name = property.arg_str("block_state_property")?;
            item.get("block_state")
                .and_then(|state| state.get(name))
                .map(value_string)
        }
        "display_context" => Some(DISPLAY_CONTEXT.to_string()),
        "custom_model_data" => item
            .custom_model_data("strings")
            .and_then(|strings| strings.get(property.arg_index()))
            .map(value_string),
        "holder_type" => Some(HOLDER_TYPE.to_string()),
        "component" => {
            let name = property.arg_str("component")?;
            item.get(name).map(value_string)
        }
        other => {
            tracing::debug!("select `{}` depends on game state, using fallback", other);
            None
        }
    }
}

/// Whether a select case value equals the discriminator. Key-valued
/// properties compare after namespace normalization.
pub fn select_matches(property: &PropertyRef, case: &str, value: &str) -> bool {
    match property.name.as_str() {
        "trim_material" | "holder_type" => NamespacedKey::parse(case).to_string() == value,
        _ => case == value,
    }
}

fn charge_type(item: &Item) -> &'static str {
    let projectiles = item
        .get("charged_projectiles")
        .or_else(|| item.get("charge_type"))
        .and_then(Value::as_array);
    let Some(projectiles) = projectiles else {
        return "none";
    };
    let is_rocket = |p: &Value| {
        let id = p.as_str().or_else(|| p.get("id").and_then(Value::as_str));
        id.map(|id| NamespacedKey::parse(id).to_string() == FIREWORK_ROCKET)
            .unwrap_or(false)
    };
    if projectiles.iter().any(is_rocket) {
        "rocket"
    } else if !projectiles.is_empty() {
        "arrow"
    } else {
        "none"
    }
}

/// Numeric value for a range dispatch node, before `scale`.
pub fn range(property: &PropertyRef, item: &Item) -> f32 {
    let normalize = property.arg_bool("normalize", true);
    match property.name.as_str() {
        "custom_model_data" => item
            .custom_model_data("floats")
            .and_then(|floats| floats.get(property.arg_index()))
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as f32,
        "damage" => {
            let damage = item.damage();
            match item.max_damage() {
                Some(max) if normalize && max > 0.0 => (damage / max).clamp(0.0, 1.0) as f32,
                Some(max) => damage.clamp(0.0, max) as f32,
                None if normalize => 0.0,
                None => damage.max(0.0) as f32,
            }
        }
        "count" => {
            let count = item.count as f32;
            if normalize {
                (count / item.max_stack_size() as f32).clamp(0.0, 1.0)
            } else {
                count
            }
        }
        other => {
            tracing::debug!("range `{}` depends on game state, using 0", other);
            0.0
        }
    }
}
