//! Execution-side routing of values through a hub
//!
//! Each pair forwards its local input when one is present and otherwise the
//! value carried for that pair by the incoming pipe.

use serde_json::Value;
use std::collections::BTreeMap;

/// Values a hub emits for one execution
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutput {
    /// Outgoing pipe, always an ordered list with one entry per pair
    pub pipe: Value,
    /// `out1..outMAX`, `Null` where nothing flows
    pub outs: Vec<Value>,
}

/// Value the incoming pipe carries for pair `k`.
///
/// Accepts the ordered list form (pair K at index K-1) and the mapping form
/// keyed `slotK`.
pub fn inherit_get(pipe: Option<&Value>, k: usize) -> Option<&Value> {
    if k == 0 {
        return None;
    }
    let value = match pipe? {
        Value::Array(items) => items.get(k - 1),
        Value::Object(map) => map.get(&format!("slot{}", k)),
        _ => None,
    }?;
    (!value.is_null()).then_some(value)
}

/// Routes local inputs (keyed by pair index) and the incoming pipe
pub fn route(pipe_in: Option<&Value>, inputs: &BTreeMap<usize, Value>, max_pairs: usize) -> RouteOutput {
    let outs: Vec<Value> = (1..=max_pairs)
        .map(|k| {
            inputs
                .get(&k)
                .filter(|v| !v.is_null())
                .or_else(|| inherit_get(pipe_in, k))
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect();

    RouteOutput {
        pipe: Value::Array(outs.clone()),
        outs,
    }
}
