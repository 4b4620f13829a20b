//! Node templates for the shapes the hub engine reasons about
//!
//! These mirror the node definitions an editor registers: the pipe hub
//! itself, reroutes, Set/Get nodes sharing a named key, and plain producers.

use super::node::{Node, Widget};
use crate::constants::hub;
use serde_json::Value;

/// Creates a pipe hub with its two default pairs
pub fn pipe_hub() -> Node {
    let mut node = Node::new(hub::CLASS_TYPE).with_title(hub::TITLE);
    node.add_input(hub::PIPE_IN, hub::PIPE_TYPE)
        .add_input(pair_input_name(1), hub::ANY_TYPE)
        .add_input(pair_input_name(2), hub::ANY_TYPE)
        .add_output(hub::PIPE_OUT, hub::PIPE_TYPE)
        .add_output(pair_output_name(1), hub::ANY_TYPE)
        .add_output(pair_output_name(2), hub::ANY_TYPE)
        .add_widget(Widget::new(hub::FIX_BUTTON, Value::Null));
    node.size = node.compute_size();
    node
}

/// Creates a reroute: one input, one output, no widgets
pub fn reroute() -> Node {
    let mut node = Node::new("Reroute");
    node.add_input("", hub::ANY_TYPE).add_output("", hub::ANY_TYPE);
    node
}

/// Creates a Set node publishing its input under `key`
pub fn set_node(key: impl Into<Value>) -> Node {
    let mut node = Node::new("SetNode");
    node.add_input("value", hub::ANY_TYPE)
        .add_widget(Widget::new("Constant", key));
    node
}

/// Creates a Get node reading whatever the Set with the same key receives
pub fn get_node(key: impl Into<Value>) -> Node {
    let mut node = Node::new("GetNode");
    node.add_output("value", hub::ANY_TYPE)
        .add_widget(Widget::new("Constant", key));
    node
}

/// Creates a producer node with one output per `(name, type)` pair
pub fn source(class_type: &str, outputs: &[(&str, &str)]) -> Node {
    let mut node = Node::new(class_type);
    for (name, slot_type) in outputs {
        node.add_output(*name, *slot_type);
    }
    node
}

/// Name of pair `k`'s input slot
pub fn pair_input_name(k: usize) -> String {
    format!("{}{}", hub::PAIR_INPUT_PREFIX, k)
}

/// Name of pair `k`'s output slot
pub fn pair_output_name(k: usize) -> String {
    format!("{}{}", hub::PAIR_OUTPUT_PREFIX, k)
}
