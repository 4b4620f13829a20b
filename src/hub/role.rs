//! Structural classification of nodes for hub traversal

use crate::config::HubConfig;
use crate::nodes::{HostGraph, Node, NodeId};
use serde_json::Value;

/// The part a node plays when tracing links through the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
    /// A pipe hub; traversal records it and stops
    Hub,
    /// Forwards its single input unchanged (reroutes and allow-listed classes)
    PassThrough,
    /// Publishes its input under a named key
    VirtualSet { key: String },
    /// Reads whatever the Set with the same key receives
    VirtualGet { key: String },
    /// Anything else; traversal stops here
    Plain,
}

/// Checks if the node is a pipe hub
pub fn is_hub(node: &Node, config: &HubConfig) -> bool {
    node.class_type == config.hub_class
}

/// Classifies a node. Pure; looks only at the node itself.
///
/// Checked in order Hub, PassThrough, VirtualGet, VirtualSet, Plain, so an
/// allow-listed class passes through whatever its slots and widgets.
pub fn classify(node: &Node, config: &HubConfig) -> NodeRole {
    if is_hub(node, config) {
        return NodeRole::Hub;
    }
    let one_in_one_out = node.inputs.len() == 1 && node.outputs.len() == 1;
    if one_in_one_out || config.pass_through_classes.contains(&node.class_type) {
        return NodeRole::PassThrough;
    }
    if let Some(key) = key_of(node, config) {
        if node.inputs.is_empty() && !node.outputs.is_empty() {
            return NodeRole::VirtualGet { key };
        }
        if !node.inputs.is_empty() {
            return NodeRole::VirtualSet { key };
        }
    }
    NodeRole::Plain
}

/// Index of the widget holding the node's key: the first whose name contains
/// one of the configured hints, else the first widget
pub fn key_widget_index(node: &Node, config: &HubConfig) -> Option<usize> {
    if node.widgets.is_empty() {
        return None;
    }
    let hinted = node.widgets.iter().position(|widget| {
        let name = widget.name.to_lowercase();
        config
            .key_widget_hints
            .iter()
            .any(|hint| name.contains(&hint.to_lowercase()))
    });
    Some(hinted.unwrap_or(0))
}

/// The node's Set/Get key, normalized so equal values compare equal
pub fn key_of(node: &Node, config: &HubConfig) -> Option<String> {
    let index = key_widget_index(node, config)?;
    Some(normalize_key(&node.widgets[index].value))
}

/// Canonical string form of a key value.
///
/// A missing value counts as the empty string.
pub fn normalize_key(value: &Value) -> String {
    if value.is_null() {
        return "\"\"".to_string();
    }
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Every non-hub node with an input that publishes under `key`.
///
/// Matches on shape rather than role, so a Set that also has an output
/// (and therefore classifies as pass-through) still answers for its key.
pub fn find_sets_by_key<G: HostGraph + ?Sized>(graph: &G, config: &HubConfig, key: &str) -> Vec<NodeId> {
    graph.nodes_where(&|node| {
        !is_hub(node, config)
            && !node.inputs.is_empty()
            && key_of(node, config).as_deref() == Some(key)
    })
}

/// Every Get node reading `key`
pub fn find_gets_by_key<G: HostGraph + ?Sized>(graph: &G, config: &HubConfig, key: &str) -> Vec<NodeId> {
    graph.nodes_where(&|node| {
        matches!(classify(node, config), NodeRole::VirtualGet { key: ref k } if k.as_str() == key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{factory, NodeGraph, Widget};
    use serde_json::json;

    #[test]
    fn test_classify_basic_shapes() {
        let config = HubConfig::default();
        assert_eq!(classify(&factory::pipe_hub(), &config), NodeRole::Hub);
        assert_eq!(classify(&factory::reroute(), &config), NodeRole::PassThrough);
        assert_eq!(
            classify(&factory::set_node("K"), &config),
            NodeRole::VirtualSet { key: "\"K\"".to_string() }
        );
        assert_eq!(
            classify(&factory::get_node("K"), &config),
            NodeRole::VirtualGet { key: "\"K\"".to_string() }
        );
        let source = factory::source("CheckpointLoader", &[("MODEL", "MODEL"), ("CLIP", "CLIP")]);
        assert_eq!(classify(&source, &config), NodeRole::Plain);
    }

    #[test]
    fn test_allow_listed_class_is_pass_through() {
        let config = HubConfig::default();
        let mut node = crate::nodes::Node::new("Reroute");
        node.add_input("a", "*").add_input("b", "*").add_output("x", "*");
        assert_eq!(classify(&node, &config), NodeRole::PassThrough);
    }

    #[test]
    fn test_allow_list_wins_over_get_shape() {
        let config = HubConfig::default();
        let mut node = crate::nodes::Node::new("Reroute");
        node.add_output("", "*").add_widget(Widget::new("name", "bus"));
        assert_eq!(classify(&node, &config), NodeRole::PassThrough);

        let mut graph = NodeGraph::new();
        graph.add_node(node);
        assert!(find_gets_by_key(&graph, &config, "\"bus\"").is_empty());
    }

    #[test]
    fn test_key_widget_prefers_hinted_name() {
        let config = HubConfig::default();
        let mut node = factory::get_node("ignored");
        node.widgets.insert(0, Widget::new("color", "red"));
        node.widgets[1] = Widget::new("Variable Name", "latent");
        assert_eq!(key_widget_index(&node, &config), Some(1));
        assert_eq!(key_of(&node, &config).as_deref(), Some("\"latent\""));
    }

    #[test]
    fn test_key_falls_back_to_first_widget() {
        let config = HubConfig::default();
        let mut node = crate::nodes::Node::new("Custom");
        node.add_output("v", "*");
        node.add_widget(Widget::new("slot", 3));
        assert_eq!(classify(&node, &config), NodeRole::VirtualGet { key: "3".to_string() });
    }

    #[test]
    fn test_normalize_key_is_structural() {
        assert_eq!(normalize_key(&json!({"b": 1, "a": 2})), normalize_key(&json!({"a": 2, "b": 1})));
        assert_ne!(normalize_key(&json!("1")), normalize_key(&json!(1)));
        assert_eq!(normalize_key(&Value::Null), normalize_key(&json!("")));
    }

    #[test]
    fn test_find_by_key() {
        let config = HubConfig::default();
        let mut graph = NodeGraph::new();
        let set_a = graph.add_node(factory::set_node("A"));
        let _set_b = graph.add_node(factory::set_node("B"));
        let get_a1 = graph.add_node(factory::get_node("A"));
        let get_a2 = graph.add_node(factory::get_node("A"));
        let key = normalize_key(&json!("A"));

        assert_eq!(find_sets_by_key(&graph, &config, &key), vec![set_a]);
        assert_eq!(find_gets_by_key(&graph, &config, &key), vec![get_a1, get_a2]);
    }
}
