//! Backward resolution of a link to the output that really produces its value
//!
//! Pass-through nodes are followed through their first input, Get nodes jump
//! to the first connected Set sharing their key. Everything else is a
//! producer and ends the walk.

use super::role::{classify, find_sets_by_key, is_hub, NodeRole};
use crate::config::HubConfig;
use crate::constants::hub;
use crate::nodes::{HostGraph, LinkId, NodeId};
use log::debug;
use std::collections::HashSet;

/// The output slot a link ultimately draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub node: NodeId,
    pub slot: usize,
    /// Last link on the walk; its origin is `node:slot`
    pub link: LinkId,
}

/// Human-readable identity of a resolved source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLabel {
    pub label: String,
    pub slot_type: String,
}

/// Walks back from `link_id` to its producing output.
///
/// Returns `None` for dangling links, unconnected pass-throughs, Gets with no
/// connected Set, and cycles.
pub fn resolve_origin<G: HostGraph + ?Sized>(graph: &G, config: &HubConfig, link_id: LinkId) -> Option<Origin> {
    let mut link = graph.link(link_id)?;
    let mut seen = HashSet::new();

    loop {
        let node = graph.node(link.origin_id)?;
        if !seen.insert(node.id) {
            debug!("Cycle through node {} while resolving link {}", node.id, link_id);
            return None;
        }

        let next = match classify(node, config) {
            NodeRole::VirtualGet { key } => {
                let wired = find_sets_by_key(graph, config, &key)
                    .into_iter()
                    .find_map(|set| graph.node(set).and_then(|n| n.input_link(0)));
                match wired {
                    Some(next) => next,
                    None => {
                        debug!("Get node {} has no connected Set for key {}", node.id, key);
                        return None;
                    }
                }
            }
            NodeRole::PassThrough => node.input_link(0)?,
            _ => {
                return Some(Origin {
                    node: node.id,
                    slot: link.origin_slot,
                    link: link.id,
                })
            }
        };
        link = graph.link(next)?;
    }
}

/// Resolves a link and reads the label and type of the producing slot
pub fn source_label<G: HostGraph + ?Sized>(graph: &G, config: &HubConfig, link_id: LinkId) -> Option<SourceLabel> {
    let origin = resolve_origin(graph, config, link_id)?;
    let link = graph.link(origin.link)?;
    let out = graph.node(origin.node).and_then(|n| n.outputs.get(origin.slot));

    let label = out
        .map(|slot| slot.display_name())
        .filter(|l| !l.is_empty())
        .unwrap_or("slot")
        .to_string();
    let slot_type = out
        .map(|slot| slot.slot_type.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(&link.link_type)
        .to_string();

    Some(SourceLabel { label, slot_type })
}

/// The hub feeding `hub_id`'s `pipe_in`, looking through pass-throughs and Set/Get
pub fn upstream_hub<G: HostGraph + ?Sized>(graph: &G, config: &HubConfig, hub_id: NodeId) -> Option<NodeId> {
    let node = graph.node(hub_id)?;
    let pipe_in = node.find_input(hub::PIPE_IN)?;
    let origin = resolve_origin(graph, config, node.input_link(pipe_in)?)?;
    graph
        .node(origin.node)
        .filter(|n| is_hub(n, config))
        .map(|n| n.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{factory, NodeGraph};

    fn chain_of_reroutes(graph: &mut NodeGraph, from: NodeId, count: usize) -> NodeId {
        let mut tail = from;
        for _ in 0..count {
            let reroute = graph.add_node(factory::reroute());
            graph.connect(tail, 0, reroute, 0).unwrap();
            tail = reroute;
        }
        tail
    }

    #[test]
    fn test_origin_independent_of_reroute_chain_length() {
        let config = HubConfig::default();
        for n in 0..5 {
            let mut graph = NodeGraph::new();
            let src = graph.add_node(factory::source("VAEDecode", &[("IMAGE", "IMAGE")]));
            let tail = chain_of_reroutes(&mut graph, src, n);
            let hub = graph.add_node(factory::pipe_hub());
            let link = graph.connect(tail, 0, hub, 1).unwrap();

            let origin = resolve_origin(&graph, &config, link).unwrap();
            assert_eq!((origin.node, origin.slot), (src, 0), "chain of {}", n);
            assert_eq!(
                source_label(&graph, &config, link),
                Some(SourceLabel { label: "IMAGE".into(), slot_type: "IMAGE".into() })
            );
        }
    }

    #[test]
    fn test_origin_is_transparent_to_set_get() {
        let config = HubConfig::default();
        let mut graph = NodeGraph::new();
        let src = graph.add_node(factory::source("KSampler", &[("LATENT", "LATENT")]));
        let set = graph.add_node(factory::set_node("K"));
        let get = graph.add_node(factory::get_node("K"));
        let hub = graph.add_node(factory::pipe_hub());
        graph.connect(src, 0, set, 0).unwrap();
        let via_get = graph.connect(get, 0, hub, 1).unwrap();
        let direct = graph.connect(src, 0, hub, 2).unwrap();

        let a = resolve_origin(&graph, &config, via_get).unwrap();
        let b = resolve_origin(&graph, &config, direct).unwrap();
        assert_eq!((a.node, a.slot), (b.node, b.slot));
    }

    #[test]
    fn test_get_picks_first_connected_set() {
        let config = HubConfig::default();
        let mut graph = NodeGraph::new();
        let _unwired = graph.add_node(factory::set_node("K"));
        let src = graph.add_node(factory::source("Loader", &[("MODEL", "MODEL")]));
        let wired = graph.add_node(factory::set_node("K"));
        let get = graph.add_node(factory::get_node("K"));
        let hub = graph.add_node(factory::pipe_hub());
        graph.connect(src, 0, wired, 0).unwrap();
        let link = graph.connect(get, 0, hub, 1).unwrap();

        assert_eq!(resolve_origin(&graph, &config, link).map(|o| o.node), Some(src));
    }

    #[test]
    fn test_dangling_references_resolve_to_none() {
        let config = HubConfig::default();
        let mut graph = NodeGraph::new();
        let get = graph.add_node(factory::get_node("missing"));
        let reroute = graph.add_node(factory::reroute());
        let hub = graph.add_node(factory::pipe_hub());
        let from_get = graph.connect(get, 0, hub, 1).unwrap();
        let from_reroute = graph.connect(reroute, 0, hub, 2).unwrap();

        assert_eq!(resolve_origin(&graph, &config, from_get), None);
        assert_eq!(resolve_origin(&graph, &config, from_reroute), None);
        assert_eq!(resolve_origin(&graph, &config, 999), None);
    }

    #[test]
    fn test_reroute_cycle_resolves_to_none() {
        let config = HubConfig::default();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(factory::reroute());
        let b = graph.add_node(factory::reroute());
        let hub = graph.add_node(factory::pipe_hub());
        graph.connect(a, 0, b, 0).unwrap();
        graph.connect(b, 0, a, 0).unwrap();
        let link = graph.connect(b, 0, hub, 1).unwrap();

        assert_eq!(resolve_origin(&graph, &config, link), None);
    }

    #[test]
    fn test_source_label_prefers_visible_label() {
        let config = HubConfig::default();
        let mut graph = NodeGraph::new();
        let mut node = factory::source("Loader", &[("CLIP", "CLIP")]);
        node.outputs[0].label = Some("text encoder".to_string());
        let src = graph.add_node(node);
        let hub = graph.add_node(factory::pipe_hub());
        let link = graph.connect(src, 0, hub, 1).unwrap();

        let label = source_label(&graph, &config, link).unwrap();
        assert_eq!(label.label, "text encoder");
        assert_eq!(label.slot_type, "CLIP");
    }

    #[test]
    fn test_upstream_hub_through_reroute_and_set_get() {
        let config = HubConfig::default();
        let mut graph = NodeGraph::new();
        let a = graph.add_node(factory::pipe_hub());
        let b = graph.add_node(factory::pipe_hub());
        let c = graph.add_node(factory::pipe_hub());
        let reroute = graph.add_node(factory::reroute());
        let set = graph.add_node(factory::set_node("pipe"));
        let get = graph.add_node(factory::get_node("pipe"));

        graph.connect(a, 0, reroute, 0).unwrap();
        graph.connect(reroute, 0, b, 0).unwrap();
        graph.connect(b, 0, set, 0).unwrap();
        graph.connect(get, 0, c, 0).unwrap();

        assert_eq!(upstream_hub(&graph, &config, a), None);
        assert_eq!(upstream_hub(&graph, &config, b), Some(a));
        assert_eq!(upstream_hub(&graph, &config, c), Some(b));
    }
}
