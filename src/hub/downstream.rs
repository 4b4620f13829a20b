//! Forward search from a hub's pipe output to the hubs it feeds directly

use super::role::{classify, find_gets_by_key, NodeRole};
use crate::config::HubConfig;
use crate::constants::hub;
use crate::nodes::{HostGraph, LinkId, NodeId};
use std::collections::{HashSet, VecDeque};

/// Hubs fed by `hub_id`'s `pipe` output, in first-visit order
pub fn find_downstream_hubs<G: HostGraph + ?Sized>(graph: &G, config: &HubConfig, hub_id: NodeId) -> Vec<NodeId> {
    let Some(slot) = graph.node(hub_id).and_then(|n| n.find_output(hub::PIPE_OUT)) else {
        return Vec::new();
    };
    find_hubs_from_output(graph, config, hub_id, slot)
}

/// Breadth-first walk over every link leaving `node_id:slot`.
///
/// Hubs are recorded and not entered. Pass-throughs continue through their
/// first output; Sets continue through the outputs of every Get sharing
/// their key. Each node and each link is visited at most once.
pub fn find_hubs_from_output<G: HostGraph + ?Sized>(
    graph: &G,
    config: &HubConfig,
    node_id: NodeId,
    slot: usize,
) -> Vec<NodeId> {
    let mut hubs = Vec::new();
    let mut seen_nodes = HashSet::new();
    let mut seen_links = HashSet::new();
    let mut queue: VecDeque<LinkId> = graph
        .node(node_id)
        .and_then(|n| n.outputs.get(slot))
        .map(|out| out.links.iter().copied().collect())
        .unwrap_or_default();

    while let Some(link_id) = queue.pop_front() {
        if !seen_links.insert(link_id) {
            continue;
        }
        let Some(target) = graph.link(link_id).and_then(|link| graph.node(link.target_id)) else {
            continue;
        };
        if !seen_nodes.insert(target.id) {
            continue;
        }

        match classify(target, config) {
            NodeRole::Hub => hubs.push(target.id),
            NodeRole::PassThrough => {
                if let Some(out) = target.outputs.first() {
                    queue.extend(out.links.iter().copied());
                }
            }
            NodeRole::VirtualSet { key } => {
                for get in find_gets_by_key(graph, config, &key) {
                    if let Some(out) = graph.node(get).and_then(|n| n.outputs.first()) {
                        queue.extend(out.links.iter().copied());
                    }
                }
            }
            NodeRole::VirtualGet { .. } | NodeRole::Plain => {}
        }
    }

    hubs
}
