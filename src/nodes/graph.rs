//! Node graph data structures and operations

use super::host::HostGraph;
use super::node::{Node, NodeId};
use super::port::{LinkId, SlotSide};
use crate::error::{GraphError, GraphResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents a link from an output slot to an input slot on another node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub origin_id: NodeId,
    pub origin_slot: usize,
    pub target_id: NodeId,
    pub target_slot: usize,
    /// Nominal payload type, taken from the origin slot
    #[serde(rename = "type")]
    pub link_type: String,
}

/// An in-memory graph containing nodes and the links between their slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGraph {
    pub nodes: BTreeMap<NodeId, Node>,
    pub links: BTreeMap<LinkId, Link>,
    #[serde(default)]
    next_node_id: NodeId,
    #[serde(default)]
    next_link_id: LinkId,
}

impl NodeGraph {
    /// Creates a new empty node graph
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            next_node_id: 0,
            next_link_id: 0,
        }
    }

    /// Parses a serialized graph and makes sure fresh ids cannot collide
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut graph: NodeGraph = serde_json::from_str(json)?;
        for (id, node) in graph.nodes.iter_mut() {
            node.id = *id;
        }
        graph.next_node_id = graph
            .nodes
            .keys()
            .max()
            .map_or(0, |id| id + 1)
            .max(graph.next_node_id);
        graph.next_link_id = graph
            .links
            .keys()
            .max()
            .map_or(0, |id| id + 1)
            .max(graph.next_link_id);
        Ok(graph)
    }

    /// Serializes the graph as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Adds a node to the graph and returns its ID
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = self.next_node_id;
        node.id = id;
        self.nodes.insert(id, node);
        self.next_node_id += 1;
        id
    }

    /// Adds a node to the graph with a specific ID
    pub fn add_node_with_id(&mut self, id: NodeId, mut node: Node) -> NodeId {
        node.id = id;
        self.nodes.insert(id, node);
        if id >= self.next_node_id {
            self.next_node_id = id + 1;
        }
        id
    }

    /// Removes a node and all its links
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let touching: Vec<LinkId> = self
            .links
            .values()
            .filter(|link| link.origin_id == node_id || link.target_id == node_id)
            .map(|link| link.id)
            .collect();
        for link_id in touching {
            self.remove_link(link_id);
        }
        self.nodes.remove(&node_id)
    }

    /// Mutable access to a node
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn require_node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound { node_id: id })
    }

    /// Links an output slot to an input slot.
    ///
    /// An input holds a single link, so any link already arriving at the
    /// target slot is replaced.
    pub fn connect(
        &mut self,
        origin_id: NodeId,
        origin_slot: usize,
        target_id: NodeId,
        target_slot: usize,
    ) -> GraphResult<LinkId> {
        if origin_id == target_id {
            return Err(GraphError::SelfLink { node_id: origin_id });
        }

        let origin = self
            .nodes
            .get(&origin_id)
            .ok_or(GraphError::NodeNotFound { node_id: origin_id })?;
        let link_type = origin
            .outputs
            .get(origin_slot)
            .ok_or(GraphError::SlotOutOfRange {
                node_id: origin_id,
                side: SlotSide::Output,
                index: origin_slot,
            })?
            .slot_type
            .clone();

        let target = self
            .nodes
            .get(&target_id)
            .ok_or(GraphError::NodeNotFound { node_id: target_id })?;
        let existing = target
            .inputs
            .get(target_slot)
            .ok_or(GraphError::SlotOutOfRange {
                node_id: target_id,
                side: SlotSide::Input,
                index: target_slot,
            })?
            .link;

        if let Some(old) = existing {
            self.remove_link(old);
        }

        let id = self.next_link_id;
        self.next_link_id += 1;
        self.links.insert(
            id,
            Link {
                id,
                origin_id,
                origin_slot,
                target_id,
                target_slot,
                link_type,
            },
        );
        self.require_node_mut(origin_id)?.outputs[origin_slot].links.push(id);
        self.require_node_mut(target_id)?.inputs[target_slot].link = Some(id);
        debug!(
            "Linked {}:{} -> {}:{} as link {}",
            origin_id, origin_slot, target_id, target_slot, id
        );
        Ok(id)
    }

    /// Removes whatever link arrives at the given input
    pub fn disconnect_input(&mut self, node_id: NodeId, slot: usize) -> Option<Link> {
        let link_id = self.nodes.get(&node_id)?.input_link(slot)?;
        self.remove_link(link_id)
    }

    /// Removes a link and detaches it from both of its endpoints
    pub fn remove_link(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.remove(&link_id)?;
        if let Some(target) = self.nodes.get_mut(&link.target_id) {
            if let Some(slot) = target.inputs.get_mut(link.target_slot) {
                if slot.link == Some(link_id) {
                    slot.link = None;
                }
            }
        }
        if let Some(origin) = self.nodes.get_mut(&link.origin_id) {
            if let Some(slot) = origin.outputs.get_mut(link.origin_slot) {
                slot.links.retain(|id| *id != link_id);
            }
        }
        Some(link)
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl HostGraph for NodeGraph {
    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    fn nodes_where(&self, predicate: &dyn Fn(&Node) -> bool) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| predicate(node))
            .map(|node| node.id)
            .collect()
    }

    fn add_input(&mut self, node: NodeId, name: &str, slot_type: &str) -> GraphResult<usize> {
        let node = self.require_node_mut(node)?;
        node.add_input(name, slot_type);
        Ok(node.inputs.len() - 1)
    }

    fn add_output(&mut self, node: NodeId, name: &str, slot_type: &str) -> GraphResult<usize> {
        let node = self.require_node_mut(node)?;
        node.add_output(name, slot_type);
        Ok(node.outputs.len() - 1)
    }

    fn remove_input(&mut self, node_id: NodeId, index: usize) -> GraphResult<()> {
        let link = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?
            .inputs
            .get(index)
            .ok_or(GraphError::SlotOutOfRange {
                node_id,
                side: SlotSide::Input,
                index,
            })?
            .link;
        if let Some(link_id) = link {
            self.remove_link(link_id);
        }
        self.require_node_mut(node_id)?.inputs.remove(index);

        // Later slots move up by one
        for link in self.links.values_mut() {
            if link.target_id == node_id && link.target_slot > index {
                link.target_slot -= 1;
            }
        }
        Ok(())
    }

    fn remove_output(&mut self, node_id: NodeId, index: usize) -> GraphResult<()> {
        let links = self
            .nodes
            .get(&node_id)
            .ok_or(GraphError::NodeNotFound { node_id })?
            .outputs
            .get(index)
            .ok_or(GraphError::SlotOutOfRange {
                node_id,
                side: SlotSide::Output,
                index,
            })?
            .links
            .clone();
        for link_id in links {
            self.remove_link(link_id);
        }
        self.require_node_mut(node_id)?.outputs.remove(index);

        for link in self.links.values_mut() {
            if link.origin_id == node_id && link.origin_slot > index {
                link.origin_slot -= 1;
            }
        }
        Ok(())
    }

    fn set_slot_label(
        &mut self,
        node_id: NodeId,
        side: SlotSide,
        index: usize,
        label: Option<String>,
    ) -> GraphResult<()> {
        let node = self.require_node_mut(node_id)?;
        let slot_label = match side {
            SlotSide::Input => node.inputs.get_mut(index).map(|slot| &mut slot.label),
            SlotSide::Output => node.outputs.get_mut(index).map(|slot| &mut slot.label),
        };
        match slot_label {
            Some(slot_label) => {
                *slot_label = label;
                Ok(())
            }
            None => Err(GraphError::SlotOutOfRange {
                node_id,
                side,
                index,
            }),
        }
    }

    fn set_title(&mut self, node_id: NodeId, title: &str) -> GraphResult<()> {
        self.require_node_mut(node_id)?.title = title.to_string();
        Ok(())
    }

    fn fit_size(&mut self, node_id: NodeId) -> GraphResult<()> {
        let node = self.require_node_mut(node_id)?;
        node.size = node.compute_size();
        Ok(())
    }

    fn mark_dirty(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.dirty = true;
        }
    }
}
