//! The narrow surface the hub engine needs from an editor's graph runtime
//!
//! The engine never owns nodes or links. Everything it reads or mutates goes
//! through this trait, so an editor only has to adapt its own graph storage.

use super::graph::Link;
use super::node::{Node, NodeId};
use super::port::{LinkId, SlotSide};
use crate::error::GraphResult;

/// Read and mutate access to a host-owned node graph
pub trait HostGraph {
    /// Looks up a node by id
    fn node(&self, id: NodeId) -> Option<&Node>;

    /// Looks up a link by id
    fn link(&self, id: LinkId) -> Option<&Link>;

    /// Ids of every node accepted by the predicate, in ascending id order.
    ///
    /// Recomputed on every call; the graph may change between calls.
    fn nodes_where(&self, predicate: &dyn Fn(&Node) -> bool) -> Vec<NodeId>;

    /// Appends an input slot and returns its index
    fn add_input(&mut self, node: NodeId, name: &str, slot_type: &str) -> GraphResult<usize>;

    /// Appends an output slot and returns its index
    fn add_output(&mut self, node: NodeId, name: &str, slot_type: &str) -> GraphResult<usize>;

    /// Removes an input slot, dropping its link
    fn remove_input(&mut self, node: NodeId, index: usize) -> GraphResult<()>;

    /// Removes an output slot, dropping all of its links
    fn remove_output(&mut self, node: NodeId, index: usize) -> GraphResult<()>;

    /// Sets or clears the visible label of a slot
    fn set_slot_label(
        &mut self,
        node: NodeId,
        side: SlotSide,
        index: usize,
        label: Option<String>,
    ) -> GraphResult<()>;

    /// Replaces the node's title
    fn set_title(&mut self, node: NodeId, title: &str) -> GraphResult<()>;

    /// Resizes the node to fit its slots
    fn fit_size(&mut self, node: NodeId) -> GraphResult<()>;

    /// Flags the node for redraw
    fn mark_dirty(&mut self, node: NodeId);
}
