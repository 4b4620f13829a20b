//! Node system - host graph model consumed by the hub engine

pub mod factory;
pub mod graph;
pub mod host;
pub mod node;
pub mod port;

// Re-export core types
pub use graph::{Link, NodeGraph};
pub use host::HostGraph;
pub use node::{Node, NodeId, Widget};
pub use port::{InputSlot, LinkId, OutputSlot, SlotSide};
