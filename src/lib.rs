//! Pipe hub core library
//!
//! Keeps the numbered ports of pipe hub nodes in step with what is wired
//! into them, and carries pair labels down chains of hubs, through reroutes
//! and Set/Get node pairs.

pub mod config;
pub mod constants;
pub mod error;
pub mod hub;
pub mod nodes;

// Re-export commonly used types
pub use config::HubConfig;
pub use error::{ConfigError, GraphError, GraphResult};
pub use hub::{FixReport, HubCommand, HubEditor, HubState, HubStates, MenuOption, NodeRole, PairMeta, PipeHubEngine};
pub use nodes::{HostGraph, Link, Node, NodeGraph, NodeId, SlotSide};
