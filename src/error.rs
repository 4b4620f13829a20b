use std::path::PathBuf;

use thiserror::Error;

use crate::nodes::{NodeId, SlotSide};

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: NodeId },

    #[error("{side:?} slot {index} out of range on node {node_id}")]
    SlotOutOfRange {
        node_id: NodeId,
        side: SlotSide,
        index: usize,
    },

    #[error("Cannot connect node {node_id} to itself")]
    SelfLink { node_id: NodeId },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}
