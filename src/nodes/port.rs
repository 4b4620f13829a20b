//! Slot types and functionality for node connections

use serde::{Deserialize, Serialize};

/// Unique identifier for a link
pub type LinkId = usize;

/// Side of a node a slot lives on (input or output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotSide {
    Input,
    Output,
}

/// An input slot; holds at most one incoming link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSlot {
    pub name: String,
    #[serde(rename = "type")]
    pub slot_type: String,
    /// Visible label, overriding the name when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub link: Option<LinkId>,
}

impl InputSlot {
    /// Creates a new unconnected input slot
    pub fn new(name: impl Into<String>, slot_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            label: None,
            link: None,
        }
    }

    /// Checks if a link arrives at this slot
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }
}

/// An output slot; may fan out to any number of links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    pub name: String,
    #[serde(rename = "type")]
    pub slot_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub links: Vec<LinkId>,
}

impl OutputSlot {
    /// Creates a new output slot with no links
    pub fn new(name: impl Into<String>, slot_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            label: None,
            links: Vec::new(),
        }
    }

    /// Checks if at least one link leaves this slot
    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    /// The label shown for this slot: its visible label, else its name
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Parses the pair index out of a numbered slot name such as `in3` or `out12`
pub fn pair_index(name: &str, prefix: &str) -> Option<usize> {
    let digits = name.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
