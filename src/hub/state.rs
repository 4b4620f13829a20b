//! Per-hub derived state, kept in a side table keyed by node id

use crate::nodes::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Label and type identity of one (inK, outK) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairMeta {
    pub label: String,
    /// Upper-cased payload type
    #[serde(rename = "type")]
    pub pair_type: String,
    /// Unique label actually shown on the pair's slots
    #[serde(rename = "labelDisplay", default, skip_serializing_if = "Option::is_none")]
    pub label_display: Option<String>,
}

impl PairMeta {
    pub fn new(label: impl Into<String>, pair_type: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pair_type: pair_type.into(),
            label_display: None,
        }
    }

    /// Whether this entry resolves to any label at all
    pub fn is_resolved(&self) -> bool {
        !self.label.is_empty() || !self.pair_type.is_empty()
    }

    /// Label used as the deduplication base: the label, else the type
    pub fn base_label(&self) -> &str {
        if self.label.is_empty() {
            &self.pair_type
        } else {
            &self.label
        }
    }

    /// Label a downstream hub inherits: what is shown here, else the base label
    pub fn inherited_label(&self) -> &str {
        match self.label_display.as_deref() {
            Some(display) if !display.is_empty() => display,
            _ => self.base_label(),
        }
    }
}

/// Derived state attached to one hub node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubState {
    /// Metadata of pairs that currently resolve to a label, keyed by pair index
    pub pair_meta: BTreeMap<usize, PairMeta>,
    /// Snapshot of the upstream hub's `pair_meta`
    pub inherited_meta: BTreeMap<usize, PairMeta>,
}

impl HubState {
    /// Highest pair index carrying resolved metadata, up to `max_pairs`
    pub fn meta_level(&self, max_pairs: usize) -> usize {
        self.pair_meta
            .iter()
            .filter(|(k, meta)| **k <= max_pairs && meta.is_resolved())
            .map(|(k, _)| *k)
            .max()
            .unwrap_or(0)
    }

    /// Display label of pair `k`, if it has one
    pub fn display_label(&self, k: usize) -> Option<&str> {
        let meta = self.pair_meta.get(&k)?;
        meta.label_display
            .as_deref()
            .or(Some(meta.label.as_str()))
            .filter(|label| !label.is_empty())
    }
}

/// Side table of hub state, with lifecycle tied to node creation and removal
#[derive(Debug, Default)]
pub struct HubStates {
    states: HashMap<NodeId, HubState>,
}

impl HubStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates empty state for a new hub, keeping any existing entry
    pub fn register(&mut self, id: NodeId) -> &mut HubState {
        self.states.entry(id).or_default()
    }

    /// Discards the state of a removed hub
    pub fn remove(&mut self, id: NodeId) -> Option<HubState> {
        self.states.remove(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&HubState> {
        self.states.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut HubState> {
        self.states.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Ids of every tracked hub, ascending
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.states.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_meta_labels() {
        let mut meta = PairMeta::new("", "IMAGE");
        assert!(meta.is_resolved());
        assert_eq!(meta.base_label(), "IMAGE");
        meta.label = "pixels".to_string();
        assert_eq!(meta.base_label(), "pixels");
        assert_eq!(meta.inherited_label(), "pixels");
        meta.label_display = Some("pixels_1".to_string());
        assert_eq!(meta.inherited_label(), "pixels_1");
        assert!(!PairMeta::default().is_resolved());
    }

    #[test]
    fn test_meta_level_ignores_unresolved_and_out_of_range() {
        let mut state = HubState::default();
        state.pair_meta.insert(2, PairMeta::new("MODEL", "MODEL"));
        state.pair_meta.insert(4, PairMeta::default());
        state.pair_meta.insert(40, PairMeta::new("X", "X"));
        assert_eq!(state.meta_level(30), 2);
        assert_eq!(state.display_label(2), Some("MODEL"));
        assert_eq!(state.display_label(4), None);
    }

    #[test]
    fn test_side_table_lifecycle() {
        let mut states = HubStates::new();
        states.register(4).pair_meta.insert(1, PairMeta::new("CLIP", "CLIP"));
        states.register(4);
        states.register(1);
        assert_eq!(states.ids(), vec![1, 4]);
        assert_eq!(states.get(4).map(|s| s.pair_meta.len()), Some(1));
        assert!(states.remove(4).is_some());
        assert!(!states.contains(4));
        assert_eq!(states.len(), 1);
    }
}
