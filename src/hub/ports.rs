//! Pair count and label maintenance for a single hub
//!
//! Every operation here is idempotent: running it again without a graph
//! change in between mutates nothing further.

use super::origin::{source_label, upstream_hub};
use super::state::{HubState, HubStates, PairMeta};
use crate::config::HubConfig;
use crate::constants::hub;
use crate::error::{GraphError, GraphResult};
use crate::nodes::factory::{pair_input_name, pair_output_name};
use crate::nodes::port::pair_index;
use crate::nodes::{HostGraph, Node, NodeId, SlotSide};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Mutating view over one graph, the hub side table and the configuration
pub struct HubEditor<'a, G: HostGraph + ?Sized> {
    pub graph: &'a mut G,
    pub states: &'a mut HubStates,
    pub config: &'a HubConfig,
}

impl<'a, G: HostGraph + ?Sized> HubEditor<'a, G> {
    pub fn new(graph: &'a mut G, states: &'a mut HubStates, config: &'a HubConfig) -> Self {
        Self { graph, states, config }
    }

    fn node(&self, hub: NodeId) -> GraphResult<&Node> {
        self.graph
            .node(hub)
            .ok_or(GraphError::NodeNotFound { node_id: hub })
    }

    fn state(&mut self, hub: NodeId) -> &mut HubState {
        self.states.register(hub)
    }

    /// Slot indices of pair `k` as `(input, output)`, when both exist
    pub fn pair_slots(&self, hub: NodeId, k: usize) -> Option<(usize, usize)> {
        let node = self.graph.node(hub)?;
        Some((
            node.find_input(&pair_input_name(k))?,
            node.find_output(&pair_output_name(k))?,
        ))
    }

    /// Number of consecutive complete pairs starting at 1
    pub fn pair_count(&self, hub: NodeId) -> usize {
        (1..=self.config.max_pairs)
            .take_while(|k| self.pair_slots(hub, *k).is_some())
            .count()
    }

    /// Highest pair index connected on either side
    pub fn usage_level(&self, hub: NodeId) -> usize {
        let Some(node) = self.graph.node(hub) else {
            return 0;
        };
        let mut used = 0;
        for k in 1..=self.pair_count(hub) {
            if let Some((ii, io)) = self.pair_slots(hub, k) {
                if node.inputs[ii].is_connected() || node.outputs[io].is_connected() {
                    used = k;
                }
            }
        }
        used
    }

    /// Highest pair index carrying resolved metadata
    pub fn meta_level(&self, hub: NodeId) -> usize {
        self.states
            .get(hub)
            .map_or(0, |state| state.meta_level(self.config.max_pairs))
    }

    /// Highest pair index the hub considers in use
    pub fn advertised_level(&self, hub: NodeId) -> usize {
        self.usage_level(hub).max(self.meta_level(hub))
    }

    /// Advertised level of the hub feeding `pipe_in`, 0 when there is none
    pub fn upstream_advertised_level(&self, hub: NodeId) -> usize {
        upstream_hub(&*self.graph, self.config, hub).map_or(0, |up| self.advertised_level(up))
    }

    pub fn is_pipe_in_connected(&self, hub: NodeId) -> bool {
        self.graph
            .node(hub)
            .and_then(|n| n.find_input(hub::PIPE_IN).and_then(|i| n.input_link(i)))
            .is_some()
    }

    /// A pair is free when its input is unconnected and its output has no links
    pub fn is_pair_free(&self, hub: NodeId, k: usize) -> bool {
        match (self.graph.node(hub), self.pair_slots(hub, k)) {
            (Some(node), Some((ii, io))) => {
                !node.inputs[ii].is_connected() && !node.outputs[io].is_connected()
            }
            _ => true,
        }
    }

    /// `max(usage, meta, upstream advertised) + 1`, clamped to `[2, max_pairs]`
    pub fn desired_pair_count(&self, hub: NodeId) -> usize {
        let base = self
            .usage_level(hub)
            .max(self.meta_level(hub))
            .max(self.upstream_advertised_level(hub));
        (base + 1).min(self.config.max_pairs).max(hub::MIN_PAIRS)
    }

    fn set_pair_slot_labels(&mut self, hub: NodeId, k: usize, label: Option<String>) -> GraphResult<()> {
        let node = self.node(hub)?;
        let input = node.find_input(&pair_input_name(k));
        let output = node.find_output(&pair_output_name(k));
        if let Some(ii) = input {
            self.graph.set_slot_label(hub, SlotSide::Input, ii, label.clone())?;
        }
        if let Some(io) = output {
            self.graph.set_slot_label(hub, SlotSide::Output, io, label)?;
        }
        Ok(())
    }

    fn reset_pair(&mut self, hub: NodeId, k: usize) -> GraphResult<()> {
        self.set_pair_slot_labels(hub, k, None)?;
        if let Some(state) = self.states.get_mut(hub) {
            state.pair_meta.remove(&k);
        }
        Ok(())
    }

    fn refit(&mut self, hub: NodeId) -> GraphResult<()> {
        self.graph.fit_size(hub)?;
        self.graph.mark_dirty(hub);
        Ok(())
    }

    /// Removes unconnected numbered ports that duplicate an existing name or
    /// have lost their partner. Connected ports are never touched.
    pub fn sweep_ports(&mut self, hub: NodeId) -> GraphResult<usize> {
        let node = self.node(hub)?;
        let partner_outputs: HashSet<usize> = node
            .outputs
            .iter()
            .filter_map(|slot| pair_index(&slot.name, hub::PAIR_OUTPUT_PREFIX))
            .collect();
        let partner_inputs: HashSet<usize> = node
            .inputs
            .iter()
            .filter_map(|slot| pair_index(&slot.name, hub::PAIR_INPUT_PREFIX))
            .collect();

        let doomed_inputs = stray_slots(
            node.inputs.iter().map(|slot| (slot.name.as_str(), slot.is_connected())),
            hub::PAIR_INPUT_PREFIX,
            &partner_outputs,
        );
        let doomed_outputs = stray_slots(
            node.outputs.iter().map(|slot| (slot.name.as_str(), slot.is_connected())),
            hub::PAIR_OUTPUT_PREFIX,
            &partner_inputs,
        );

        let removed = doomed_inputs.len() + doomed_outputs.len();
        // Back to front so earlier indices stay valid
        for i in doomed_inputs.into_iter().rev() {
            self.graph.remove_input(hub, i)?;
        }
        for i in doomed_outputs.into_iter().rev() {
            self.graph.remove_output(hub, i)?;
        }
        if removed > 0 {
            debug!("Swept {} stray ports from hub {}", removed, hub);
            self.refit(hub)?;
        }
        Ok(removed)
    }

    /// Appends empty pairs until the hub has `target` of them
    fn add_pairs(&mut self, hub: NodeId, target: usize) -> GraphResult<()> {
        let have = self.pair_count(hub);
        let target = target.min(self.config.max_pairs);
        if target <= have {
            return Ok(());
        }
        for k in have + 1..=target {
            let node = self.node(hub)?;
            let has_input = node.find_input(&pair_input_name(k)).is_some();
            let has_output = node.find_output(&pair_output_name(k)).is_some();
            if !has_input {
                self.graph.add_input(hub, &pair_input_name(k), hub::ANY_TYPE)?;
            }
            if !has_output {
                self.graph.add_output(hub, &pair_output_name(k), hub::ANY_TYPE)?;
            }
            self.reset_pair(hub, k)?;
        }
        debug!("Hub {} grew from {} to {} pairs", hub, have, target);
        self.refit(hub)
    }

    /// Removes the highest pair if it is free and the hub has more than two
    fn remove_last_pair_if_free(&mut self, hub: NodeId) -> GraphResult<bool> {
        let last = self.pair_count(hub);
        if last <= hub::MIN_PAIRS || !self.is_pair_free(hub, last) {
            return Ok(false);
        }
        self.reset_pair(hub, last)?;
        if let Some(io) = self.node(hub)?.find_output(&pair_output_name(last)) {
            self.graph.remove_output(hub, io)?;
        }
        if let Some(ii) = self.node(hub)?.find_input(&pair_input_name(last)) {
            self.graph.remove_input(hub, ii)?;
        }
        self.refit(hub)?;
        Ok(true)
    }

    /// Shrinks from the top while the highest pair is free
    pub fn purge_free_pairs(&mut self, hub: NodeId) -> GraphResult<usize> {
        let mut removed = 0;
        while self.remove_last_pair_if_free(hub)? {
            removed += 1;
        }
        Ok(removed)
    }

    /// Grows or shrinks the hub to its desired pair count.
    ///
    /// Growth appends empty pairs and never renumbers existing ones. Shrinking
    /// removes the highest pair, one at a time, only while it is free.
    pub fn ensure_pair_count(&mut self, hub: NodeId) -> GraphResult<()> {
        self.sweep_ports(hub)?;
        let target = self.desired_pair_count(hub);
        let mut current = self.pair_count(hub);

        if current < target {
            self.add_pairs(hub, target)?;
            if self.is_pipe_in_connected(hub) {
                self.refresh_inherited_meta(hub)?;
                return self.apply_all_labels(hub);
            }
            return self.dedupe_labels(hub);
        }

        while current > target {
            if !self.remove_last_pair_if_free(hub)? {
                break;
            }
            current = self.pair_count(hub);
        }
        self.dedupe_labels(hub)
    }

    /// Re-derives pair `k`'s metadata without deduplicating
    fn derive_pair_meta(&mut self, hub: NodeId, k: usize) -> GraphResult<()> {
        let Some((ii, _)) = self.pair_slots(hub, k) else {
            return Ok(());
        };

        let live = self
            .node(hub)?
            .input_link(ii)
            .and_then(|link| source_label(&*self.graph, self.config, link))
            .map(|source| (source.label, source.slot_type));
        let derived = live.or_else(|| {
            self.states
                .get(hub)
                .and_then(|state| state.inherited_meta.get(&k))
                .map(|meta| (meta.inherited_label().to_string(), meta.pair_type.clone()))
        });

        match derived {
            Some((label, slot_type)) if !label.is_empty() => {
                let pair_type = if slot_type.is_empty() { label.to_uppercase() } else { slot_type.to_uppercase() };
                let meta = self.state(hub).pair_meta.entry(k).or_default();
                meta.label = label;
                meta.pair_type = pair_type;
                Ok(())
            }
            _ => self.reset_pair(hub, k),
        }
    }

    /// Derives pair `k`'s label from its live source, else from inherited
    /// metadata, else clears it; then dedupes the hub's labels
    pub fn apply_pair_label(&mut self, hub: NodeId, k: usize) -> GraphResult<()> {
        self.derive_pair_meta(hub, k)?;
        self.dedupe_labels(hub)
    }

    /// Re-derives every pair's label, then dedupes once
    pub fn apply_all_labels(&mut self, hub: NodeId) -> GraphResult<()> {
        for k in 1..=self.pair_count(hub) {
            self.derive_pair_meta(hub, k)?;
        }
        self.dedupe_labels(hub)
    }

    /// Assigns unique display labels in pair order (`IMAGE`, `IMAGE_1`, ...)
    /// and shows them on both slots of each pair
    pub fn dedupe_labels(&mut self, hub: NodeId) -> GraphResult<()> {
        let count = self.pair_count(hub);
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        let mut used: HashSet<String> = HashSet::new();

        for k in 1..=count {
            let base = self
                .states
                .get(hub)
                .and_then(|state| state.pair_meta.get(&k))
                .map(|meta| meta.base_label().trim().to_string())
                .unwrap_or_default();

            if base.is_empty() {
                self.set_pair_slot_labels(hub, k, None)?;
                if let Some(meta) = self.states.get_mut(hub).and_then(|s| s.pair_meta.get_mut(&k)) {
                    meta.label_display = None;
                }
                continue;
            }

            let seen = occurrences.entry(base.clone()).or_insert(0);
            *seen += 1;
            let mut display = if *seen == 1 {
                base.clone()
            } else {
                format!("{}_{}", base, *seen - 1)
            };
            // A literal base such as `IMAGE_1` may already hold the suffixed name
            while used.contains(&display) {
                *seen += 1;
                display = format!("{}_{}", base, *seen - 1);
            }
            used.insert(display.clone());

            self.set_pair_slot_labels(hub, k, Some(display.clone()))?;
            if let Some(meta) = self.states.get_mut(hub).and_then(|s| s.pair_meta.get_mut(&k)) {
                meta.label_display = Some(display);
            }
        }

        self.graph.mark_dirty(hub);
        Ok(())
    }

    /// Snapshots the upstream hub's pair metadata, or clears the snapshot
    /// when `pipe_in` leads to no hub
    pub fn refresh_inherited_meta(&mut self, hub: NodeId) -> GraphResult<()> {
        self.node(hub)?;
        let inherited = upstream_hub(&*self.graph, self.config, hub)
            .and_then(|up| self.states.get(up))
            .map(|state| state.pair_meta.clone())
            .unwrap_or_default();
        debug!("Hub {} inherits {} labelled pairs", hub, inherited.len());
        self.state(hub).inherited_meta = inherited;
        Ok(())
    }

    /// Current metadata of pair `k`
    pub fn pair_meta(&self, hub: NodeId, k: usize) -> Option<&PairMeta> {
        self.states.get(hub)?.pair_meta.get(&k)
    }
}

/// Indices of unconnected numbered slots to drop, ascending.
///
/// Of several slots sharing a name, one stays: the first connected copy,
/// else the first copy. An unconnected slot whose partner index is missing
/// on the other side goes as well.
fn stray_slots<'s>(
    slots: impl Iterator<Item = (&'s str, bool)>,
    prefix: &str,
    partners: &HashSet<usize>,
) -> Vec<usize> {
    let slots: Vec<(usize, &str, bool)> = slots
        .enumerate()
        .filter(|(_, (name, _))| pair_index(name, prefix).is_some())
        .map(|(i, (name, connected))| (i, name, connected))
        .collect();

    let mut keep: HashMap<&str, (usize, bool)> = HashMap::new();
    for &(i, name, connected) in &slots {
        let kept = keep.entry(name).or_insert((i, connected));
        if connected && !kept.1 {
            *kept = (i, true);
        }
    }

    slots
        .iter()
        .filter(|&&(i, name, connected)| {
            let orphan = pair_index(name, prefix).is_some_and(|k| !partners.contains(&k));
            !connected && (keep.get(name).map(|kept| kept.0) != Some(i) || orphan)
        })
        .map(|&(i, _, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{factory, NodeGraph};

    struct Fixture {
        graph: NodeGraph,
        states: HubStates,
        config: HubConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: NodeGraph::new(),
                states: HubStates::new(),
                config: HubConfig::default(),
            }
        }

        fn editor(&mut self) -> HubEditor<'_, NodeGraph> {
            HubEditor::new(&mut self.graph, &mut self.states, &self.config)
        }

        fn source(&mut self, name: &str) -> NodeId {
            self.graph.add_node(factory::source("Producer", &[(name, name)]))
        }

        fn slot_names(&self, hub: NodeId) -> (Vec<String>, Vec<String>) {
            let node = &self.graph.nodes[&hub];
            (
                node.inputs.iter().map(|s| s.name.clone()).collect(),
                node.outputs.iter().map(|s| s.name.clone()).collect(),
            )
        }

        fn input_labels(&self, hub: NodeId) -> Vec<Option<String>> {
            self.graph.nodes[&hub].inputs.iter().map(|s| s.label.clone()).collect()
        }
    }

    #[test]
    fn test_fresh_hub_levels() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        let editor = fx.editor();
        assert_eq!(editor.pair_count(hub), 2);
        assert_eq!(editor.usage_level(hub), 0);
        assert_eq!(editor.desired_pair_count(hub), 2);
        assert!(editor.is_pair_free(hub, 1));
        assert!(!editor.is_pipe_in_connected(hub));
    }

    #[test]
    fn test_ensure_grows_one_past_usage() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        let src = fx.source("IMAGE");
        fx.graph.connect(src, 0, hub, 2).unwrap(); // in2

        fx.editor().ensure_pair_count(hub).unwrap();
        assert_eq!(fx.editor().pair_count(hub), 3);
        let (inputs, outputs) = fx.slot_names(hub);
        assert_eq!(inputs, ["pipe_in", "in1", "in2", "in3"]);
        assert_eq!(outputs, ["pipe", "out1", "out2", "out3"]);
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        let src = fx.source("MODEL");
        fx.graph.connect(src, 0, hub, 1).unwrap();
        fx.graph.connect(src, 0, hub, 2).unwrap();

        fx.editor().apply_all_labels(hub).unwrap();
        fx.editor().ensure_pair_count(hub).unwrap();
        let first = (fx.slot_names(hub), fx.input_labels(hub), fx.editor().pair_count(hub));
        fx.editor().ensure_pair_count(hub).unwrap();
        let second = (fx.slot_names(hub), fx.input_labels(hub), fx.editor().pair_count(hub));
        assert_eq!(first, second);
        assert_eq!(first.2, 3);
    }

    #[test]
    fn test_shrink_stops_at_two_highest_first() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        for k in 3..=5 {
            fx.graph.add_input(hub, &pair_input_name(k), "*").unwrap();
            fx.graph.add_output(hub, &pair_output_name(k), "*").unwrap();
        }
        let src = fx.source("LATENT");
        fx.graph.connect(src, 0, hub, 1).unwrap();
        assert_eq!(fx.editor().pair_count(hub), 5);

        // Only the top pair may go, so the first removal must be pair 5
        assert!(fx.editor().remove_last_pair_if_free(hub).unwrap());
        assert_eq!(fx.slot_names(hub).0.last().map(String::as_str), Some("in4"));

        for _ in 0..3 {
            fx.editor().ensure_pair_count(hub).unwrap();
        }
        assert_eq!(fx.editor().pair_count(hub), 2);
        assert_eq!(fx.slot_names(hub).1, ["pipe", "out1", "out2"]);
    }

    #[test]
    fn test_connected_top_pair_keeps_a_spare() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        for k in 3..=4 {
            fx.graph.add_input(hub, &pair_input_name(k), "*").unwrap();
            fx.graph.add_output(hub, &pair_output_name(k), "*").unwrap();
        }
        let sink = fx.graph.add_node(factory::reroute());
        fx.graph.connect(hub, 4, sink, 0).unwrap(); // out4

        fx.editor().ensure_pair_count(hub).unwrap();
        assert_eq!(fx.editor().pair_count(hub), 5);
    }

    #[test]
    fn test_three_images_dedupe_in_pair_order() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        let src = fx.source("IMAGE");
        fx.graph.add_input(hub, "in3", "*").unwrap();
        fx.graph.add_output(hub, "out3", "*").unwrap();
        for slot in 1..=3 {
            fx.graph.connect(src, 0, hub, slot).unwrap();
        }

        fx.editor().apply_all_labels(hub).unwrap();
        let labels: Vec<Option<String>> = fx.input_labels(hub)[1..].to_vec();
        assert_eq!(
            labels,
            vec![Some("IMAGE".to_string()), Some("IMAGE_1".to_string()), Some("IMAGE_2".to_string())]
        );
        let out3 = &fx.graph.nodes[&hub].outputs[3];
        assert_eq!(out3.label.as_deref(), Some("IMAGE_2"));
        assert_eq!(
            fx.editor().pair_meta(hub, 2).and_then(|m| m.label_display.clone()),
            Some("IMAGE_1".to_string())
        );
    }

    #[test]
    fn test_dedupe_avoids_literal_suffix_collision() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        fx.graph.add_input(hub, "in3", "*").unwrap();
        fx.graph.add_output(hub, "out3", "*").unwrap();
        let state = fx.states.register(hub);
        state.pair_meta.insert(1, PairMeta::new("IMAGE", "IMAGE"));
        state.pair_meta.insert(2, PairMeta::new("IMAGE", "IMAGE"));
        state.pair_meta.insert(3, PairMeta::new("IMAGE_1", "IMAGE"));

        fx.editor().dedupe_labels(hub).unwrap();
        let displays: Vec<String> = (1..=3)
            .filter_map(|k| fx.states.get(hub)?.pair_meta.get(&k)?.label_display.clone())
            .collect();
        assert_eq!(displays, ["IMAGE", "IMAGE_1", "IMAGE_1_1"]);
    }

    #[test]
    fn test_label_falls_back_to_inherited_then_clears() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        let mut inherited = PairMeta::new("vae", "vae");
        inherited.label_display = Some("vae_1".to_string());
        fx.states.register(hub).inherited_meta.insert(1, inherited);

        fx.editor().apply_pair_label(hub, 1).unwrap();
        let meta = fx.editor().pair_meta(hub, 1).cloned().unwrap();
        assert_eq!(meta.label, "vae_1");
        assert_eq!(meta.pair_type, "VAE");

        fx.states.register(hub).inherited_meta.clear();
        fx.editor().apply_pair_label(hub, 1).unwrap();
        assert!(fx.editor().pair_meta(hub, 1).is_none());
        assert_eq!(fx.graph.nodes[&hub].inputs[1].label, None);
    }

    #[test]
    fn test_live_source_wins_over_inherited() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        fx.states.register(hub).inherited_meta.insert(1, PairMeta::new("CLIP", "CLIP"));
        let src = fx.source("conditioning");
        fx.graph.connect(src, 0, hub, 1).unwrap();

        fx.editor().apply_pair_label(hub, 1).unwrap();
        let meta = fx.editor().pair_meta(hub, 1).cloned().unwrap();
        assert_eq!(meta.label, "conditioning");
        assert_eq!(meta.pair_type, "CONDITIONING");
    }

    #[test]
    fn test_sweep_removes_unconnected_duplicates_and_orphans() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        fx.graph.add_input(hub, "in2", "*").unwrap(); // duplicate
        fx.graph.add_input(hub, "in7", "*").unwrap(); // orphan
        fx.graph.add_output(hub, "out1", "*").unwrap(); // duplicate
        let src = fx.source("MASK");
        fx.graph.add_input(hub, "in9", "*").unwrap(); // connected orphan survives
        fx.graph.connect(src, 0, hub, 5).unwrap();

        let removed = fx.editor().sweep_ports(hub).unwrap();
        assert_eq!(removed, 3);
        let (inputs, outputs) = fx.slot_names(hub);
        assert_eq!(inputs, ["pipe_in", "in1", "in2", "in9"]);
        assert_eq!(outputs, ["pipe", "out1", "out2"]);
        assert_eq!(fx.editor().sweep_ports(hub).unwrap(), 0);
    }

    #[test]
    fn test_sweep_keeps_connected_copy_of_duplicate() {
        let mut fx = Fixture::new();
        let hub = fx.graph.add_node(factory::pipe_hub());
        fx.graph.add_input(hub, "in2", "*").unwrap();
        let src = fx.source("IMAGE");
        fx.graph.connect(src, 0, hub, 3).unwrap(); // later in2

        assert_eq!(fx.editor().sweep_ports(hub).unwrap(), 1);
        assert_eq!(fx.slot_names(hub).0, ["pipe_in", "in1", "in2"]);
        assert!(fx.graph.nodes[&hub].inputs[2].is_connected());

        fx.editor().apply_all_labels(hub).unwrap();
        fx.editor().ensure_pair_count(hub).unwrap();
        assert_eq!(fx.editor().usage_level(hub), 2);
        assert_eq!(fx.editor().pair_count(hub), 3);
        assert_eq!(fx.graph.nodes[&hub].inputs[2].label.as_deref(), Some("IMAGE"));
    }

    #[test]
    fn test_refresh_inherited_snapshots_upstream() {
        let mut fx = Fixture::new();
        let up = fx.graph.add_node(factory::pipe_hub());
        let down = fx.graph.add_node(factory::pipe_hub());
        fx.graph.connect(up, 0, down, 0).unwrap();
        fx.states.register(up).pair_meta.insert(1, PairMeta::new("LATENT", "LATENT"));

        fx.editor().refresh_inherited_meta(down).unwrap();
        assert_eq!(fx.states.get(down).unwrap().inherited_meta.len(), 1);

        // The snapshot is a copy
        fx.states.register(up).pair_meta.clear();
        assert_eq!(fx.states.get(down).unwrap().inherited_meta.len(), 1);

        fx.graph.disconnect_input(down, 0);
        fx.editor().refresh_inherited_meta(down).unwrap();
        assert!(fx.states.get(down).unwrap().inherited_meta.is_empty());
    }

    #[test]
    fn test_upstream_level_drives_growth() {
        let mut fx = Fixture::new();
        let up = fx.graph.add_node(factory::pipe_hub());
        let down = fx.graph.add_node(factory::pipe_hub());
        fx.graph.connect(up, 0, down, 0).unwrap();
        let state = fx.states.register(up);
        for k in 1..=4 {
            state.pair_meta.insert(k, PairMeta::new(format!("S{}", k), "INT"));
        }

        assert_eq!(fx.editor().upstream_advertised_level(down), 4);
        fx.editor().ensure_pair_count(down).unwrap();
        assert_eq!(fx.editor().pair_count(down), 5);
        assert_eq!(fx.graph.nodes[&down].inputs[4].label.as_deref(), Some("S4"));
    }

    #[test]
    fn test_missing_hub_is_an_error() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.editor().ensure_pair_count(42),
            Err(GraphError::NodeNotFound { node_id: 42 })
        );
    }
}
