//! Cascade waves and whole-component Fix
//!
//! A cascade pushes a local edit forward one wave at a time. A Fix walks the
//! whole connected set of hubs in dependency order, so every hub sees its
//! upstream's final metadata before passing it on.

use super::downstream::find_downstream_hubs;
use super::origin::upstream_hub;
use super::ports::HubEditor;
use super::role::is_hub;
use crate::config::HubConfig;
use crate::error::GraphResult;
use crate::nodes::{HostGraph, NodeId};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet, VecDeque};

/// Outcome of one Fix run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    pub root: NodeId,
    /// Hubs in the order they were reconciled
    pub order: Vec<NodeId>,
    /// Hubs left on a cycle, appended to `order` in discovery order
    pub residual: Vec<NodeId>,
}

impl FixReport {
    pub fn converged_in_one_pass(&self) -> bool {
        self.residual.is_empty()
    }
}

/// Every hub reachable from `root` over upstream and downstream hub edges,
/// in discovery order. Empty when `root` is not a hub.
pub fn collect_connected_hubs<G: HostGraph + ?Sized>(graph: &G, config: &HubConfig, root: NodeId) -> Vec<NodeId> {
    if !graph.node(root).is_some_and(|n| is_hub(n, config)) {
        return Vec::new();
    }

    let mut found = vec![root];
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(hub) = queue.pop_front() {
        let neighbours = upstream_hub(graph, config, hub)
            .into_iter()
            .chain(find_downstream_hubs(graph, config, hub));
        for next in neighbours {
            if seen.insert(next) {
                found.push(next);
                queue.push_back(next);
            }
        }
    }
    found
}

/// Kahn's algorithm over the downstream edges between `hubs`.
///
/// Returns the full order and the residual part of it: hubs still holding
/// in-degree after the queue drained, appended in discovery order.
pub fn topo_order<G: HostGraph + ?Sized>(
    graph: &G,
    config: &HubConfig,
    hubs: &[NodeId],
) -> (Vec<NodeId>, Vec<NodeId>) {
    let members: HashSet<NodeId> = hubs.iter().copied().collect();
    let mut in_degree: HashMap<NodeId, usize> = hubs.iter().map(|h| (*h, 0)).collect();
    let mut adj_list: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    for &hub in hubs {
        let mut targets = find_downstream_hubs(graph, config, hub);
        targets.retain(|t| members.contains(t));
        for &target in &targets {
            *in_degree.entry(target).or_insert(0) += 1;
        }
        adj_list.insert(hub, targets);
    }

    let mut queue: VecDeque<NodeId> = hubs.iter().copied().filter(|h| in_degree[h] == 0).collect();
    let mut order = Vec::with_capacity(hubs.len());
    while let Some(hub) = queue.pop_front() {
        order.push(hub);
        for neighbor in adj_list.get(&hub).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(neighbor) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*neighbor);
                }
            }
        }
    }

    let placed: HashSet<NodeId> = order.iter().copied().collect();
    let residual: Vec<NodeId> = hubs.iter().copied().filter(|h| !placed.contains(h)).collect();
    order.extend(residual.iter().copied());
    (order, residual)
}

/// The full per-hub pipeline, in fixed order
pub fn reconcile_hub<G: HostGraph + ?Sized>(editor: &mut HubEditor<'_, G>, hub: NodeId) -> GraphResult<()> {
    editor.sweep_ports(hub)?;
    editor.refresh_inherited_meta(hub)?;
    editor.apply_all_labels(hub)?;
    editor.ensure_pair_count(hub)?;
    editor.sweep_ports(hub)?;
    editor.dedupe_labels(hub)
}

/// Reconciles every hub connected to `root`, upstream hubs first
pub fn fix_component<G: HostGraph + ?Sized>(editor: &mut HubEditor<'_, G>, root: NodeId) -> GraphResult<FixReport> {
    let hubs = collect_connected_hubs(&*editor.graph, editor.config, root);
    let (order, residual) = topo_order(&*editor.graph, editor.config, &hubs);
    if !residual.is_empty() {
        warn!(
            "Hub network around {} has a cycle through {:?}; run Fix again if labels are stale",
            root, residual
        );
    }

    for &hub in &order {
        editor.states.register(hub);
        reconcile_hub(editor, hub)?;
    }

    info!("Fixed {} hubs from hub {}", order.len(), root);
    Ok(FixReport { root, order, residual })
}

/// Fix entry point for commands and the boot scan. Errors are logged, never raised.
pub fn run_fix<G: HostGraph + ?Sized>(editor: &mut HubEditor<'_, G>, root: NodeId) -> Option<FixReport> {
    match fix_component(editor, root) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Fix from hub {} failed: {}", root, e);
            None
        }
    }
}

/// First wave of a cascade out of `origin`, with `origin` already marked seen
pub fn seed_cascade<G: HostGraph + ?Sized>(
    graph: &G,
    config: &HubConfig,
    origin: NodeId,
) -> (Vec<NodeId>, HashSet<NodeId>) {
    let mut seen = HashSet::from([origin]);
    let frontier: Vec<NodeId> = find_downstream_hubs(graph, config, origin)
        .into_iter()
        .filter(|hub| seen.insert(*hub))
        .collect();
    (frontier, seen)
}

/// Reconciles one wave and returns the next, marking it seen
pub fn cascade_wave<G: HostGraph + ?Sized>(
    editor: &mut HubEditor<'_, G>,
    frontier: &[NodeId],
    seen: &mut HashSet<NodeId>,
) -> Vec<NodeId> {
    let mut next = Vec::new();
    for &hub in frontier {
        if !editor.graph.node(hub).is_some_and(|n| is_hub(n, editor.config)) {
            debug!("Cascade skips vanished hub {}", hub);
            continue;
        }
        editor.states.register(hub);
        if let Err(e) = reconcile_hub(editor, hub) {
            warn!("Cascade could not update hub {}: {}", hub, e);
            continue;
        }
        for downstream in find_downstream_hubs(&*editor.graph, editor.config, hub) {
            if seen.insert(downstream) {
                next.push(downstream);
            }
        }
    }
    debug!("Cascade wave of {} hubs queued {} more", frontier.len(), next.len());
    next
}
