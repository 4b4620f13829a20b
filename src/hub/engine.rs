//! Host-facing engine: event handlers, commands and the deferred work loop

use super::cascade::{cascade_wave, run_fix, seed_cascade, FixReport};
use super::ports::HubEditor;
use super::role::is_hub;
use super::scheduler::{Scheduler, Task};
use super::state::{HubState, HubStates};
use crate::config::HubConfig;
use crate::constants::{hub, timing};
use crate::error::GraphResult;
use crate::nodes::port::pair_index;
use crate::nodes::{HostGraph, NodeId, SlotSide};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::time::Duration;

/// Commands a host can invoke on a hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubCommand {
    Fix,
}

/// A context menu entry contributed for a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub content: String,
    pub command: HubCommand,
}

/// Keeps hub ports and labels in sync with the graph they live in.
///
/// The host forwards node lifecycle and connection events, then calls
/// [`settle`](Self::settle) or [`advance`](Self::advance) from its event
/// loop so deferred work runs between its own mutations.
#[derive(Debug, Default)]
pub struct PipeHubEngine {
    config: HubConfig,
    states: HubStates,
    scheduler: Scheduler,
    boot_requested: bool,
}

impl PipeHubEngine {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn states(&self) -> &HubStates {
        &self.states
    }

    pub fn hub_state(&self, id: NodeId) -> Option<&HubState> {
        self.states.get(id)
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Number of queued tasks
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_empty()
    }

    fn is_hub_node<G: HostGraph + ?Sized>(&self, graph: &G, id: NodeId) -> bool {
        graph.node(id).is_some_and(|n| is_hub(n, &self.config))
    }

    /// Sets up a new hub and queues its first reconcile and cold start polling
    pub fn on_node_created<G: HostGraph + ?Sized>(&mut self, graph: &mut G, id: NodeId) {
        if !self.is_hub_node(graph, id) {
            return;
        }
        if let Err(e) = graph.set_title(id, &self.config.hub_title) {
            warn!("Could not title hub {}: {}", id, e);
        }
        self.states.register(id);
        self.scheduler.schedule(Duration::ZERO, Task::InitialSettle { node: id });
        if self.config.cold_start_attempts > 0 {
            self.scheduler.schedule(
                self.config.cold_start_interval(),
                Task::ColdStart {
                    node: id,
                    attempts_left: self.config.cold_start_attempts,
                },
            );
        }
        debug!("Registered hub {}", id);
    }

    /// Drops a removed node's state and its pending cold start polling
    pub fn on_node_removed(&mut self, id: NodeId) {
        if self.states.remove(id).is_some() {
            let cancelled = self
                .scheduler
                .cancel(|task| matches!(task, Task::ColdStart { .. }) && task.node() == Some(id));
            debug!("Forgot hub {} ({} polls cancelled)", id, cancelled);
        }
    }

    /// Queues the local update for a hub whose connections changed
    pub fn on_connections_change<G: HostGraph + ?Sized>(
        &mut self,
        graph: &G,
        id: NodeId,
        side: SlotSide,
        slot: usize,
    ) {
        if !self.is_hub_node(graph, id) {
            return;
        }
        self.scheduler
            .schedule(Duration::ZERO, Task::ConnectionChanged { node: id, side, slot });
    }

    /// Reconciles the whole hub network around `id` right away
    pub fn fix<G: HostGraph + ?Sized>(&mut self, graph: &mut G, id: NodeId) -> Option<FixReport> {
        if !self.is_hub_node(graph, id) {
            return None;
        }
        let mut editor = HubEditor::new(graph, &mut self.states, &self.config);
        run_fix(&mut editor, id)
    }

    pub fn run_command<G: HostGraph + ?Sized>(&mut self, graph: &mut G, id: NodeId, command: HubCommand) {
        match command {
            HubCommand::Fix => {
                self.fix(graph, id);
            }
        }
    }

    /// Handles a click on a node's button widget
    pub fn on_widget_clicked<G: HostGraph + ?Sized>(&mut self, graph: &mut G, id: NodeId, widget: &str) {
        if widget == hub::FIX_BUTTON {
            self.run_command(graph, id, HubCommand::Fix);
        }
    }

    /// Context menu entries for `id`
    pub fn menu_options<G: HostGraph + ?Sized>(&self, graph: &G, id: NodeId) -> Vec<MenuOption> {
        if !self.is_hub_node(graph, id) {
            return Vec::new();
        }
        vec![MenuOption {
            content: hub::FIX_MENU_LABEL.to_string(),
            command: HubCommand::Fix,
        }]
    }

    /// Schedules the boot scan. Only the first call has any effect.
    pub fn on_graph_loaded(&mut self) -> bool {
        if self.boot_requested {
            return false;
        }
        self.boot_requested = true;
        self.scheduler.schedule(self.config.boot_delay(), Task::BootScan);
        true
    }

    /// Runs every task due now. Work they queue waits for the next settle.
    pub fn settle<G: HostGraph + ?Sized>(&mut self, graph: &mut G) -> usize {
        let tasks = self.scheduler.take_due();
        let ran = tasks.len();
        for task in tasks {
            self.run_task(graph, task);
        }
        ran
    }

    /// Moves the clock forward by `elapsed`, settling at every due time on the way
    pub fn advance<G: HostGraph + ?Sized>(&mut self, graph: &mut G, elapsed: Duration) -> usize {
        let target = self.scheduler.now() + elapsed;
        let mut ran = self.settle(graph);
        let mut batches = 0;
        while let Some(due) = self.scheduler.next_due().filter(|due| *due <= target) {
            batches += 1;
            if batches > timing::MAX_IDLE_BATCHES {
                warn!("Stopped advancing after {} batches", timing::MAX_IDLE_BATCHES);
                break;
            }
            self.scheduler.advance_to(due);
            ran += self.settle(graph);
        }
        self.scheduler.advance_to(target);
        ran
    }

    /// Settles until nothing is queued, jumping the clock between timers
    pub fn run_until_idle<G: HostGraph + ?Sized>(&mut self, graph: &mut G) -> usize {
        let mut ran = 0;
        for _ in 0..timing::MAX_IDLE_BATCHES {
            if !self.scheduler.jump_to_next() {
                return ran;
            }
            ran += self.settle(graph);
        }
        warn!(
            "Work queue still busy after {} batches, {} tasks left",
            timing::MAX_IDLE_BATCHES,
            self.scheduler.len()
        );
        ran
    }

    fn run_task<G: HostGraph + ?Sized>(&mut self, graph: &mut G, task: Task) {
        match task {
            Task::InitialSettle { node } => {
                if self.is_hub_node(graph, node) {
                    let mut editor = HubEditor::new(graph, &mut self.states, &self.config);
                    log_failure("initial settle", node, initial_settle(&mut editor, node));
                }
            }
            Task::ConnectionChanged { node, side, slot } => {
                if !self.is_hub_node(graph, node) {
                    return;
                }
                let mut editor = HubEditor::new(&mut *graph, &mut self.states, &self.config);
                log_failure("connection update", node, local_update(&mut editor, node, side, slot));
                let (frontier, seen) = seed_cascade(&*graph, &self.config, node);
                if !frontier.is_empty() {
                    self.scheduler
                        .schedule(Duration::ZERO, Task::CascadeWave { frontier, seen });
                }
            }
            Task::CascadeWave { frontier, mut seen } => {
                let mut editor = HubEditor::new(graph, &mut self.states, &self.config);
                let next = cascade_wave(&mut editor, &frontier, &mut seen);
                if !next.is_empty() {
                    self.scheduler
                        .schedule(Duration::ZERO, Task::CascadeWave { frontier: next, seen });
                }
            }
            Task::ColdStart { node, attempts_left } => {
                if !self.is_hub_node(graph, node) {
                    return;
                }
                let mut editor = HubEditor::new(graph, &mut self.states, &self.config);
                log_failure("cold start", node, cold_start_poll(&mut editor, node));
                let found = self
                    .states
                    .get(node)
                    .is_some_and(|state| !state.pair_meta.is_empty());
                if found {
                    debug!("Cold start of hub {} found metadata", node);
                } else if attempts_left > 1 {
                    self.scheduler.schedule(
                        self.config.cold_start_interval(),
                        Task::ColdStart {
                            node,
                            attempts_left: attempts_left - 1,
                        },
                    );
                }
            }
            Task::BootScan => self.boot_scan(graph),
        }
    }

    /// Fix from every hub, once per connected network
    fn boot_scan<G: HostGraph + ?Sized>(&mut self, graph: &mut G) {
        let config = &self.config;
        let hubs = graph.nodes_where(&|node| is_hub(node, config));
        let mut covered = HashSet::new();
        let mut networks = 0;
        for id in hubs {
            self.states.register(id);
            if covered.contains(&id) {
                continue;
            }
            let mut editor = HubEditor::new(&mut *graph, &mut self.states, &self.config);
            if let Some(report) = run_fix(&mut editor, id) {
                covered.extend(report.order);
                networks += 1;
            }
        }
        info!("Boot scan fixed {} hub networks", networks);
    }
}

fn log_failure(step: &str, node: NodeId, result: GraphResult<()>) {
    if let Err(e) = result {
        warn!("Hub {} {} failed: {}", node, step, e);
    }
}

/// Clears leftovers from a previous session and sizes a new hub
fn initial_settle<G: HostGraph + ?Sized>(editor: &mut HubEditor<'_, G>, node: NodeId) -> GraphResult<()> {
    editor.sweep_ports(node)?;
    editor.purge_free_pairs(node)?;
    editor.graph.fit_size(node)?;
    editor.ensure_pair_count(node)
}

/// Reacts to one changed slot, then resizes
fn local_update<G: HostGraph + ?Sized>(
    editor: &mut HubEditor<'_, G>,
    node: NodeId,
    side: SlotSide,
    slot: usize,
) -> GraphResult<()> {
    let name = editor.graph.node(node).and_then(|n| match side {
        SlotSide::Input => n.inputs.get(slot).map(|s| s.name.clone()),
        SlotSide::Output => n.outputs.get(slot).map(|s| s.name.clone()),
    });
    let prefix = match side {
        SlotSide::Input => hub::PAIR_INPUT_PREFIX,
        SlotSide::Output => hub::PAIR_OUTPUT_PREFIX,
    };

    match name.as_deref() {
        Some(hub::PIPE_IN) if side == SlotSide::Input => {
            editor.refresh_inherited_meta(node)?;
            editor.apply_all_labels(node)?;
        }
        Some(hub::PIPE_OUT) if side == SlotSide::Output => {}
        Some(name) => match pair_index(name, prefix) {
            Some(k) => editor.apply_pair_label(node, k)?,
            None => debug!("Hub {} ignores change on slot {}", node, name),
        },
        // The slot is already gone; relabel everything
        None => editor.apply_all_labels(node)?,
    }
    editor.ensure_pair_count(node)
}

/// One cold start attempt: pick up upstream metadata if the pipe is wired
fn cold_start_poll<G: HostGraph + ?Sized>(editor: &mut HubEditor<'_, G>, node: NodeId) -> GraphResult<()> {
    if editor.is_pipe_in_connected(node) {
        editor.refresh_inherited_meta(node)?;
        editor.apply_all_labels(node)?;
    }
    editor.ensure_pair_count(node)
}
