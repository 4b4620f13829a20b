//! Single-threaded work queue with a virtual clock
//!
//! Tasks run in due order, ties broken by scheduling order. The engine drains
//! everything due at once per settle; anything queued while settling waits
//! for the next one.

use crate::nodes::{NodeId, SlotSide};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Deferred engine work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// First reconcile of a newly created hub
    InitialSettle { node: NodeId },
    /// Local update after a hub's connections changed
    ConnectionChanged { node: NodeId, side: SlotSide, slot: usize },
    /// One breadth-first cascade wave
    CascadeWave { frontier: Vec<NodeId>, seen: HashSet<NodeId> },
    /// Cold start poll of a new hub
    ColdStart { node: NodeId, attempts_left: u32 },
    /// Fix from every hub after the graph loaded
    BootScan,
}

impl Task {
    /// Node this task is about, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Task::InitialSettle { node }
            | Task::ConnectionChanged { node, .. }
            | Task::ColdStart { node, .. } => Some(*node),
            Task::CascadeWave { .. } | Task::BootScan => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queues `task` to run `delay` from now
    pub fn schedule(&mut self, delay: Duration, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((self.now + delay, seq), task);
    }

    /// Removes and returns every task due by now, in run order
    pub fn take_due(&mut self) -> Vec<Task> {
        let later = self.queue.split_off(&(self.now, u64::MAX));
        let due = std::mem::replace(&mut self.queue, later);
        due.into_values().collect()
    }

    /// Moves the clock forward to `time`; never backwards
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    pub fn advance(&mut self, elapsed: Duration) {
        self.now += elapsed;
    }

    /// Due time of the earliest queued task
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Jumps the clock to the next due task. Returns false when idle.
    pub fn jump_to_next(&mut self) -> bool {
        match self.next_due() {
            Some(due) => {
                self.advance_to(due);
                true
            }
            None => false,
        }
    }

    /// Drops every queued task matching `predicate`
    pub fn cancel(&mut self, predicate: impl Fn(&Task) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, task| !predicate(task));
        before - self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
