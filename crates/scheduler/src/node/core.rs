use fogsim_core::{NodeConfig, NodeId, Policy, SimError, SimTime, Task};
use tracing::debug;

use crate::metrics::NodeMetrics;
use crate::priority::Weights;

use super::discipline::Discipline;

/// A compute node that admits, prioritizes and executes tasks.
///
/// All queue and adaptive state is owned by the node and mutated only
/// through `&mut self`, so nodes can be stepped on separate workers without
/// any shared state.
#[derive(Debug)]
pub struct SchedulingNode {
    pub(super) id: NodeId,
    pub(super) config: NodeConfig,
    pub(super) discipline: Discipline,
    pub(super) metrics: NodeMetrics,
}

impl SchedulingNode {
    /// Build a node. Fails fast on an invalid configuration.
    pub fn new(id: NodeId, config: NodeConfig) -> Result<Self, SimError> {
        config.validate()?;
        let discipline = Discipline::for_config(&config);
        if let Some(state) = discipline.adaptive() {
            let w = state.adapter.weights();
            Weights::new(w.alpha, w.beta, w.gamma)?;
        }
        debug!(node = id, policy = %config.policy, "Scheduling node created");
        Ok(Self {
            id,
            config,
            discipline,
            metrics: NodeMetrics::default(),
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn policy(&self) -> Policy {
        self.config.policy
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Queued tasks, plus the running task under the adaptive policy.
    pub fn queue_len(&self) -> usize {
        self.discipline.len()
    }

    /// Outstanding work units held by the node.
    pub fn backlog(&self) -> f64 {
        self.discipline.backlog()
    }

    /// Every task the node currently owns.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.discipline.tasks()
    }

    /// Task in the execution slot (adaptive policy only).
    pub fn running(&self) -> Option<&Task> {
        self.discipline.adaptive().and_then(|s| s.running.as_ref())
    }

    /// Current priority weights (adaptive policy only).
    pub fn weights(&self) -> Option<Weights> {
        self.discipline.adaptive().map(|s| s.adapter.weights())
    }

    /// Current dual variables (adaptive policy only).
    pub fn lambdas(&self) -> Option<[f64; 3]> {
        self.discipline.adaptive().map(|s| s.adapter.lambdas())
    }

    /// Time of the last SLA window evaluation (adaptive policy only).
    pub fn last_window_time(&self) -> Option<SimTime> {
        self.discipline.adaptive().map(|s| s.last_window)
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }
}
