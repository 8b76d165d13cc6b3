//! Run-wide statistics and the final report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fogsim_core::{NodeId, Policy, Position, ServiceKind, SimTime, Task, TaskClass};
use fogsim_scheduler::{Admission, NodeMetrics, Weights};
use serde::Serialize;
use uuid::Uuid;

use crate::topology::Topology;

/// Drop reason for tasks that did not fit the node's link budget.
pub const LINK_CAPACITY: &str = "link_capacity";

/// Counters for one service kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KindStats {
    pub generated: u64,
    pub completed: u64,
    pub dropped: u64,
}

#[derive(Debug, Clone, Default)]
struct ClassStats {
    generated: u64,
    admitted: u64,
    completed: u64,
    dropped: u64,
    rejected: u64,
    deadline_met: u64,
    deadline_violated: u64,
    latencies: Vec<f64>,
    waiting_times: Vec<f64>,
}

/// Accumulates per-step and per-run statistics as the simulation advances.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    generated: u64,
    admitted: u64,
    completed: u64,
    /// Queue-full and link-capacity losses.
    dropped: u64,
    /// Deadline-infeasible refusals.
    rejected: u64,
    drop_reasons: BTreeMap<&'static str, u64>,
    kinds: BTreeMap<ServiceKind, KindStats>,
    classes: [ClassStats; 3],
    latencies: Vec<f64>,

    step_generated: u64,
    step_completed: u64,
    step_dropped: u64,
    series: StepSeries,
}

/// Per-step time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepSeries {
    pub generated: Vec<u64>,
    pub completed: Vec<u64>,
    /// Dropped plus rejected.
    pub dropped: Vec<u64>,
    pub avg_queue_length: Vec<f64>,
    pub max_queue_length: Vec<usize>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_generated(&mut self, tasks: &[Task]) {
        for task in tasks {
            self.generated += 1;
            self.step_generated += 1;
            self.kinds.entry(task.kind).or_default().generated += 1;
            self.classes[task.class.index()].generated += 1;
        }
    }

    /// Record the node's answer to an offer.
    pub fn record_admission(&mut self, task: &Task, outcome: Admission) {
        let class = &mut self.classes[task.class.index()];
        let Some(reason) = outcome.reason() else {
            self.admitted += 1;
            class.admitted += 1;
            return;
        };
        if outcome == Admission::RejectedDeadlineInfeasible {
            class.rejected += 1;
            self.rejected += 1;
            self.step_dropped += 1;
            *self.drop_reasons.entry(reason).or_default() += 1;
        } else {
            class.dropped += 1;
            self.record_drop(task, reason);
        }
    }

    /// Record a task lost before reaching the scheduler.
    pub fn record_link_drop(&mut self, task: &Task) {
        self.classes[task.class.index()].dropped += 1;
        self.record_drop(task, LINK_CAPACITY);
    }

    fn record_drop(&mut self, task: &Task, reason: &'static str) {
        self.dropped += 1;
        self.step_dropped += 1;
        self.kinds.entry(task.kind).or_default().dropped += 1;
        *self.drop_reasons.entry(reason).or_default() += 1;
    }

    pub fn record_completed(&mut self, tasks: &[Task]) {
        for task in tasks {
            self.completed += 1;
            self.step_completed += 1;
            self.kinds.entry(task.kind).or_default().completed += 1;

            let class = &mut self.classes[task.class.index()];
            class.completed += 1;
            if let Some(latency) = task.latency() {
                self.latencies.push(latency);
                class.latencies.push(latency);
            }
            if let Some(wait) = task.waiting_time() {
                class.waiting_times.push(wait);
            }
            match task.deadline_met() {
                Some(true) => class.deadline_met += 1,
                Some(false) => class.deadline_violated += 1,
                None => {}
            }
        }
    }

    /// Record queue lengths observed after the step's execution.
    pub fn record_queue_lengths(&mut self, lengths: impl IntoIterator<Item = usize>) {
        let lengths: Vec<usize> = lengths.into_iter().collect();
        if lengths.is_empty() {
            return;
        }
        let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        let max = lengths.iter().copied().max().unwrap_or(0);
        self.series.avg_queue_length.push(avg);
        self.series.max_queue_length.push(max);
    }

    /// Close the current step's series entries.
    pub fn end_step(&mut self) {
        self.series.generated.push(self.step_generated);
        self.series.completed.push(self.step_completed);
        self.series.dropped.push(self.step_dropped);
        self.step_generated = 0;
        self.step_completed = 0;
        self.step_dropped = 0;
    }

    pub fn generated(&self) -> u64 {
        self.generated
    }

    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn drop_reason(&self, reason: &str) -> u64 {
        self.drop_reasons.get(reason).copied().unwrap_or(0)
    }

    pub fn series(&self) -> &StepSeries {
        &self.series
    }

    /// Build the final report.
    pub fn report(
        &self,
        policy: Policy,
        sim_time: SimTime,
        topology: &Topology,
    ) -> SimulationReport {
        let deadline_met: u64 = self.classes.iter().map(|c| c.deadline_met).sum();
        let deadline_violated: u64 = self.classes.iter().map(|c| c.deadline_violated).sum();

        let emergency = &self.classes[TaskClass::Emergency.index()];
        let non_emergency: Vec<f64> = TaskClass::ALL
            .iter()
            .filter(|c| !c.is_emergency())
            .flat_map(|c| self.classes[c.index()].latencies.iter().copied())
            .collect();

        let classes = TaskClass::ALL
            .iter()
            .map(|&class| (class, ClassSummary::from_stats(&self.classes[class.index()])))
            .collect();

        let nodes = topology
            .sites()
            .iter()
            .map(|site| NodeSummary {
                id: site.id(),
                position: site.position,
                queue_length: site.node.queue_len(),
                backlog: site.node.backlog(),
                weights: site.node.weights(),
                lambdas: site.node.lambdas(),
                metrics: site.node.metrics().clone(),
            })
            .collect::<Vec<_>>();
        let outstanding = nodes.iter().map(|n| n.queue_length as u64).sum();

        SimulationReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            policy,
            sim_time,
            steps: self.series.generated.len() as u64,
            total_generated: self.generated,
            total_admitted: self.admitted,
            total_completed: self.completed,
            total_dropped: self.dropped,
            total_rejected: self.rejected,
            outstanding,
            completion_ratio: ratio(self.completed, self.generated),
            admission_rate: ratio(self.admitted, self.generated).unwrap_or(0.0),
            avg_latency: mean(&self.latencies),
            max_latency: self.latencies.iter().copied().reduce(f64::max),
            emergency_avg_latency: mean(&emergency.latencies),
            non_emergency_avg_latency: mean(&non_emergency),
            deadline_met,
            deadline_violated,
            deadline_met_rate: ratio(deadline_met, deadline_met + deadline_violated).unwrap_or(0.0),
            avg_queue_length: mean(&self.series.avg_queue_length),
            max_queue_length: self.series.max_queue_length.iter().copied().max(),
            drop_reasons: self
                .drop_reasons
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            classes,
            kinds: self.kinds.clone(),
            nodes,
            series: self.series.clone(),
        }
    }
}

fn ratio(num: u64, den: u64) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

// ── Report ───────────────────────────────────────────────────

/// Per-class outcome summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub generated: u64,
    pub admitted: u64,
    pub completed: u64,
    pub dropped: u64,
    pub rejected: u64,
    pub deadline_met: u64,
    pub deadline_violated: u64,
    /// Share of completions that met their deadline (0 when none completed).
    pub deadline_met_rate: f64,
    pub completion_ratio: Option<f64>,
    pub avg_latency: Option<f64>,
    pub avg_waiting_time: Option<f64>,
}

impl ClassSummary {
    fn from_stats(stats: &ClassStats) -> Self {
        Self {
            generated: stats.generated,
            admitted: stats.admitted,
            completed: stats.completed,
            dropped: stats.dropped,
            rejected: stats.rejected,
            deadline_met: stats.deadline_met,
            deadline_violated: stats.deadline_violated,
            deadline_met_rate: ratio(
                stats.deadline_met,
                stats.deadline_met + stats.deadline_violated,
            )
            .unwrap_or(0.0),
            completion_ratio: ratio(stats.completed, stats.generated),
            avg_latency: mean(&stats.latencies),
            avg_waiting_time: mean(&stats.waiting_times),
        }
    }
}

/// End-of-run state of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub position: Position,
    /// Tasks still held at the end of the run.
    pub queue_length: usize,
    pub backlog: f64,
    /// Final priority weights (adaptive policy only).
    pub weights: Option<Weights>,
    pub lambdas: Option<[f64; 3]>,
    pub metrics: NodeMetrics,
}

/// Summary of one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub policy: Policy,
    pub sim_time: SimTime,
    pub steps: u64,

    pub total_generated: u64,
    pub total_admitted: u64,
    pub total_completed: u64,
    /// Lost to a full queue or the link budget.
    pub total_dropped: u64,
    /// Refused by the deadline feasibility check.
    pub total_rejected: u64,
    /// Admitted but not completed when the run ended.
    pub outstanding: u64,

    pub completion_ratio: Option<f64>,
    pub admission_rate: f64,
    pub avg_latency: Option<f64>,
    pub max_latency: Option<f64>,
    pub emergency_avg_latency: Option<f64>,
    pub non_emergency_avg_latency: Option<f64>,
    pub deadline_met: u64,
    pub deadline_violated: u64,
    pub deadline_met_rate: f64,
    pub avg_queue_length: Option<f64>,
    pub max_queue_length: Option<usize>,

    pub drop_reasons: BTreeMap<String, u64>,
    pub classes: BTreeMap<TaskClass, ClassSummary>,
    pub kinds: BTreeMap<ServiceKind, KindStats>,
    pub nodes: Vec<NodeSummary>,
    pub series: StepSeries,
}

impl SimulationReport {
    pub fn class(&self, class: TaskClass) -> Option<&ClassSummary> {
        self.classes.get(&class)
    }
}
