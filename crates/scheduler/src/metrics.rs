use serde::Serialize;

use crate::admission::Admission;

/// Per-node counters exposed to the metrics collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeMetrics {
    /// Tasks accepted into a queue or the execution slot.
    pub admitted: u64,
    /// Tasks refused because the queue bound was reached.
    pub rejected_queue_full: u64,
    /// Tasks refused by the deadline feasibility check.
    pub rejected_deadline: u64,
    /// Tasks that finished all of their work.
    pub completed: u64,
    /// Running tasks displaced by a higher-scoring arrival.
    pub preemptions: u64,
    /// SLA windows that produced a weight update.
    pub window_updates: u64,
    /// Total work units executed.
    pub work_done: f64,
}

impl NodeMetrics {
    /// Record the outcome of one offer.
    pub fn record_admission(&mut self, outcome: Admission) {
        match outcome {
            Admission::Admitted => self.admitted += 1,
            Admission::RejectedQueueFull => self.rejected_queue_full += 1,
            Admission::RejectedDeadlineInfeasible => self.rejected_deadline += 1,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.rejected_queue_full + self.rejected_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_outcomes() {
        let mut m = NodeMetrics::default();
        m.record_admission(Admission::Admitted);
        m.record_admission(Admission::Admitted);
        m.record_admission(Admission::RejectedQueueFull);
        m.record_admission(Admission::RejectedDeadlineInfeasible);

        assert_eq!(m.admitted, 2);
        assert_eq!(m.rejected_queue_full, 1);
        assert_eq!(m.rejected_deadline, 1);
        assert_eq!(m.rejected(), 2);
    }

    #[test]
    fn default_metrics() {
        let m = NodeMetrics::default();
        assert_eq!(m.completed, 0);
        assert_eq!(m.work_done, 0.0);
    }
}
