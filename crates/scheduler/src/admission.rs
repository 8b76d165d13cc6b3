//! Admission outcomes and the deadline feasibility predicate.

use fogsim_core::{SimTime, Task};
use serde::{Deserialize, Serialize};

/// Result of offering a task to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    Admitted,
    /// The node's queue bound was already reached.
    RejectedQueueFull,
    /// Queued behind the current backlog, the task could not finish by its deadline.
    RejectedDeadlineInfeasible,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Admission::Admitted
    }

    /// Reason label used in drop statistics. `None` when admitted.
    pub fn reason(self) -> Option<&'static str> {
        match self {
            Admission::Admitted => None,
            Admission::RejectedQueueFull => Some("queue_full"),
            Admission::RejectedDeadlineInfeasible => Some("deadline_infeasible"),
        }
    }
}

/// Finish time of `task` if it were queued behind `backlog` work units now.
///
/// `backlog` is the remaining work of every queued task plus the running one.
pub fn predicted_finish(task: &Task, backlog: f64, capacity: f64) -> SimTime {
    task.arrival + (backlog + task.demand) / capacity
}

/// Whether `task` can still meet its deadline behind `backlog`.
///
/// Only the backlog at offer time is considered; tasks admitted later can
/// still push an admitted task past its deadline.
pub fn is_feasible(task: &Task, backlog: f64, capacity: f64) -> bool {
    predicted_finish(task, backlog, capacity) <= task.absolute_deadline
}
