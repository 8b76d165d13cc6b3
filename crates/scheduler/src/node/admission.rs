use fogsim_core::Task;
use tracing::debug;

use crate::admission::{self, Admission};
use crate::priority::score;

use super::discipline::{AdaptiveState, Discipline};
use super::SchedulingNode;

impl SchedulingNode {
    /// Offer a newly arrived task to this node.
    ///
    /// Every policy enforces the queue bound. The adaptive policy also
    /// rejects tasks that cannot meet their deadline behind the current
    /// backlog, and may hand the execution slot to the new task.
    pub fn offer(&mut self, mut task: Task) -> Admission {
        task.assigned_node = Some(self.id);
        let outcome = self.enqueue(task);
        self.metrics.record_admission(outcome);
        outcome
    }

    fn enqueue(&mut self, task: Task) -> Admission {
        if let Some(max) = self.config.max_queue_length {
            if self.discipline.len() >= max {
                debug!(node = self.id, task = task.id, max, "Rejected: queue full");
                return Admission::RejectedQueueFull;
            }
        }

        let capacity = self.config.cpu_capacity;
        match &mut self.discipline {
            Discipline::Fifo { queue } => queue.push_back(task),
            Discipline::EmergencyFirst { emergency, normal } => {
                if task.class.is_emergency() {
                    emergency.push_back(task);
                } else {
                    normal.push_back(task);
                }
            }
            Discipline::StaticPriority { queues } => queues.push_back(task),
            Discipline::SlaDynamic(state) => {
                let backlog = state.backlog();
                if !admission::is_feasible(&task, backlog, capacity) {
                    debug!(
                        node = self.id,
                        task = task.id,
                        class = %task.class,
                        backlog,
                        predicted = admission::predicted_finish(&task, backlog, capacity),
                        deadline = task.absolute_deadline,
                        "Rejected: deadline infeasible"
                    );
                    return Admission::RejectedDeadlineInfeasible;
                }
                if state.admit(task) {
                    self.metrics.preemptions += 1;
                }
            }
        }
        Admission::Admitted
    }
}

impl AdaptiveState {
    /// Queue an admitted task, or swap it into the execution slot if it
    /// outscores the running task at its arrival instant.
    ///
    /// Returns `true` when the running task was preempted.
    fn admit(&mut self, mut task: Task) -> bool {
        if !self.preemption {
            self.queues.push_back(task);
            return false;
        }
        let Some(running) = self.running.as_ref() else {
            self.queues.push_back(task);
            return false;
        };

        let at = task.arrival;
        let weights = self.adapter.weights();
        if score(&task, at, &weights) <= score(running, at, &weights) {
            self.queues.push_back(task);
            return false;
        }

        task.start.get_or_insert(at);
        debug!(
            task = task.id,
            displaced = running.id,
            "Preempting running task"
        );
        if let Some(displaced) = self.running.replace(task) {
            self.queues.push_front(displaced);
        }
        true
    }
}
