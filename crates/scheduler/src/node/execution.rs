use std::collections::VecDeque;

use fogsim_core::{SimTime, Task};
use tracing::debug;

use crate::sla::SlaSample;

use super::discipline::{AdaptiveState, Discipline};
use super::SchedulingNode;

/// Relative tolerance on work units, scaled by the step capacity.
///
/// Repeated partial steps leave rounding residue in `remaining`; work within
/// this margin of the budget counts as finished.
const WORK_EPSILON: f64 = 1e-9;

/// Per-step budget shared by every discipline.
struct Budget {
    left: f64,
    tolerance: f64,
}

impl Budget {
    fn new(capacity: f64) -> Self {
        Self {
            left: capacity,
            tolerance: capacity * WORK_EPSILON,
        }
    }

    fn has_room(&self) -> bool {
        self.left > self.tolerance
    }

    /// Spend up to `task.remaining`. Returns `true` when the task finished.
    fn spend_on(&mut self, task: &mut Task) -> bool {
        if task.remaining > self.left + self.tolerance {
            task.remaining -= self.left;
            self.left = 0.0;
            return false;
        }
        self.left = (self.left - task.remaining).max(0.0);
        task.remaining = 0.0;
        true
    }
}

impl SchedulingNode {
    /// Spend one step of capacity starting at `now`.
    ///
    /// Capacity is `cpu_capacity * dt`; it never carries over between steps.
    /// Completed tasks are stamped `now + dt` and returned in completion
    /// order. Under the adaptive policy the SLA window is evaluated after
    /// execution when a window boundary has been reached.
    pub fn step(&mut self, now: SimTime, dt: f64) -> Vec<Task> {
        let capacity = self.config.cpu_capacity * dt;
        let mut budget = Budget::new(capacity);
        let mut completed = Vec::new();
        let done_at = now + dt;

        match &mut self.discipline {
            Discipline::Fifo { queue } => {
                drain_in_order([queue], now, done_at, &mut budget, &mut completed);
            }
            Discipline::EmergencyFirst { emergency, normal } => {
                let lanes = [emergency, normal];
                drain_in_order(lanes, now, done_at, &mut budget, &mut completed);
            }
            Discipline::StaticPriority { queues } => {
                drain_in_order(queues.lanes_mut(), now, done_at, &mut budget, &mut completed);
            }
            Discipline::SlaDynamic(state) => {
                state.execute(now, done_at, &mut budget, &mut completed);
            }
        }

        self.metrics.work_done += capacity - budget.left;
        self.metrics.completed += completed.len() as u64;

        if self.evaluate_window(now).is_some() {
            self.metrics.window_updates += 1;
        }
        completed
    }

    /// Run the SLA aggregator and weight adapter if a window boundary has passed.
    ///
    /// Returns the sample that drove the update. The boundary clock advances
    /// even when the window holds no completions; in that case the weights
    /// are left untouched. Calling again at the same instant is a no-op.
    pub fn evaluate_window(&mut self, now: SimTime) -> Option<SlaSample> {
        let Discipline::SlaDynamic(state) = &mut self.discipline else {
            return None;
        };
        if now - state.last_window < state.window_length {
            return None;
        }
        state.last_window = now;

        let Some(sample) = state.window.sample(now) else {
            debug!(node = self.id, now, "SLA window empty, weights unchanged");
            return None;
        };
        state.adapter.update(&sample);
        Some(sample)
    }
}

impl AdaptiveState {
    fn execute(
        &mut self,
        now: SimTime,
        done_at: SimTime,
        budget: &mut Budget,
        completed: &mut Vec<Task>,
    ) {
        while budget.has_room() {
            if let Some(task) = self.running.as_mut() {
                if !budget.spend_on(task) {
                    break;
                }
                task.completion = Some(done_at);
                if let Some(done) = self.running.take() {
                    self.window.record(&done);
                    completed.push(done);
                }
            }

            if !budget.has_room() {
                break;
            }
            let Some(mut next) = self.take_next(now) else {
                break;
            };
            next.start.get_or_insert(now);
            self.running = Some(next);
        }
    }
}

/// Serve lanes strictly in order, each from its head, until the budget runs out.
///
/// The task being served stays at the head of its lane until it completes.
fn drain_in_order<'a>(
    lanes: impl IntoIterator<Item = &'a mut VecDeque<Task>>,
    now: SimTime,
    done_at: SimTime,
    budget: &mut Budget,
    completed: &mut Vec<Task>,
) {
    for lane in lanes {
        while budget.has_room() {
            let Some(head) = lane.front_mut() else {
                break;
            };
            head.start.get_or_insert(now);
            if !budget.spend_on(head) {
                break;
            }
            head.completion = Some(done_at);
            if let Some(done) = lane.pop_front() {
                completed.push(done);
            }
        }
    }
}
