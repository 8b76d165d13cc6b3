use fogsim_core::{SimTime, Task, TaskClass, TaskId};

use crate::priority::{score, Weights};
use crate::queues::ClassQueues;

use super::discipline::AdaptiveState;
use super::SchedulingNode;

/// Highest-priority queued task at `now`.
///
/// Ties on score go to the smaller slack, then to the longer wait. A full
/// tie keeps the first task met in lane order.
pub(crate) fn select(
    queues: &ClassQueues,
    now: SimTime,
    weights: &Weights,
) -> Option<(TaskClass, usize)> {
    let mut best: Option<(TaskClass, usize, &Task, f64)> = None;

    for class in TaskClass::ALL {
        for (idx, task) in queues.lane(class).iter().enumerate() {
            let s = score(task, now, weights);
            let better = match best {
                None => true,
                Some((_, _, current, current_score)) => {
                    if s != current_score {
                        s > current_score
                    } else if task.slack(now) != current.slack(now) {
                        task.slack(now) < current.slack(now)
                    } else {
                        task.waited(now) > current.waited(now)
                    }
                }
            };
            if better {
                best = Some((class, idx, task, s));
            }
        }
    }

    best.map(|(class, idx, _, _)| (class, idx))
}

impl AdaptiveState {
    /// Remove and return the task that should run next.
    pub(crate) fn take_next(&mut self, now: SimTime) -> Option<Task> {
        let weights = self.adapter.weights();
        let (class, idx) = select(&self.queues, now, &weights)?;
        self.queues.remove(class, idx)
    }
}

impl SchedulingNode {
    /// Id of the task the adaptive policy would pull into the slot at `now`.
    ///
    /// `None` for the fixed policies or when every queue is empty.
    pub fn next_candidate(&self, now: SimTime) -> Option<TaskId> {
        let state = self.discipline.adaptive()?;
        let weights = state.adapter.weights();
        let (class, idx) = select(&state.queues, now, &weights)?;
        state.queues.lane(class).get(idx).map(|t| t.id)
    }
}
