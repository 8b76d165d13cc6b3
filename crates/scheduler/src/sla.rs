//! Trailing window of completions and the three SLA ratios computed over it.

use std::collections::VecDeque;

use fogsim_core::{SimTime, Task, TaskClass};
use serde::Serialize;

const LATENCY_FLOOR: f64 = 1e-9;

/// SLA measurements over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlaSample {
    /// Fraction of Emergency completions that missed their deadline.
    pub j1: f64,
    /// Mean end-to-end latency over all completions, seconds.
    pub j2: f64,
    /// Mean Normal latency divided by mean Emergency latency.
    pub j3: f64,
    /// Completions the ratios were computed from.
    pub completions: usize,
}

#[derive(Debug, Clone, Copy)]
struct CompletionRecord {
    class: TaskClass,
    latency: f64,
    completion: SimTime,
    missed: bool,
}

/// Completed tasks of the last `horizon` seconds.
#[derive(Debug, Clone)]
pub struct CompletionWindow {
    horizon: f64,
    records: VecDeque<CompletionRecord>,
}

impl CompletionWindow {
    pub fn new(horizon: f64) -> Self {
        Self {
            horizon,
            records: VecDeque::new(),
        }
    }

    /// Add a completed task. Tasks without a completion stamp are ignored.
    pub fn record(&mut self, task: &Task) {
        let (Some(completion), Some(latency)) = (task.completion, task.latency()) else {
            return;
        };
        self.records.push_back(CompletionRecord {
            class: task.class,
            latency,
            completion,
            missed: completion > task.absolute_deadline,
        });
    }

    /// Drop completions older than `now - horizon`.
    pub fn prune(&mut self, now: SimTime) {
        let cutoff = now - self.horizon;
        // Completion stamps are recorded in non-decreasing order.
        while self.records.front().is_some_and(|r| r.completion < cutoff) {
            self.records.pop_front();
        }
    }

    /// Compute J1/J2/J3 over the trailing window ending at `now`.
    ///
    /// Returns `None` if no task completed inside the window.
    pub fn sample(&mut self, now: SimTime) -> Option<SlaSample> {
        self.prune(now);
        if self.records.is_empty() {
            return None;
        }

        let mut emergency = LatencyStats::default();
        let mut normal = LatencyStats::default();
        let mut all = LatencyStats::default();
        let mut emergency_missed = 0usize;

        for r in &self.records {
            all.add(r.latency);
            match r.class {
                TaskClass::Emergency => {
                    emergency.add(r.latency);
                    if r.missed {
                        emergency_missed += 1;
                    }
                }
                TaskClass::Normal => normal.add(r.latency),
                TaskClass::Safety => {}
            }
        }

        let j1 = if emergency.count > 0 {
            emergency_missed as f64 / emergency.count as f64
        } else {
            0.0
        };
        let j2 = all.mean().unwrap_or(0.0);
        let j3 = match (normal.mean(), emergency.mean()) {
            (Some(n), Some(e)) => n / e.max(LATENCY_FLOOR),
            _ => 1.0,
        };

        Some(SlaSample {
            j1,
            j2,
            j3,
            completions: self.records.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Default)]
struct LatencyStats {
    count: usize,
    total: f64,
}

impl LatencyStats {
    fn add(&mut self, latency: f64) {
        self.count += 1;
        self.total += latency;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(class: TaskClass, arrival: f64, deadline: f64, completion: f64) -> Task {
        let mut task = Task::new(0, class, arrival, 1.0, deadline);
        task.start = Some(arrival);
        task.remaining = 0.0;
        task.completion = Some(completion);
        task
    }

    #[test]
    fn empty_window_yields_none() {
        let mut window = CompletionWindow::new(10.0);
        assert!(window.sample(5.0).is_none());
    }

    #[test]
    fn ratios_over_mixed_window() {
        let mut window = CompletionWindow::new(10.0);
        // Emergency: one met (latency 2), one missed (latency 6 > deadline 5)
        window.record(&completed(TaskClass::Emergency, 0.0, 5.0, 2.0));
        window.record(&completed(TaskClass::Emergency, 0.0, 5.0, 6.0));
        // Normal latency 8
        window.record(&completed(TaskClass::Normal, 0.0, 60.0, 8.0));
        // Safety latency 4
        window.record(&completed(TaskClass::Safety, 0.0, 20.0, 4.0));

        let s = window.sample(9.0).unwrap();
        assert_eq!(s.completions, 4);
        assert_eq!(s.j1, 0.5);
        assert_eq!(s.j2, 5.0);
        assert_eq!(s.j3, 2.0);
    }

    #[test]
    fn j3_defaults_without_both_groups() {
        let mut window = CompletionWindow::new(10.0);
        window.record(&completed(TaskClass::Normal, 0.0, 60.0, 8.0));
        let s = window.sample(8.0).unwrap();
        assert_eq!(s.j1, 0.0);
        assert_eq!(s.j3, 1.0);
    }

    #[test]
    fn old_completions_leave_window() {
        let mut window = CompletionWindow::new(10.0);
        window.record(&completed(TaskClass::Emergency, 0.0, 1.0, 2.0));
        window.record(&completed(TaskClass::Normal, 10.0, 60.0, 15.0));

        let s = window.sample(20.0).unwrap();
        assert_eq!(s.completions, 1);
        assert_eq!(s.j1, 0.0);
        assert_eq!(window.len(), 1);

        assert!(window.sample(40.0).is_none());
        assert!(window.is_empty());
    }

    #[test]
    fn boundary_completion_is_inside() {
        let mut window = CompletionWindow::new(10.0);
        window.record(&completed(TaskClass::Safety, 0.0, 20.0, 5.0));
        assert!(window.sample(15.0).is_some());
    }

    #[test]
    fn unfinished_tasks_are_ignored() {
        let mut window = CompletionWindow::new(10.0);
        window.record(&Task::new(0, TaskClass::Emergency, 0.0, 1.0, 1.0));
        assert!(window.is_empty());
    }
}
