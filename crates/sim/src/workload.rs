//! Task arrivals at the edge.

use std::collections::VecDeque;

use fogsim_core::{CityConfig, Position, ServiceKind, SimTime, Task, TaskId, WorkloadConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of newly arrived tasks, polled once per step.
pub trait ArrivalSource: Send {
    /// Tasks arriving in the step that starts at `now`.
    fn arrivals(&mut self, now: SimTime) -> Vec<Task>;
}

/// Seeded synthetic workload.
///
/// Each step runs `max_requests_per_step` Bernoulli trials with success
/// probability `avg / max`, which approximates Poisson arrivals with mean
/// `avg` per step. Each arrival gets a service kind drawn from the catalogue
/// weights and a uniform position inside the city.
#[derive(Debug)]
pub struct WorkloadGenerator {
    rng: StdRng,
    trials: usize,
    probability: f64,
    city: CityConfig,
    /// Cumulative distribution over the kinds with non-zero weight.
    cumulative: Vec<(ServiceKind, f64)>,
    next_id: TaskId,
}

impl WorkloadGenerator {
    pub fn new(workload: &WorkloadConfig, city: &CityConfig, seed: u64) -> Self {
        let trials = workload.max_requests_per_step;
        let probability = if trials == 0 {
            0.0
        } else {
            (workload.avg_requests_per_step / trials as f64).clamp(0.0, 1.0)
        };

        let total: f64 = ServiceKind::ALL.iter().map(|k| k.arrival_weight()).sum();
        let mut acc = 0.0;
        let cumulative = ServiceKind::ALL
            .iter()
            .filter(|k| k.arrival_weight() > 0.0)
            .map(|&kind| {
                acc += kind.arrival_weight() / total;
                (kind, acc)
            })
            .collect();

        Self {
            rng: StdRng::seed_from_u64(seed),
            trials,
            probability,
            city: city.clone(),
            cumulative,
            next_id: 0,
        }
    }

    /// Ids handed out so far.
    pub fn generated(&self) -> u64 {
        self.next_id
    }

    fn sample_kind(&mut self) -> ServiceKind {
        let r: f64 = self.rng.gen();
        self.cumulative
            .iter()
            .find(|(_, c)| r <= *c)
            .or(self.cumulative.last())
            .map(|(kind, _)| *kind)
            .unwrap_or(ServiceKind::LaneGuidance)
    }

    fn sample_position(&mut self) -> Position {
        Position::new(
            self.rng.gen_range(0.0..=self.city.width),
            self.rng.gen_range(0.0..=self.city.height),
        )
    }
}

impl ArrivalSource for WorkloadGenerator {
    fn arrivals(&mut self, now: SimTime) -> Vec<Task> {
        let count = (0..self.trials)
            .filter(|_| self.rng.gen_bool(self.probability))
            .count();

        (0..count)
            .map(|_| {
                let kind = self.sample_kind();
                let position = self.sample_position();
                let id = self.next_id;
                self.next_id += 1;
                Task::from_kind(id, kind, now, position)
            })
            .collect()
    }
}

/// Replays a fixed list of tasks.
///
/// A task is released by the first step starting at or after its arrival
/// time. Its arrival stamp is kept as scripted.
#[derive(Debug, Default)]
pub struct ScriptedArrivals {
    pending: VecDeque<Task>,
}

impl ScriptedArrivals {
    pub fn new(mut tasks: Vec<Task>) -> Self {
        tasks.sort_by(|a, b| a.arrival.total_cmp(&b.arrival).then(a.id.cmp(&b.id)));
        Self {
            pending: tasks.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ArrivalSource for ScriptedArrivals {
    fn arrivals(&mut self, now: SimTime) -> Vec<Task> {
        let mut out = Vec::new();
        while self.pending.front().is_some_and(|t| t.arrival <= now) {
            if let Some(task) = self.pending.pop_front() {
                out.push(task);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogsim_core::TaskClass;

    fn generator(avg: f64, max: usize, seed: u64) -> WorkloadGenerator {
        let workload = WorkloadConfig {
            avg_requests_per_step: avg,
            max_requests_per_step: max,
        };
        WorkloadGenerator::new(&workload, &CityConfig::default(), seed)
    }

    #[test]
    fn same_seed_same_workload() {
        let mut a = generator(5.0, 200, 7);
        let mut b = generator(5.0, 200, 7);
        for step in 0..50 {
            let now = step as f64;
            assert_eq!(a.arrivals(now), b.arrivals(now));
        }
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut g = generator(20.0, 40, 1);
        let ids: Vec<TaskId> = (0..20).flat_map(|s| g.arrivals(s as f64)).map(|t| t.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(g.generated(), ids.len() as u64);
    }

    #[test]
    fn mean_arrivals_close_to_configured_rate() {
        let mut g = generator(5.0, 200, 42);
        let total: usize = (0..2000).map(|s| g.arrivals(s as f64).len()).sum();
        let mean = total as f64 / 2000.0;
        assert!((mean - 5.0).abs() < 0.3, "mean {mean}");
    }

    #[test]
    fn rate_above_trials_saturates() {
        let mut g = generator(50.0, 10, 3);
        assert_eq!(g.arrivals(0.0).len(), 10);
    }

    #[test]
    fn zero_rate_generates_nothing() {
        let mut g = generator(0.0, 200, 3);
        assert!((0..100).all(|s| g.arrivals(s as f64).is_empty()));
    }

    #[test]
    fn arrivals_carry_catalogue_attributes() {
        let mut g = generator(10.0, 20, 11);
        let tasks: Vec<Task> = (0..50).flat_map(|s| g.arrivals(s as f64)).collect();
        assert!(!tasks.is_empty());
        for t in &tasks {
            assert_eq!(t.class, t.kind.class());
            assert_eq!(t.demand, t.kind.demand());
            assert_eq!(t.absolute_deadline, t.arrival + t.kind.relative_deadline());
            assert!((0.0..=1000.0).contains(&t.position.x));
            assert!((0.0..=1000.0).contains(&t.position.y));
        }
        // The catalogue gives trip analytics zero weight.
        assert!(tasks.iter().all(|t| t.kind != ServiceKind::TripSummaryAnalytics));
        assert!(tasks.iter().any(|t| t.class == TaskClass::Emergency));
    }

    #[test]
    fn scripted_arrivals_release_in_time_order() {
        let mut s = ScriptedArrivals::new(vec![
            Task::new(2, TaskClass::Normal, 3.0, 1.0, 10.0),
            Task::new(1, TaskClass::Emergency, 0.0, 1.0, 10.0),
            Task::new(3, TaskClass::Safety, 3.0, 1.0, 10.0),
        ]);
        assert_eq!(s.arrivals(0.0).iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
        assert!(s.arrivals(1.0).is_empty());
        assert!(s.arrivals(2.0).is_empty());
        assert_eq!(s.arrivals(3.0).iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(s.remaining(), 0);
    }
}
