//! Multi-factor priority score.
//!
//! `score = α·g(class) + β·u(urgency) + γ·w(wait)`, every factor in `[0, 1]`
//! and the weights summing to one, so the score is bounded to `[0, 1]`.
//! Scores depend on `now` and are recomputed at every selection.

use fogsim_core::{SimError, SimTime, Task};
use serde::{Deserialize, Serialize};

/// Substituted for non-positive relative deadlines.
pub const DEADLINE_FLOOR: f64 = 1e-9;

const SUM_TOLERANCE: f64 = 1e-9;

/// Weight vector `(α, β, γ)` of the priority score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Class importance weight.
    pub alpha: f64,
    /// Deadline urgency weight.
    pub beta: f64,
    /// Waiting time weight.
    pub gamma: f64,
}

impl Weights {
    /// Build a weight vector, rejecting negative components or a sum other than one.
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self, SimError> {
        let weights = Self { alpha, beta, gamma };
        if !(alpha >= 0.0 && beta >= 0.0 && gamma >= 0.0) {
            return Err(SimError::Config(format!(
                "priority weights must be non-negative, got {weights:?}"
            )));
        }
        if (weights.sum() - 1.0).abs() > SUM_TOLERANCE {
            return Err(SimError::Config(format!(
                "priority weights must sum to 1, got {}",
                weights.sum()
            )));
        }
        Ok(weights)
    }

    /// Equal weights, the state before the first SLA window.
    pub fn uniform() -> Self {
        Self {
            alpha: 1.0 / 3.0,
            beta: 1.0 / 3.0,
            gamma: 1.0 / 3.0,
        }
    }

    /// Normalize three dual variables into weights.
    ///
    /// Every component gets `eps` added before normalizing, so all weights
    /// stay strictly positive and the denominator never reaches zero.
    pub fn from_duals(lambdas: [f64; 3], eps: f64) -> Self {
        let shifted = lambdas.map(|l| l + eps);
        let total: f64 = shifted.iter().sum();
        Self {
            alpha: shifted[0] / total,
            beta: shifted[1] / total,
            gamma: shifted[2] / total,
        }
    }

    pub fn sum(&self) -> f64 {
        self.alpha + self.beta + self.gamma
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::uniform()
    }
}

fn effective_deadline(task: &Task) -> f64 {
    task.relative_deadline.max(DEADLINE_FLOOR)
}

/// Deadline urgency: 0 at arrival, 1 once the deadline is reached or passed.
pub fn urgency(task: &Task, now: SimTime) -> f64 {
    let d = effective_deadline(task);
    (1.0 - (task.absolute_deadline - now) / d).clamp(0.0, 1.0)
}

/// Waiting factor: 0 at arrival, 1 after waiting one full deadline interval.
pub fn wait_factor(task: &Task, now: SimTime) -> f64 {
    let d = effective_deadline(task);
    ((now - task.arrival) / d).clamp(0.0, 1.0)
}

/// Priority score of `task` at `now` under `weights`.
pub fn score(task: &Task, now: SimTime, weights: &Weights) -> f64 {
    let value = weights.alpha * task.class.importance()
        + weights.beta * urgency(task, now)
        + weights.gamma * wait_factor(task, now);
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use fogsim_core::TaskClass;
    use proptest::prelude::*;

    use super::*;

    fn task(class: TaskClass, arrival: f64, deadline: f64) -> Task {
        Task::new(1, class, arrival, 5.0, deadline)
    }

    #[test]
    fn factors_at_arrival() {
        let t = task(TaskClass::Normal, 10.0, 4.0);
        assert_eq!(urgency(&t, 10.0), 0.0);
        assert_eq!(wait_factor(&t, 10.0), 0.0);
    }

    #[test]
    fn factors_halfway() {
        let t = task(TaskClass::Normal, 10.0, 4.0);
        assert!((urgency(&t, 12.0) - 0.5).abs() < 1e-12);
        assert!((wait_factor(&t, 12.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn factors_saturate_past_deadline() {
        let t = task(TaskClass::Normal, 0.0, 4.0);
        assert_eq!(urgency(&t, 100.0), 1.0);
        assert_eq!(wait_factor(&t, 100.0), 1.0);
    }

    #[test]
    fn zero_deadline_uses_floor() {
        let t = task(TaskClass::Safety, 3.0, 0.0);
        assert_eq!(urgency(&t, 3.0), 1.0);
        assert_eq!(wait_factor(&t, 3.0), 0.0);
        assert!(score(&t, 3.0, &Weights::uniform()).is_finite());

        let negative = task(TaskClass::Safety, 3.0, -2.0);
        assert_eq!(urgency(&negative, 3.0), 1.0);
    }

    #[test]
    fn uniform_score_at_arrival_is_class_only() {
        let w = Weights::uniform();
        let e = task(TaskClass::Emergency, 0.0, 10.0);
        let n = task(TaskClass::Normal, 0.0, 10.0);
        assert!((score(&e, 0.0, &w) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(score(&n, 0.0, &w), 0.0);
    }

    #[test]
    fn waiting_normal_can_overtake_fresh_emergency() {
        let w = Weights::uniform();
        let old_normal = task(TaskClass::Normal, 0.0, 10.0);
        let fresh_emergency = task(TaskClass::Emergency, 10.0, 10.0);
        assert!(score(&old_normal, 10.0, &w) > score(&fresh_emergency, 10.0, &w));
    }

    #[test]
    fn weights_new_validates() {
        assert!(Weights::new(0.2, 0.3, 0.5).is_ok());
        assert!(Weights::new(0.5, 0.5, 0.5).is_err());
        assert!(Weights::new(-0.1, 0.6, 0.5).is_err());
        assert!(Weights::new(f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn from_zero_duals_is_uniform() {
        let w = Weights::from_duals([0.0; 3], 1e-6);
        assert!((w.alpha - 1.0 / 3.0).abs() < 1e-12);
        assert!((w.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn from_duals_keeps_floor() {
        let w = Weights::from_duals([4.0, 0.0, 0.0], 1e-6);
        assert!(w.alpha > 0.99);
        assert!(w.beta > 0.0);
        assert!(w.gamma > 0.0);
    }

    proptest! {
        #[test]
        fn score_is_bounded(
            arrival in 0.0f64..1e4,
            deadline in -10.0f64..500.0,
            elapsed in -50.0f64..1e3,
            lambdas in proptest::array::uniform3(0.0f64..100.0),
            class_idx in 0usize..3,
        ) {
            let t = task(TaskClass::ALL[class_idx], arrival, deadline);
            let w = Weights::from_duals(lambdas, 1e-6);
            let s = score(&t, arrival + elapsed, &w);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn normalized_duals_sum_to_one(
            lambdas in proptest::array::uniform3(0.0f64..1e6),
            eps in 1e-9f64..1e-3,
        ) {
            let w = Weights::from_duals(lambdas, eps);
            prop_assert!((w.sum() - 1.0).abs() < 1e-9);
            prop_assert!(w.alpha > 0.0 && w.beta > 0.0 && w.gamma > 0.0);
        }
    }
}
