//! Closed-loop adjustment of the priority weights.
//!
//! Each SLA ratio drives one dual variable by projected gradient ascent:
//! `λk ← max(0, λk + ηk·(Jk − Jk_max))`. The duals are then normalized into
//! `(α, β, γ)`, so a ratio that keeps exceeding its target steadily shifts
//! weight onto the matching score factor.

use fogsim_core::SlaConfig;
use serde::Serialize;
use tracing::debug;

use crate::priority::Weights;
use crate::sla::SlaSample;

#[derive(Debug, Clone, Serialize)]
pub struct WeightAdapter {
    targets: [f64; 3],
    etas: [f64; 3],
    eps: f64,
    lambdas: [f64; 3],
    weights: Weights,
    updates: u64,
}

impl WeightAdapter {
    /// Fresh adapter: all duals at zero, uniform weights.
    pub fn new(config: &SlaConfig) -> Self {
        Self {
            targets: [config.j1_max, config.j2_max, config.j3_max],
            etas: [config.eta1, config.eta2, config.eta3],
            eps: config.eps,
            lambdas: [0.0; 3],
            weights: Weights::uniform(),
            updates: 0,
        }
    }

    /// Apply one dual update from a window sample and renormalize.
    pub fn update(&mut self, sample: &SlaSample) -> Weights {
        let measured = [sample.j1, sample.j2, sample.j3];
        for k in 0..3 {
            let step = self.etas[k] * (measured[k] - self.targets[k]);
            self.lambdas[k] = (self.lambdas[k] + step).max(0.0);
        }
        self.weights = Weights::from_duals(self.lambdas, self.eps);
        self.updates += 1;

        debug!(
            j1 = sample.j1,
            j2 = sample.j2,
            j3 = sample.j3,
            alpha = self.weights.alpha,
            beta = self.weights.beta,
            gamma = self.weights.gamma,
            "SLA window update"
        );
        self.weights
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    pub fn lambdas(&self) -> [f64; 3] {
        self.lambdas
    }

    /// Number of window updates applied so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(j1: f64, j2: f64, j3: f64) -> SlaSample {
        SlaSample {
            j1,
            j2,
            j3,
            completions: 10,
        }
    }

    fn config(eta: f64) -> SlaConfig {
        SlaConfig {
            eta1: eta,
            eta2: eta,
            eta3: eta,
            ..SlaConfig::default()
        }
    }

    #[test]
    fn starts_uniform() {
        let adapter = WeightAdapter::new(&SlaConfig::default());
        assert_eq!(adapter.weights(), Weights::uniform());
        assert_eq!(adapter.lambdas(), [0.0; 3]);
        assert_eq!(adapter.updates(), 0);
    }

    #[test]
    fn emergency_violation_raises_alpha() {
        let mut adapter = WeightAdapter::new(&config(0.02));
        let before = adapter.weights();
        // J1 = 0.20 against 0.10; J2, J3 on target.
        let after = adapter.update(&sample(0.20, 5.0, 2.0));

        assert!((adapter.lambdas()[0] - 0.002).abs() < 1e-12);
        assert_eq!(adapter.lambdas()[1], 0.0);
        assert_eq!(adapter.lambdas()[2], 0.0);
        assert!(after.alpha > before.alpha);
        assert!((after.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn below_target_duals_stay_at_zero() {
        let mut adapter = WeightAdapter::new(&config(0.5));
        let w = adapter.update(&sample(0.0, 0.1, 0.1));
        assert_eq!(adapter.lambdas(), [0.0; 3]);
        assert!((w.alpha - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn duals_decay_after_recovery() {
        let mut adapter = WeightAdapter::new(&config(0.1));
        adapter.update(&sample(0.0, 15.0, 2.0));
        let raised = adapter.weights().beta;
        assert!(raised > 0.99);

        for _ in 0..20 {
            adapter.update(&sample(0.0, 0.0, 2.0));
        }
        assert_eq!(adapter.lambdas()[1], 0.0);
        assert!(adapter.weights().beta < raised);
        assert_eq!(adapter.updates(), 21);
    }

    #[test]
    fn zero_step_size_freezes_weights() {
        let mut adapter = WeightAdapter::new(&config(0.0));
        let w = adapter.update(&sample(1.0, 100.0, 50.0));
        assert_eq!(adapter.lambdas(), [0.0; 3]);
        assert!((w.gamma - 1.0 / 3.0).abs() < 1e-12);
    }
}
