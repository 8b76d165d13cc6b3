use std::path::PathBuf;

use clap::Parser;
use fogsim_core::{Policy, SimulationConfig};

/// Discrete-time fog computing simulator.
///
/// Generates vehicular edge requests over a city grid, routes them to the
/// nearest fog node and schedules them under the selected policy.
#[derive(Parser, Debug)]
#[command(name = "fogsim", about = "Deadline-aware fog node scheduling simulator")]
pub struct CliArgs {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(long, env = "FOGSIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Total simulated time in seconds
    #[arg(long)]
    pub sim_time: Option<f64>,

    /// Step length in seconds
    #[arg(long)]
    pub time_step: Option<f64>,

    /// Step length in milliseconds (takes precedence over --time-step)
    #[arg(long)]
    pub time_step_ms: Option<u64>,

    /// Mean arrivals per step
    #[arg(long)]
    pub avg_requests: Option<f64>,

    /// Bernoulli trials per step
    #[arg(long)]
    pub max_requests: Option<usize>,

    /// Fog node processing rate in work units per second
    #[arg(long)]
    pub fog_cpu: Option<f64>,

    /// Fog node link capacity in MB per second
    #[arg(long, conflicts_with = "unlimited_link")]
    pub fog_link: Option<f64>,

    /// Disable the per-step link budget
    #[arg(long)]
    pub unlimited_link: bool,

    /// Bound on tasks held by each node
    #[arg(long)]
    pub fog_queue: Option<usize>,

    /// Scheduling policy: fifo, emergency-first, static-priority or sla-dynamic
    #[arg(long)]
    pub policy: Option<Policy>,

    /// Random seed for the workload
    #[arg(long)]
    pub seed: Option<u64>,

    /// Step nodes in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Write the report (or all reports with --compare) as JSON
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Run every policy on the same workload and print a comparison
    #[arg(long)]
    pub compare: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short)]
    pub verbose: bool,
}

impl CliArgs {
    /// Overlay command-line flags on a loaded config.
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(v) = self.sim_time {
            config.sim_time = v;
        }
        if let Some(v) = self.time_step {
            config.time_step = v;
        }
        if self.time_step_ms.is_some() {
            config.time_step_ms = self.time_step_ms;
        }
        if let Some(v) = self.avg_requests {
            config.workload.avg_requests_per_step = v;
        }
        if let Some(v) = self.max_requests {
            config.workload.max_requests_per_step = v;
        }
        if let Some(v) = self.fog_cpu {
            config.node.cpu_capacity = v;
        }
        if self.unlimited_link {
            config.node.link_capacity = None;
        } else if self.fog_link.is_some() {
            config.node.link_capacity = self.fog_link;
        }
        if self.fog_queue.is_some() {
            config.node.max_queue_length = self.fog_queue;
        }
        if let Some(policy) = self.policy {
            config.node.policy = policy;
        }
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }
        if self.parallel {
            config.parallel_nodes = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = CliArgs::parse_from([
            "fogsim",
            "--sim-time",
            "120",
            "--policy",
            "sla-dynamic",
            "--fog-cpu",
            "25",
            "--fog-queue",
            "40",
            "--seed",
            "7",
            "--parallel",
        ]);
        let mut config = SimulationConfig::default();
        args.apply(&mut config);

        assert_eq!(config.sim_time, 120.0);
        assert_eq!(config.node.policy, Policy::SlaDynamic);
        assert_eq!(config.node.cpu_capacity, 25.0);
        assert_eq!(config.node.max_queue_length, Some(40));
        assert_eq!(config.random_seed, 7);
        assert!(config.parallel_nodes);
        assert_eq!(config.node.link_capacity, Some(50.0));
    }

    #[test]
    fn absent_flags_keep_config() {
        let args = CliArgs::parse_from(["fogsim"]);
        let mut config = SimulationConfig::default();
        args.apply(&mut config);
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn unlimited_link_clears_capacity() {
        let args = CliArgs::parse_from(["fogsim", "--unlimited-link"]);
        let mut config = SimulationConfig::default();
        args.apply(&mut config);
        assert_eq!(config.node.link_capacity, None);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(CliArgs::try_parse_from(["fogsim", "--policy", "round-robin"]).is_err());
    }
}
