use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .and_then(|v| match v.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!("ignoring unparsable {key}={v}");
                None
            }
        })
}

// ── Policy selector ───────────────────────────────────────────

/// Scheduling discipline a node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Strict arrival order over a single queue.
    Fifo,
    /// Emergency queue drained before anything else.
    EmergencyFirst,
    /// Fixed Emergency → Safety → Normal tiers.
    StaticPriority,
    /// Deadline-aware admission with SLA-adaptive priority scores.
    SlaDynamic,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::Fifo,
        Policy::EmergencyFirst,
        Policy::StaticPriority,
        Policy::SlaDynamic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Fifo => "fifo",
            Policy::EmergencyFirst => "emergency-first",
            Policy::StaticPriority => "static-priority",
            Policy::SlaDynamic => "sla-dynamic",
        }
    }

    /// Only the adaptive policy runs the deadline feasibility check.
    pub fn is_adaptive(self) -> bool {
        self == Policy::SlaDynamic
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fifo" => Ok(Policy::Fifo),
            "emergency-first" => Ok(Policy::EmergencyFirst),
            "static-priority" => Ok(Policy::StaticPriority),
            "sla-dynamic" | "sla-dwp-fog" | "dynamic-priority" => Ok(Policy::SlaDynamic),
            other => Err(SimError::UnknownPolicy(other.to_string())),
        }
    }
}

// ── SLA adaptation ────────────────────────────────────────────

/// Window cadence, targets and step sizes of the SLA feedback loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaConfig {
    /// Window length TW in seconds.
    #[serde(default = "default_window")]
    pub window: f64,
    /// Target emergency deadline-miss ratio.
    #[serde(default = "default_j1_max")]
    pub j1_max: f64,
    /// Target mean latency in seconds.
    #[serde(default = "default_j2_max")]
    pub j2_max: f64,
    /// Target Normal / Emergency latency ratio.
    #[serde(default = "default_j3_max")]
    pub j3_max: f64,
    #[serde(default = "default_eta")]
    pub eta1: f64,
    #[serde(default = "default_eta")]
    pub eta2: f64,
    #[serde(default = "default_eta")]
    pub eta3: f64,
    /// Normalization stabilizer, keeps every weight strictly positive.
    #[serde(default = "default_eps")]
    pub eps: f64,
    /// Let newly admitted tasks displace a lower-scoring running task.
    #[serde(default = "default_preemption")]
    pub preemption: bool,
}

fn default_window() -> f64 { 10.0 }
fn default_j1_max() -> f64 { 0.10 }
fn default_j2_max() -> f64 { 5.0 }
fn default_j3_max() -> f64 { 2.0 }
fn default_eta() -> f64 { 0.01 }
fn default_eps() -> f64 { 1e-6 }
fn default_preemption() -> bool { true }

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            j1_max: default_j1_max(),
            j2_max: default_j2_max(),
            j3_max: default_j3_max(),
            eta1: default_eta(),
            eta2: default_eta(),
            eta3: default_eta(),
            eps: default_eps(),
            preemption: default_preemption(),
        }
    }
}

impl SlaConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.window > 0.0) {
            return Err(SimError::Config(format!(
                "sla.window must be positive, got {}",
                self.window
            )));
        }
        for (name, eta) in [("eta1", self.eta1), ("eta2", self.eta2), ("eta3", self.eta3)] {
            if !(eta >= 0.0) {
                return Err(SimError::Config(format!(
                    "sla.{name} must be non-negative, got {eta}"
                )));
            }
        }
        if !(self.eps > 0.0) {
            return Err(SimError::Config(format!(
                "sla.eps must be positive, got {}",
                self.eps
            )));
        }
        Ok(())
    }
}

// ── Node ──────────────────────────────────────────────────────

/// Construction-time configuration of one scheduling node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Processing rate in work units per second.
    #[serde(default = "default_cpu_capacity")]
    pub cpu_capacity: f64,
    /// Link budget in MB per second. `None` disables the link check.
    #[serde(default = "default_link_capacity")]
    pub link_capacity: Option<f64>,
    /// Bound on queued (plus running) tasks. `None` is unbounded.
    #[serde(default)]
    pub max_queue_length: Option<usize>,
    #[serde(default = "default_policy")]
    pub policy: Policy,
    #[serde(default)]
    pub sla: SlaConfig,
}

fn default_cpu_capacity() -> f64 { 10.0 }
fn default_link_capacity() -> Option<f64> { Some(50.0) }
fn default_policy() -> Policy { Policy::Fifo }

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            cpu_capacity: default_cpu_capacity(),
            link_capacity: default_link_capacity(),
            max_queue_length: None,
            policy: default_policy(),
            sla: SlaConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Node running `policy` with every other knob at its default.
    pub fn with_policy(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.cpu_capacity > 0.0) {
            return Err(SimError::Config(format!(
                "node.cpu_capacity must be positive, got {}",
                self.cpu_capacity
            )));
        }
        if let Some(link) = self.link_capacity {
            if !(link > 0.0) {
                return Err(SimError::Config(format!(
                    "node.link_capacity must be positive when set, got {link}"
                )));
            }
        }
        self.sla.validate()
    }
}

// ── Environment sections ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    #[serde(default = "default_city_side")]
    pub width: f64,
    #[serde(default = "default_city_side")]
    pub height: f64,
}

fn default_city_side() -> f64 { 1000.0 }

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            width: default_city_side(),
            height: default_city_side(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    #[serde(default = "default_grid_side")]
    pub nodes_x: usize,
    #[serde(default = "default_grid_side")]
    pub nodes_y: usize,
}

fn default_grid_side() -> usize { 2 }

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            nodes_x: default_grid_side(),
            nodes_y: default_grid_side(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Mean arrivals per time step.
    #[serde(default = "default_avg_requests")]
    pub avg_requests_per_step: f64,
    /// Number of Bernoulli trials per step approximating the Poisson arrivals.
    #[serde(default = "default_max_requests")]
    pub max_requests_per_step: usize,
}

fn default_avg_requests() -> f64 { 5.0 }
fn default_max_requests() -> usize { 200 }

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            avg_requests_per_step: default_avg_requests(),
            max_requests_per_step: default_max_requests(),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Full simulator configuration, typically parsed from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Total simulated time in seconds.
    #[serde(default = "default_sim_time")]
    pub sim_time: f64,
    /// Step length in seconds.
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    /// Step length in milliseconds. Takes precedence over `time_step` when set.
    #[serde(default)]
    pub time_step_ms: Option<u64>,
    #[serde(default = "default_seed")]
    pub random_seed: u64,
    /// Step nodes on the rayon pool instead of serially.
    #[serde(default)]
    pub parallel_nodes: bool,
    #[serde(default)]
    pub city: CityConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub node: NodeConfig,
}

fn default_sim_time() -> f64 { 3600.0 }
fn default_time_step() -> f64 { 1.0 }
fn default_seed() -> u64 { 42 }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            sim_time: default_sim_time(),
            time_step: default_time_step(),
            time_step_ms: None,
            random_seed: default_seed(),
            parallel_nodes: false,
            city: CityConfig::default(),
            topology: TopologyConfig::default(),
            workload: WorkloadConfig::default(),
            node: NodeConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse and validate config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, SimError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Load from `path` (or defaults), apply `FOGSIM_*` overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, SimError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Effective step length in seconds.
    pub fn step_length(&self) -> f64 {
        match self.time_step_ms {
            Some(ms) => ms as f64 / 1000.0,
            None => self.time_step,
        }
    }

    /// Number of steps `run` will execute.
    pub fn total_steps(&self) -> u64 {
        (self.sim_time / self.step_length()).ceil() as u64
    }

    /// Apply environment variable overrides.
    ///
    /// - `FOGSIM_SIM_TIME` -> `sim_time`
    /// - `FOGSIM_TIME_STEP` -> `time_step`
    /// - `FOGSIM_SEED` -> `random_seed`
    /// - `FOGSIM_POLICY` -> `node.policy`
    /// - `FOGSIM_CPU_CAPACITY` -> `node.cpu_capacity`
    /// - `FOGSIM_MAX_QUEUE` -> `node.max_queue_length`
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse("FOGSIM_SIM_TIME") {
            self.sim_time = v;
        }
        if let Some(v) = env_parse("FOGSIM_TIME_STEP") {
            self.time_step = v;
        }
        if let Some(v) = env_parse("FOGSIM_SEED") {
            self.random_seed = v;
        }
        if let Some(v) = env_parse("FOGSIM_POLICY") {
            self.node.policy = v;
        }
        if let Some(v) = env_parse("FOGSIM_CPU_CAPACITY") {
            self.node.cpu_capacity = v;
        }
        if let Some(v) = env_parse("FOGSIM_MAX_QUEUE") {
            self.node.max_queue_length = Some(v);
        }
    }

    /// Validate the config. All checks are fatal and run before any step.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.sim_time > 0.0) {
            return Err(SimError::Config(format!(
                "sim_time must be positive, got {}",
                self.sim_time
            )));
        }
        if !(self.step_length() > 0.0) {
            return Err(SimError::Config(format!(
                "time step must be positive, got {}s",
                self.step_length()
            )));
        }
        if self.topology.nodes_x == 0 || self.topology.nodes_y == 0 {
            return Err(SimError::Config(
                "number of fog nodes in each dimension must be positive".into(),
            ));
        }
        let city_ok = |side: f64| side.is_finite() && side > 0.0;
        if !(city_ok(self.city.width) && city_ok(self.city.height)) {
            return Err(SimError::Config(format!(
                "city dimensions must be positive and finite, got {}x{}",
                self.city.width, self.city.height
            )));
        }
        let rate = self.workload.avg_requests_per_step;
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(SimError::Config(format!(
                "workload.avg_requests_per_step must be finite and non-negative, got {rate}"
            )));
        }
        self.node.validate()?;
        if self.node.policy.is_adaptive() && self.node.sla.window < self.step_length() {
            tracing::warn!(
                "sla.window {}s is shorter than the time step {}s; weights adapt every step",
                self.node.sla.window,
                self.step_length()
            );
        }
        Ok(())
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  time:      sim_time={}s, step={}s, seed={}",
            self.sim_time,
            self.step_length(),
            self.random_seed
        );
        tracing::info!(
            "  topology:  {}x{} nodes over {}x{}m",
            self.topology.nodes_x,
            self.topology.nodes_y,
            self.city.width,
            self.city.height
        );
        tracing::info!(
            "  workload:  avg={}/step, trials={}",
            self.workload.avg_requests_per_step,
            self.workload.max_requests_per_step
        );
        tracing::info!(
            "  node:      policy={}, cpu={}/s, link={}, queue={}",
            self.node.policy,
            self.node.cpu_capacity,
            self.node
                .link_capacity
                .map(|l| format!("{l}MB/s"))
                .unwrap_or_else(|| "unbounded".into()),
            self.node
                .max_queue_length
                .map(|q| q.to_string())
                .unwrap_or_else(|| "unbounded".into())
        );
        if self.node.policy.is_adaptive() {
            let sla = &self.node.sla;
            tracing::info!(
                "  sla:       TW={}s, J1<={}, J2<={}s, J3<={}, eta=({}, {}, {})",
                sla.window,
                sla.j1_max,
                sla.j2_max,
                sla.j3_max,
                sla.eta1,
                sla.eta2,
                sla.eta3
            );
        }
    }
}
