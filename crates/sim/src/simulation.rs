//! Discrete-time driver tying the workload, topology and nodes together.

use fogsim_core::{Policy, SimError, SimTime, SimulationConfig, Task};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::metrics::{MetricsCollector, SimulationReport};
use crate::topology::Topology;
use crate::workload::{ArrivalSource, WorkloadGenerator};

/// One simulation run.
///
/// Each step resets the link budgets, routes new arrivals to their nearest
/// node, offers the ones that fit the link, steps every node and records
/// the outcome. Only admitted tasks are charged against the link. Time is
/// `step_index * dt`, so long runs do not accumulate rounding drift.
pub struct Simulation {
    config: SimulationConfig,
    dt: f64,
    total_steps: u64,
    step_index: u64,
    topology: Topology,
    source: Box<dyn ArrivalSource>,
    metrics: MetricsCollector,
}

impl Simulation {
    /// Build a run driven by the seeded synthetic workload.
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        let source = WorkloadGenerator::new(&config.workload, &config.city, config.random_seed);
        Self::with_source(config, Box::new(source))
    }

    /// Build a run driven by an arbitrary arrival source.
    pub fn with_source(
        config: SimulationConfig,
        source: Box<dyn ArrivalSource>,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let topology = Topology::build_grid(&config.topology, &config.city, &config.node)?;
        Ok(Self {
            dt: config.step_length(),
            total_steps: config.total_steps(),
            step_index: 0,
            topology,
            source,
            metrics: MetricsCollector::new(),
            config,
        })
    }

    /// Start time of the next step.
    pub fn now(&self) -> SimTime {
        self.step_index as f64 * self.dt
    }

    pub fn is_finished(&self) -> bool {
        self.step_index >= self.total_steps
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Advance one step. Returns the tasks completed during it.
    pub fn step(&mut self) -> Vec<Task> {
        let now = self.now();
        let dt = self.dt;

        self.topology.reset_links();
        let arrivals = self.source.arrivals(now);
        self.metrics.record_generated(&arrivals);

        for task in arrivals {
            let node_id = self.topology.nearest(&task.position);
            let Some(site) = self.topology.site_mut(node_id) else {
                continue;
            };
            if !site.fits_link(&task, dt) {
                debug!(
                    node = node_id,
                    task = task.id,
                    size = task.data_size,
                    "Dropped: link capacity"
                );
                self.metrics.record_link_drop(&task);
                continue;
            }
            let outcome = site.node.offer(task.clone());
            if outcome.is_admitted() {
                site.commit_link(&task);
            }
            self.metrics.record_admission(&task, outcome);
        }

        let completed = self.step_nodes(now, dt);
        self.metrics.record_completed(&completed);
        self.metrics
            .record_queue_lengths(self.topology.nodes().map(|n| n.queue_len()));
        self.metrics.end_step();

        self.step_index += 1;
        completed
    }

    /// Step every node, merging completions in node order.
    fn step_nodes(&mut self, now: SimTime, dt: f64) -> Vec<Task> {
        let parallel = self.config.parallel_nodes;
        let sites = self.topology.sites_mut();
        if parallel {
            sites
                .par_iter_mut()
                .map(|site| site.node.step(now, dt))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            sites.iter_mut().flat_map(|site| site.node.step(now, dt)).collect()
        }
    }

    /// Run the remaining steps and return the report.
    pub fn run(&mut self) -> SimulationReport {
        info!(
            "Simulation starting: policy={}, {} nodes, {} steps of {}s",
            self.config.node.policy,
            self.topology.len(),
            self.total_steps,
            self.dt
        );
        while !self.is_finished() {
            self.step();
        }
        let report = self.report();
        info!(
            generated = report.total_generated,
            completed = report.total_completed,
            dropped = report.total_dropped,
            rejected = report.total_rejected,
            "Simulation finished"
        );
        report
    }

    pub fn report(&self) -> SimulationReport {
        self.metrics
            .report(self.config.node.policy, self.config.sim_time, &self.topology)
    }
}

/// Run every policy against the same configuration and seed.
///
/// Runs execute concurrently on the rayon pool; reports come back in
/// `Policy::ALL` order.
pub fn compare_policies(config: &SimulationConfig) -> Result<Vec<SimulationReport>, SimError> {
    Policy::ALL
        .par_iter()
        .map(|&policy| {
            let mut config = config.clone();
            config.node.policy = policy;
            Simulation::new(config).map(|mut sim| sim.run())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::ScriptedArrivals;
    use fogsim_core::{Position, ServiceKind, TaskClass};

    fn small_config(policy: Policy) -> SimulationConfig {
        let mut config = SimulationConfig {
            sim_time: 60.0,
            ..SimulationConfig::default()
        };
        config.node.policy = policy;
        config
    }

    #[test]
    fn runs_expected_number_of_steps() {
        let mut sim = Simulation::new(small_config(Policy::Fifo)).unwrap();
        let report = sim.run();
        assert_eq!(report.steps, 60);
        assert_eq!(report.series.generated.len(), 60);
        assert_eq!(report.series.avg_queue_length.len(), 60);
        assert!(sim.is_finished());
        assert_eq!(sim.now(), 60.0);
    }

    #[test]
    fn millisecond_steps_take_precedence() {
        let mut config = small_config(Policy::Fifo);
        config.sim_time = 2.0;
        config.time_step_ms = Some(250);
        let report = Simulation::new(config).unwrap().run();
        assert_eq!(report.steps, 8);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let mut config = small_config(Policy::SlaDynamic);
        config.node.cpu_capacity = 0.0;
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn arrivals_are_routed_to_nearest_node() {
        let tasks = vec![
            Task::from_kind(0, ServiceKind::EmergencySos, 0.0, Position::new(10.0, 10.0)),
            Task::from_kind(1, ServiceKind::LaneGuidance, 0.0, Position::new(990.0, 990.0)),
        ];
        let source = Box::new(ScriptedArrivals::new(tasks));
        let mut sim = Simulation::with_source(small_config(Policy::Fifo), source).unwrap();
        sim.step();
        let admitted: Vec<u64> = sim.topology().nodes().map(|n| n.metrics().admitted).collect();
        assert_eq!(admitted, vec![1, 0, 0, 1]);
    }

    #[test]
    fn link_budget_drops_before_offer() {
        let mut config = small_config(Policy::Fifo);
        config.topology.nodes_x = 1;
        config.topology.nodes_y = 1;
        config.node.link_capacity = Some(5.0);
        // Incident uploads carry 10 MB each.
        let tasks = (0..3)
            .map(|id| {
                Task::from_kind(id, ServiceKind::IncidentUpload, 0.0, Position::new(1.0, 1.0))
            })
            .chain(std::iter::once(
                Task::new(3, TaskClass::Normal, 0.0, 1.0, 60.0).with_data_size(4.0),
            ))
            .collect();
        let source = Box::new(ScriptedArrivals::new(tasks));
        let mut sim = Simulation::with_source(config, source).unwrap();
        sim.step();

        assert_eq!(sim.metrics().drop_reason("link_capacity"), 3);
        assert_eq!(sim.metrics().admitted(), 1);
        let node = sim.topology().site(0).unwrap();
        assert_eq!(node.node.metrics().admitted, 1);
    }

    #[test]
    fn refused_task_does_not_consume_link_budget() {
        let mut config = small_config(Policy::SlaDynamic);
        config.topology.nodes_x = 1;
        config.topology.nodes_y = 1;
        config.node.link_capacity = Some(10.0);
        let tasks = vec![
            // 100 units at 10/s cannot meet a 1s deadline.
            Task::new(0, TaskClass::Emergency, 0.0, 100.0, 1.0).with_data_size(8.0),
            Task::new(1, TaskClass::Normal, 0.0, 1.0, 60.0).with_data_size(4.0),
        ];
        let source = Box::new(ScriptedArrivals::new(tasks));
        let mut sim = Simulation::with_source(config, source).unwrap();
        sim.step();

        assert_eq!(sim.metrics().rejected(), 1);
        assert_eq!(sim.metrics().drop_reason("link_capacity"), 0);
        assert_eq!(sim.metrics().admitted(), 1);
        assert_eq!(sim.topology().site(0).unwrap().link_load(), 4.0);
    }

    #[test]
    fn parallel_and_serial_runs_match() {
        let mut serial = small_config(Policy::SlaDynamic);
        serial.workload.avg_requests_per_step = 8.0;
        let mut parallel = serial.clone();
        parallel.parallel_nodes = true;

        let a = Simulation::new(serial).unwrap().run();
        let b = Simulation::new(parallel).unwrap().run();
        assert_eq!(a.total_completed, b.total_completed);
        assert_eq!(a.series, b.series);
        assert_eq!(a.nodes, b.nodes);
    }

    #[test]
    fn compare_runs_every_policy_in_order() {
        let reports = compare_policies(&small_config(Policy::Fifo)).unwrap();
        let policies: Vec<Policy> = reports.iter().map(|r| r.policy).collect();
        assert_eq!(policies, Policy::ALL.to_vec());
        // Same seed, same workload.
        assert!(reports.windows(2).all(|w| w[0].total_generated == w[1].total_generated));
    }
}
