//! City-scale fog simulation around [`fogsim_scheduler::SchedulingNode`].
//!
//! Arrivals come from an [`ArrivalSource`], are routed to the nearest node
//! of a grid [`Topology`], pass a per-step link budget and are then offered
//! to the node's scheduler. [`MetricsCollector`] turns the run into a
//! serializable [`SimulationReport`].

pub mod metrics;
pub mod simulation;
pub mod topology;
pub mod workload;

pub use metrics::{
    ClassSummary, KindStats, MetricsCollector, NodeSummary, SimulationReport, StepSeries,
};
pub use simulation::{compare_policies, Simulation};
pub use topology::{FogSite, Topology};
pub use workload::{ArrivalSource, ScriptedArrivals, WorkloadGenerator};
