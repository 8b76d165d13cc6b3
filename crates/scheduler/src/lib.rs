//! Adaptive deadline-aware scheduling engine for a single compute node.
//!
//! A [`SchedulingNode`] owns its queues, execution slot and adaptive state.
//! Arrivals go through [`SchedulingNode::offer`], which resolves admission
//! before anything runs; [`SchedulingNode::step`] then spends one step of
//! capacity and, under the adaptive policy, feeds completions into the
//! SLA window that retunes the priority weights.

pub mod adapter;
pub mod admission;
pub mod metrics;
pub mod node;
pub mod priority;
pub mod queues;
pub mod sla;

pub use adapter::WeightAdapter;
pub use admission::{predicted_finish, Admission};
pub use metrics::NodeMetrics;
pub use node::SchedulingNode;
pub use priority::{score, urgency, wait_factor, Weights, DEADLINE_FLOOR};
pub use sla::{CompletionWindow, SlaSample};
