//! Scheduling node -- queues, execution slot and adaptive state of one compute node.
//!
//! Split into focused submodules:
//! - `core`: SchedulingNode struct, constructor and accessors
//! - `discipline`: per-policy queue layout and the adaptive state
//! - `admission`: offering arrivals, queue bound, feasibility check, preemption
//! - `selection`: global argmax-score selection with tie-breaks
//! - `execution`: per-step capacity spending and SLA window evaluation

mod admission;
mod core;
mod discipline;
mod execution;
mod selection;

pub use self::core::SchedulingNode;
