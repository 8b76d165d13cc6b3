pub mod config;
pub mod error;
pub mod service;
pub mod task;

pub use config::{
    load_dotenv, CityConfig, NodeConfig, Policy, SimulationConfig, SlaConfig, TopologyConfig,
    WorkloadConfig,
};
pub use error::SimError;
pub use service::ServiceKind;
pub use task::{NodeId, Position, SimTime, Task, TaskClass, TaskId};
