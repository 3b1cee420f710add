//! Experiment orchestration
//! Location: src/simulation/mod.rs

pub mod condition;
pub mod trajectory;
pub mod driver;

pub use condition::ExperimentCondition;
pub use driver::{ConditionReport, ExperimentReport, SimulationDriver, TrajectoryReport};
pub use trajectory::{Trajectory, TrajectoryPoint};
