//! MUNE-Sim: motor pool degeneration and CMAP scan simulator
//!
//! This library simulates motor unit loss and compensatory reinnervation in a
//! degenerating motor neuron pool and produces synthetic stimulus-response
//! scans for an external MUNE (motor unit number estimation) fitter. It
//! features:
//!
//! - Seeded motor pool sampling with stable per-unit handles
//! - Probabilistic unit activation and noisy CMAP scan generation
//! - Pluggable denervation and reinnervation policies
//! - Parallel trajectory driver over the experiment matrix
//! - Scan, ground-truth and batch index export in the fitter's formats
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mune_sim::config::SimulationConfig;
//! use mune_sim::export::MemorySink;
//! use mune_sim::simulation::SimulationDriver;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = SimulationConfig::default();
//!     config.experiment.seeds = vec![1, 2, 3];
//!
//!     let driver = SimulationDriver::new(config)?;
//!     let sink = MemorySink::new();
//!     let report = driver.run(&sink)?;
//!
//!     for trajectory in report.trajectories() {
//!         println!("{}: {:?}", trajectory.condition(), trajectory.trajectory.pool_sizes());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod export;
pub mod motor;
pub mod simulation;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::SimulationConfig;
pub use error::{ErrorCategory, ErrorContext, SimError, SimResult};
pub use motor::{
    DegenerationEngine, DenervationPolicy, MotorPool, MotorUnit, ReinnervationPolicy, Scan, UnitId,
};
pub use simulation::{ExperimentCondition, ExperimentReport, SimulationDriver, Trajectory};

pub use utils::validation::{ValidationError, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Motor pool degeneration and CMAP scan simulator".to_string(),
        features: vec![
            "Seeded motor pool sampling".to_string(),
            "Probabilistic CMAP scan generation".to_string(),
            "Denervation and reinnervation policies".to_string(),
            "Parallel experiment driver".to_string(),
            "MUNE fitter export formats".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
