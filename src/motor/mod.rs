//! Motor pool model: units, activation, scans and degeneration
//! Location: src/motor/mod.rs

pub mod unit;
pub mod pool;
pub mod activation;
pub mod noise;
pub mod scan;
pub mod degeneration;

pub use unit::{MotorUnit, UnitId};
pub use pool::{MotorPool, PoolEntry, PoolParameters, PoolSummary, SpreadModel};
pub use activation::{fire_probability, sample_fire};
pub use noise::NoiseModel;
pub use scan::{generate_scan, GridSpacing, Scan, ScanGenerator, ScanPoints, StimulusGrid};
pub use degeneration::{
    CompensationPolicy, DegenerationEngine, DegenerationStep, DenervationPolicy, ReinnervationPolicy,
    SelectionPolicy,
};
