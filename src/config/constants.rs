// src/config/constants.rs
//! Default simulation parameters
//!
//! Values reproduce the reference degeneration experiment: a 160-unit healthy
//! pool halved per step under every denervation/reinnervation combination.

/// Experiment matrix constants
pub mod experiment {
    pub const DEFAULT_SEED_COUNT: u64 = 10;
    pub const DEFAULT_FIRST_SEED: u64 = 1;
    pub const DEFAULT_DENERVATION_FRACTION: f64 = 0.5;
    pub const DEFAULT_REINNERVATION_STRENGTHS: [f64; 2] = [0.2, 0.6];
    pub const DEFAULT_MIN_VIABLE_POOL: usize = 5;
}

/// Motor pool sampling constants
pub mod pool {
    pub const DEFAULT_UNIT_COUNT: usize = 160;
    /// mV
    pub const DEFAULT_SMUP_MEAN: f64 = 0.0625;
    /// mV
    pub const DEFAULT_SMUP_MIN: f64 = 0.025;
    /// mA
    pub const DEFAULT_THRESHOLD_MEAN: f64 = 10.683675;
    /// mA
    pub const DEFAULT_THRESHOLD_DEVIATION: f64 = 2.0;
    pub const DEFAULT_RELATIVE_SPREAD: f64 = 0.0165;
}

/// Scan generation constants
pub mod scan {
    pub const DEFAULT_POINTS: usize = 500;
    pub const DEFAULT_FLANKS: usize = 20;
    /// mA beyond the extreme thresholds
    pub const DEFAULT_MARGIN: f64 = 0.5;
    /// mV
    pub const DEFAULT_NOISE_STD: f64 = 0.01;
    pub const DEFAULT_NOISE_OFFSET: f64 = 0.0;
    pub const MIN_POINTS: usize = 2;
}

/// Export layout constants
pub mod export {
    pub const DEFAULT_OUTPUT_DIR: &str = "output";
    pub const MEM_DIR: &str = "MEM";
    pub const DAT_DIR: &str = "DAT";
    pub const RAW_DIR: &str = "RAW";
    pub const TRAJECTORY_DIR: &str = "TRAJECTORIES";
    pub const BATCH_FILE_NAME: &str = "batch.MEF";
    pub const REPORT_FILE_NAME: &str = "report.json";
    /// Width of the left-aligned stimulus column in scan records
    pub const STIMULUS_COLUMN_WIDTH: usize = 30;
    /// Width of the left-aligned sample index column in MEM records
    pub const INDEX_COLUMN_WIDTH: usize = 8;
    /// Line terminator required by the external fitting tool
    pub const SCAN_LINE_ENDING: &str = "\r\n";
}

/// Configuration file locations
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "mune-sim.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";
    pub const ENV_PREFIX: &str = "MUNE_SIM_";
    /// Separates section and key in environment overrides
    pub const ENV_SEPARATOR: &str = "__";
}
