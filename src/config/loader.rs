// src/config/loader.rs
//! Layered configuration loader
//!
//! Defaults, then each configuration file in order, then `MUNE_SIM_*`
//! environment overrides. The merged document is validated before it is
//! handed out.

use crate::config::{constants::paths, SimulationConfig};
use std::path::{Path, PathBuf};

/// Configuration loader merging defaults, files and environment overrides
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    apply_env: bool,
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileNotFound(String),
    ParseError(String),
    ValidationError(Vec<String>),
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Configuration file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Configuration parse error: {}", msg),
            ConfigError::ValidationError(errors) => {
                write!(f, "Configuration validation errors: ")?;
                for error in errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
            ConfigError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Loader over the conventional locations: `mune-sim.toml`, then `config/local.toml`
    pub fn new() -> Self {
        Self::with_paths(vec![
            PathBuf::from(paths::DEFAULT_CONFIG_FILE),
            PathBuf::from(paths::LOCAL_CONFIG_FILE),
        ])
    }

    /// Create loader with custom paths; later paths override earlier ones
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            apply_env: true,
        }
    }

    /// Skip `MUNE_SIM_*` environment overrides
    pub fn without_env(mut self) -> Self {
        self.apply_env = false;
        self
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<SimulationConfig, ConfigError> {
        let mut merged = toml::Value::try_from(SimulationConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for config_path in &self.config_paths {
            match Self::load_config_file(config_path) {
                Ok(file_config) => {
                    tracing::debug!(path = %config_path.display(), "merging configuration file");
                    merge_toml_values(&mut merged, file_config);
                }
                // Missing files are optional layers
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        if self.apply_env {
            apply_environment_overrides(&mut merged, std::env::vars());
        }

        Self::finish(merged)
    }

    /// Parse a single TOML document on top of the defaults
    pub fn from_toml_str(content: &str) -> Result<SimulationConfig, ConfigError> {
        let mut merged = toml::Value::try_from(SimulationConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        let overlay: toml::Value = toml::from_str(content)?;
        merge_toml_values(&mut merged, overlay);
        Self::finish(merged)
    }

    /// Validate a configuration file without loading it into a run
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map(|_| ())
    }

    /// Write a configuration as pretty TOML
    pub fn export_config<P: AsRef<Path>>(config: &SimulationConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn finish(merged: toml::Value) -> Result<SimulationConfig, ConfigError> {
        let config: SimulationConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

        config
            .validate_consistency()
            .map_err(ConfigError::ValidationError)?;

        Ok(config)
    }

    fn load_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// `MUNE_SIM_SCAN__NOISE_STD=0.02` sets `scan.noise_std`
fn apply_environment_overrides<I>(config: &mut toml::Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(stripped) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };
        let config_path: Vec<String> = stripped
            .split(paths::ENV_SEPARATOR)
            .map(str::to_lowercase)
            .collect();
        if config_path.iter().any(String::is_empty) {
            tracing::warn!(variable = %key, "ignoring malformed configuration override");
            continue;
        }

        tracing::debug!(variable = %key, "applying environment override");
        set_nested_value(config, &config_path, parse_env_value(&value));
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else if let Ok(mut wrapper) = toml::from_str::<toml::Table>(&format!("v = {}", value)) {
        // Arrays such as `[1, 2, 3]`
        wrapper.remove("v").unwrap_or_else(|| toml::Value::String(value.to_string()))
    } else {
        toml::Value::String(value.to_string())
    }
}

fn set_nested_value(config: &mut toml::Value, path: &[String], value: toml::Value) {
    let mut current = config;

    for (i, part) in path.iter().enumerate() {
        let toml::Value::Table(table) = current else {
            return;
        };
        if i == path.len() - 1 {
            // Integers are accepted where the defaults hold floats
            let value = match (table.get(part), value) {
                (Some(toml::Value::Float(_)), toml::Value::Integer(int_val)) => toml::Value::Float(int_val as f64),
                (_, value) => value,
            };
            table.insert(part.clone(), value);
            return;
        }
        current = table
            .entry(part.clone())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
    }
}
