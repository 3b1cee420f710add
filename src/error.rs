// src/error.rs
//! Unified error handling for the motor pool simulator
//!
//! Every fallible operation in the crate returns [`SimResult`]. The variants
//! separate the three failure classes a simulation run can hit:
//!
//! - pool sizing failures raised by the degeneration engine,
//! - undefined distribution parameters raised while building a pool or grid,
//! - artifact persistence failures raised by the exporters.
//!
//! Core errors end the single trajectory that raised them; export errors are
//! recorded per artifact and never abort sibling trajectories.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the simulator
#[derive(Debug, Clone, Error)]
pub enum SimError {
    /// A subset request exceeds the available population, or a step cannot shrink the pool
    #[error("[POOL] Invalid pool size in {}: requested {requested} of {available} units ({})", .context.component, .context.operation)]
    InvalidPoolSize {
        requested: usize,
        available: usize,
        context: ErrorContext,
    },

    /// A distribution parameter makes the model undefined
    #[error("[DISTRIBUTION] Degenerate parameter '{parameter}' in {}: {reason}", .context.component)]
    DegenerateDistribution {
        parameter: String,
        reason: String,
        context: ErrorContext,
    },

    /// Failure to persist a scan, ground-truth, batch or report artifact
    #[error("[EXPORT] Failed to write {}: {source}", .path.display())]
    ExportIo {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
        context: ErrorContext,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("[CONFIG] Configuration error in {component}: {reason}")]
    Configuration {
        component: String,
        reason: String,
    },

    /// An exported record could not be read back
    #[error("[PARSE] Line {line}: {reason}")]
    Parse {
        line: usize,
        reason: String,
    },
}

/// Error categories for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    PoolSize,
    Distribution,
    Export,
    Configuration,
    Parse,
}

/// Where an error was raised
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorContext {
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: BTreeMap<String, String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: BTreeMap::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    /// Add additional information to the context
    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl SimError {
    pub fn invalid_pool_size(requested: usize, available: usize, context: ErrorContext) -> Self {
        SimError::InvalidPoolSize { requested, available, context }
    }

    pub fn degenerate_distribution(parameter: &str, reason: impl Into<String>, context: ErrorContext) -> Self {
        SimError::DegenerateDistribution {
            parameter: parameter.to_string(),
            reason: reason.into(),
            context,
        }
    }

    pub fn export_io(path: impl Into<PathBuf>, source: std::io::Error, context: ErrorContext) -> Self {
        SimError::ExportIo {
            path: path.into(),
            source: Arc::new(source),
            context,
        }
    }

    pub fn configuration(component: &str, reason: impl Into<String>) -> Self {
        SimError::Configuration {
            component: component.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SimError::InvalidPoolSize { .. } => ErrorCategory::PoolSize,
            SimError::DegenerateDistribution { .. } => ErrorCategory::Distribution,
            SimError::ExportIo { .. } => ErrorCategory::Export,
            SimError::Configuration { .. } => ErrorCategory::Configuration,
            SimError::Parse { .. } => ErrorCategory::Parse,
        }
    }

    /// Whether this error ends the trajectory that raised it.
    ///
    /// Export failures are reported per artifact and the simulation carries on.
    pub fn is_trajectory_fatal(&self) -> bool {
        !matches!(self, SimError::ExportIo { .. })
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            SimError::InvalidPoolSize { context, .. }
            | SimError::DegenerateDistribution { context, .. }
            | SimError::ExportIo { context, .. } => Some(context),
            SimError::Configuration { .. } | SimError::Parse { .. } => None,
        }
    }
}

impl From<crate::config::ConfigError> for SimError {
    fn from(err: crate::config::ConfigError) -> Self {
        SimError::configuration("config_loader", err.to_string())
    }
}

/// Result type alias for simulator operations
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_creation() {
        let context = ErrorContext::new("degeneration", "denervate");
        assert_eq!(context.component, "degeneration");
        assert_eq!(context.operation, "denervate");
        assert!(context.additional_info.is_empty());
    }

    #[test]
    fn test_error_context_macro_records_location() {
        let context = error_context!("pool", "initialize").add_info("unit_count", "0");
        assert!(context.file.is_some());
        assert!(context.line.is_some());
        assert_eq!(context.additional_info.get("unit_count").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_error_display() {
        let err = SimError::invalid_pool_size(12, 5, ErrorContext::new("degeneration", "reinnervate"));
        let display = err.to_string();
        assert!(display.contains("[POOL]"));
        assert!(display.contains("12"));
        assert!(display.contains("5"));
        assert!(display.contains("reinnervate"));
    }

    #[test]
    fn test_error_categories() {
        let pool = SimError::invalid_pool_size(1, 0, ErrorContext::new("a", "b"));
        let dist = SimError::degenerate_distribution("smup_mean", "must exceed minimum", ErrorContext::new("a", "b"));
        let io = SimError::export_io(
            "out/1-1.MEM",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ErrorContext::new("exporter", "write_scan"),
        );

        assert_eq!(pool.category(), ErrorCategory::PoolSize);
        assert_eq!(dist.category(), ErrorCategory::Distribution);
        assert_eq!(io.category(), ErrorCategory::Export);
        assert!(pool.is_trajectory_fatal());
        assert!(dist.is_trajectory_fatal());
        assert!(!io.is_trajectory_fatal());
    }

    #[test]
    fn test_export_error_keeps_source() {
        use std::error::Error;

        let err = SimError::export_io(
            "out/batch.MEF",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing dir"),
            ErrorContext::new("exporter", "write_batch_index"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("batch.MEF"));
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SimError>();
    }
}
