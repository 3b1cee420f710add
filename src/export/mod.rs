//! Artifact export for the external MUNE fitter
//! Location: src/export/mod.rs

pub mod format;
pub mod sink;
pub mod exporter;

pub use exporter::FileExporter;
pub use format::{format_scan, parse_ground_truth, parse_scan, parse_scan_points};
pub use sink::{ArtifactKey, ArtifactSink, MemorySink, NullSink};
