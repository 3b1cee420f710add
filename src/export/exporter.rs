// src/export/exporter.rs
//! File system sink
//!
//! Layout under the output root:
//!
//! ```text
//! MEM/de-{d}/re-{r}/str-{s}/{pool_size}-{seed}.MEM   (or DAT/... .DAT)
//! MEM/de-{d}/re-{r}/str-{s}/batch.MEF
//! RAW/de-{d}/re-{r}/str-{s}/mu-{pool_size}/{seed}.txt
//! TRAJECTORIES/de-{d}/re-{r}/str-{s}/{seed}.tsv
//! report.json
//! ```

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::format::{format_batch_index, format_ground_truth, format_scan, format_trajectory};
use super::sink::{ArtifactKey, ArtifactSink};
use crate::config::constants::export::{BATCH_FILE_NAME, RAW_DIR, REPORT_FILE_NAME, TRAJECTORY_DIR};
use crate::config::{ExportConfig, ScanFormat};
use crate::error::{SimError, SimResult};
use crate::error_context;
use crate::motor::pool::MotorPool;
use crate::motor::scan::{Scan, ScanPoints};
use crate::simulation::condition::ExperimentCondition;
use crate::simulation::driver::ExperimentReport;
use crate::simulation::trajectory::Trajectory;

/// Writes artifacts as files under one output root
#[derive(Debug, Clone)]
pub struct FileExporter {
    config: ExportConfig,
    scan_points: ScanPoints,
}

impl FileExporter {
    /// `scan_points` is the header written into MEM files
    pub fn new(config: ExportConfig, scan_points: ScanPoints) -> Self {
        Self { config, scan_points }
    }

    pub fn root(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn scan_format(&self) -> ScanFormat {
        self.config.scan_format
    }

    pub fn scan_dir(&self, condition: &ExperimentCondition) -> PathBuf {
        self.root()
            .join(self.config.scan_format.extension())
            .join(condition.relative_dir())
    }

    pub fn scan_path(&self, key: &ArtifactKey) -> PathBuf {
        self.scan_dir(&key.condition)
            .join(format!("{}.{}", key.basename(), self.config.scan_format.extension()))
    }

    pub fn ground_truth_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root()
            .join(RAW_DIR)
            .join(key.condition.relative_dir())
            .join(format!("mu-{}", key.pool_size))
            .join(format!("{}.txt", key.seed))
    }

    pub fn batch_path(&self, condition: &ExperimentCondition) -> PathBuf {
        self.scan_dir(condition).join(BATCH_FILE_NAME)
    }

    pub fn trajectory_path(&self, trajectory: &Trajectory) -> PathBuf {
        self.root()
            .join(TRAJECTORY_DIR)
            .join(trajectory.condition.relative_dir())
            .join(format!("{}.tsv", trajectory.seed))
    }

    pub fn report_path(&self) -> PathBuf {
        self.root().join(REPORT_FILE_NAME)
    }

    fn write_file(&self, path: &Path, contents: &[u8], operation: &str) -> SimResult<()> {
        let io_error = |e| SimError::export_io(path, e, error_context!("exporter", operation));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let file = fs::File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(contents).map_err(io_error)?;
        writer.flush().map_err(io_error)?;

        tracing::trace!(path = %path.display(), bytes = contents.len(), "artifact written");
        Ok(())
    }
}

impl ArtifactSink for FileExporter {
    fn write_scan(&self, key: &ArtifactKey, scan: &Scan) -> SimResult<()> {
        let text = format_scan(scan, self.config.scan_format, &self.scan_points);
        self.write_file(&self.scan_path(key), text.as_bytes(), "write_scan")
    }

    fn write_ground_truth(&self, key: &ArtifactKey, pool: &MotorPool) -> SimResult<()> {
        if !self.config.ground_truth {
            return Ok(());
        }
        self.write_file(
            &self.ground_truth_path(key),
            format_ground_truth(pool).as_bytes(),
            "write_ground_truth",
        )
    }

    fn write_trajectory(&self, trajectory: &Trajectory) -> SimResult<()> {
        if !self.config.trajectories {
            return Ok(());
        }
        self.write_file(
            &self.trajectory_path(trajectory),
            format_trajectory(trajectory).as_bytes(),
            "write_trajectory",
        )
    }

    fn write_batch_index(&self, condition: &ExperimentCondition, basenames: &[String]) -> SimResult<()> {
        if !self.config.batch_index {
            return Ok(());
        }
        self.write_file(
            &self.batch_path(condition),
            format_batch_index(basenames).as_bytes(),
            "write_batch_index",
        )
    }

    fn write_report(&self, report: &ExperimentReport) -> SimResult<()> {
        if !self.config.report {
            return Ok(());
        }
        let path = self.report_path();
        let json = serde_json::to_vec_pretty(report).map_err(|e| {
            SimError::export_io(
                &path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                error_context!("exporter", "write_report"),
            )
        })?;
        self.write_file(&path, &json, "write_report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::degeneration::{DenervationPolicy, ReinnervationPolicy};
    use crate::motor::unit::MotorUnit;
    use tempfile::TempDir;

    fn exporter(root: &Path, format: ScanFormat) -> FileExporter {
        let config = ExportConfig {
            output_dir: root.to_path_buf(),
            scan_format: format,
            ..ExportConfig::default()
        };
        FileExporter::new(config, ScanPoints::new(3, 1))
    }

    fn key() -> ArtifactKey {
        let condition = ExperimentCondition::new(DenervationPolicy::Selective, ReinnervationPolicy::Random, 0.2);
        ArtifactKey::new(condition, 4, 80)
    }

    #[test]
    fn test_paths() {
        let exporter = exporter(Path::new("out"), ScanFormat::Mem);
        let key = key();
        let dir = Path::new("out/MEM/de-selective/re-random/str-0.2");

        assert_eq!(exporter.scan_path(&key), dir.join("80-4.MEM"));
        assert_eq!(exporter.batch_path(&key.condition), dir.join("batch.MEF"));
        assert_eq!(
            exporter.ground_truth_path(&key),
            Path::new("out/RAW/de-selective/re-random/str-0.2/mu-80/4.txt")
        );
    }

    #[test]
    fn test_writes_scan_and_ground_truth() {
        let dir = TempDir::new().unwrap();
        let exporter = exporter(dir.path(), ScanFormat::Dat);
        let key = key();

        let scan = Scan::new(vec![1.0, 2.0, 3.0], vec![0.0, 0.1, 0.2]).unwrap();
        exporter.write_scan(&key, &scan).unwrap();
        let written = fs::read_to_string(exporter.scan_path(&key)).unwrap();
        assert!(exporter.scan_path(&key).extension().is_some_and(|e| e == "DAT"));
        assert_eq!(written.lines().count(), 3);

        let pool = MotorPool::from_units([MotorUnit::new(0.05, 10.0, 0.1)]);
        exporter.write_ground_truth(&key, &pool).unwrap();
        let truth = fs::read_to_string(exporter.ground_truth_path(&key)).unwrap();
        assert_eq!(truth, "10\t0.05\n");
    }

    #[test]
    fn test_disabled_artifacts_are_skipped() {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig {
            output_dir: dir.path().to_path_buf(),
            ground_truth: false,
            ..ExportConfig::default()
        };
        let exporter = FileExporter::new(config, ScanPoints::new(3, 1));
        let key = key();

        exporter.write_ground_truth(&key, &MotorPool::default()).unwrap();
        assert!(!exporter.ground_truth_path(&key).exists());
    }

    #[test]
    fn test_unwritable_root_reports_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let exporter = exporter(&blocker, ScanFormat::Mem);
        let err = exporter.write_scan(&key(), &Scan::default()).unwrap_err();
        assert!(!err.is_trajectory_fatal());
        match err {
            SimError::ExportIo { path, .. } => assert!(path.starts_with(&blocker)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
