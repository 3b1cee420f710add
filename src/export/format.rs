// src/export/format.rs
//! Text record formats read by the external MUNE fitter
//!
//! Scan records end in `\r\n`; the fitter rejects bare line feeds. Floats are
//! written with Rust's shortest round-trip representation, so parsing a
//! record recovers the exact value that was written.

use crate::config::constants::export::{INDEX_COLUMN_WIDTH, SCAN_LINE_ENDING, STIMULUS_COLUMN_WIDTH};
use crate::config::ScanFormat;
use crate::error::{SimError, SimResult};
use crate::motor::pool::MotorPool;
use crate::motor::scan::{Scan, ScanPoints};
use crate::simulation::trajectory::Trajectory;

const SCAN_POINTS_PREFIX: &str = "Scanpts:";
const MEM_RECORD_PREFIX: &str = "MS.";

impl ScanFormat {
    /// File extension, also the name of the top-level output directory
    pub fn extension(&self) -> &'static str {
        match self {
            ScanFormat::Mem => "MEM",
            ScanFormat::Dat => "DAT",
        }
    }
}

/// One DAT record: stimulus left-aligned in a fixed column, then response
pub fn dat_record(stimulus: f64, response: f64) -> String {
    format!(
        "{:<width$} {}{}",
        stimulus,
        response,
        SCAN_LINE_ENDING,
        width = STIMULUS_COLUMN_WIDTH
    )
}

/// One MEM record with its 1-based sample index
pub fn mem_record(index: usize, stimulus: f64, response: f64) -> String {
    format!(
        "{}{:<iw$}{:<sw$} {}{}",
        MEM_RECORD_PREFIX,
        index,
        stimulus,
        response,
        SCAN_LINE_ENDING,
        iw = INDEX_COLUMN_WIDTH,
        sw = STIMULUS_COLUMN_WIDTH
    )
}

/// Header line marking the flat pre-scan and post-scan regions
pub fn scan_points_header(points: &ScanPoints) -> String {
    format!(
        "{} {}, {}, {}, {}{}",
        SCAN_POINTS_PREFIX,
        points.first,
        points.baseline_end,
        points.plateau_start,
        points.last,
        SCAN_LINE_ENDING
    )
}

pub fn format_dat(scan: &Scan) -> String {
    scan.pairs().map(|(s, r)| dat_record(s, r)).collect()
}

pub fn format_mem(scan: &Scan, points: &ScanPoints) -> String {
    let mut out = scan_points_header(points);
    for (i, (stimulus, response)) in scan.pairs().enumerate() {
        out.push_str(&mem_record(i + 1, stimulus, response));
    }
    out
}

pub fn format_scan(scan: &Scan, format: ScanFormat, points: &ScanPoints) -> String {
    match format {
        ScanFormat::Dat => format_dat(scan),
        ScanFormat::Mem => format_mem(scan, points),
    }
}

/// Parse either scan flavour back into stimulus/response pairs.
///
/// The `Scanpts:` header is skipped and `MS.` index columns are dropped.
/// Blank lines are ignored.
pub fn parse_scan(text: &str) -> SimResult<Scan> {
    let mut stimuli = Vec::new();
    let mut responses = Vec::new();

    for (number, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l.trim_end_matches('\r'))) {
        let line = line.trim();
        if line.is_empty() || line.starts_with(SCAN_POINTS_PREFIX) {
            continue;
        }

        let mut fields = line.split_whitespace();
        if line.starts_with(MEM_RECORD_PREFIX) {
            fields.next();
        }

        let stimulus = parse_field(fields.next(), number, "stimulus")?;
        let response = parse_field(fields.next(), number, "response")?;
        if fields.next().is_some() {
            return Err(SimError::Parse {
                line: number,
                reason: "unexpected trailing field".to_string(),
            });
        }

        stimuli.push(stimulus);
        responses.push(response);
    }

    Ok(Scan { stimuli, responses })
}

/// Read the boundary header of a MEM scan, if present
pub fn parse_scan_points(text: &str) -> SimResult<Option<ScanPoints>> {
    let header = match text.lines().next() {
        Some(line) if line.starts_with(SCAN_POINTS_PREFIX) => line,
        _ => return Ok(None),
    };

    let values = header[SCAN_POINTS_PREFIX.len()..]
        .split(',')
        .map(|v| {
            v.trim().parse::<usize>().map_err(|e| SimError::Parse {
                line: 1,
                reason: format!("scan point '{}': {}", v.trim(), e),
            })
        })
        .collect::<SimResult<Vec<usize>>>()?;

    match values.as_slice() {
        &[first, baseline_end, plateau_start, last] => Ok(Some(ScanPoints {
            first,
            baseline_end,
            plateau_start,
            last,
        })),
        other => Err(SimError::Parse {
            line: 1,
            reason: format!("expected 4 scan points, found {}", other.len()),
        }),
    }
}

/// `{threshold}\t{amplitude}` per unit, pool order
pub fn format_ground_truth(pool: &MotorPool) -> String {
    let mut out = String::with_capacity(pool.len() * 40);
    for unit in pool.units() {
        out.push_str(&format!("{}\t{}\n", unit.threshold, unit.amplitude));
    }
    out
}

/// Threshold/amplitude pairs of a ground-truth file
pub fn parse_ground_truth(text: &str) -> SimResult<Vec<(f64, f64)>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let mut fields = line.split('\t');
            let threshold = parse_field(fields.next(), i + 1, "threshold")?;
            let amplitude = parse_field(fields.next(), i + 1, "amplitude")?;
            Ok((threshold, amplitude))
        })
        .collect()
}

/// Scan basenames, one per line
pub fn format_batch_index<S: AsRef<str>>(basenames: &[S]) -> String {
    basenames
        .iter()
        .map(|name| format!("{}{}", name.as_ref(), SCAN_LINE_ENDING))
        .collect()
}

/// Tab-separated table of a trajectory, with header
pub fn format_trajectory(trajectory: &Trajectory) -> String {
    let mut out = String::from("pool_size\tmax_response\ttotal_amplitude\n");
    for point in &trajectory.points {
        out.push_str(&format!(
            "{}\t{}\t{}\n",
            point.pool_size, point.max_response, point.total_amplitude
        ));
    }
    out
}

fn parse_field(field: Option<&str>, line: usize, name: &str) -> SimResult<f64> {
    let raw = field.ok_or_else(|| SimError::Parse {
        line,
        reason: format!("missing {}", name),
    })?;
    raw.trim().parse::<f64>().map_err(|e| SimError::Parse {
        line,
        reason: format!("{} '{}': {}", name, raw, e),
    })
}
