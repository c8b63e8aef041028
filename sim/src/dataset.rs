//! Text dataset reader.
//!
//! One record per line, whitespace separated:
//!
//! ```text
//! L  px   py            timestamp_us  gt_px gt_py gt_vx gt_vy
//! R  rho  phi  rho_dot  timestamp_us  gt_px gt_py gt_vx gt_vy
//! ```
//!
//! Trailing columns beyond the ground truth (e.g. true yaw and yaw rate) are
//! ignored. Blank lines are skipped.

use crate::replay::MeasurementRecord;
use anyhow::{anyhow, bail, Context};
use std::io::BufRead;
use std::path::Path;
use std::str::SplitWhitespace;
use ukf_core::{GroundTruth, Measurement};

fn next_f64(fields: &mut SplitWhitespace<'_>, name: &str) -> anyhow::Result<f64> {
    let raw = fields.next().ok_or_else(|| anyhow!("missing {name}"))?;
    raw.parse::<f64>()
        .with_context(|| format!("invalid {name} {raw:?}"))
}

fn next_timestamp(fields: &mut SplitWhitespace<'_>) -> anyhow::Result<i64> {
    let raw = fields.next().ok_or_else(|| anyhow!("missing timestamp"))?;
    raw.parse::<i64>()
        .with_context(|| format!("invalid timestamp {raw:?}"))
}

/// Parse one non-blank line.
pub fn parse_line(line: &str) -> anyhow::Result<MeasurementRecord> {
    let mut fields = line.split_whitespace();
    let tag = fields.next().ok_or_else(|| anyhow!("empty line"))?;
    let measurement = match tag {
        "L" => {
            let px = next_f64(&mut fields, "px")?;
            let py = next_f64(&mut fields, "py")?;
            Measurement::lidar(next_timestamp(&mut fields)?, px, py)
        }
        "R" => {
            let rho = next_f64(&mut fields, "rho")?;
            let phi = next_f64(&mut fields, "phi")?;
            let rho_dot = next_f64(&mut fields, "rho_dot")?;
            Measurement::radar(next_timestamp(&mut fields)?, rho, phi, rho_dot)
        }
        other => bail!("unknown sensor tag {other:?}"),
    };
    let ground_truth = GroundTruth {
        px: next_f64(&mut fields, "gt_px")?,
        py: next_f64(&mut fields, "gt_py")?,
        vx: next_f64(&mut fields, "gt_vx")?,
        vy: next_f64(&mut fields, "gt_vy")?,
    };
    Ok(MeasurementRecord {
        measurement,
        ground_truth,
    })
}

/// Parse a whole dataset; errors carry the 1-based line number.
pub fn read_dataset<R: BufRead>(reader: R) -> anyhow::Result<Vec<MeasurementRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_line(&line).with_context(|| format!("line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

pub fn load_dataset(path: &Path) -> anyhow::Result<Vec<MeasurementRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening dataset {}", path.display()))?;
    read_dataset(std::io::BufReader::new(file))
        .with_context(|| format!("parsing dataset {}", path.display()))
}
