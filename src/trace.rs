//! Recorded tilt traces.
//!
//! One sample per line as `timestamp_seconds,x,y,z`, accelerations in g.
//! Blank lines and `#` comments are skipped.

use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::TraceError;
use crate::model::AccelSample;

pub fn load_trace(path: &Path) -> Result<Vec<AccelSample>, TraceError> {
    let text = fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let samples = parse_trace(&text)?;
    tracing::info!(path = %path.display(), samples = samples.len(), "trace loaded");
    Ok(samples)
}

pub fn parse_trace(text: &str) -> Result<Vec<AccelSample>, TraceError> {
    let mut samples = Vec::new();
    let mut last: Option<f64> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(TraceError::Malformed {
                line: line_no,
                message: format!("expected 4 fields, found {}", fields.len()),
            });
        }

        let mut values = [0.0f64; 4];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                TraceError::Malformed {
                    line: line_no,
                    message: format!("{field:?} is not a finite number"),
                }
            })?;
        }

        let [t, x, y, z] = values;
        if t < 0.0 {
            return Err(TraceError::Malformed {
                line: line_no,
                message: format!("negative timestamp {t}"),
            });
        }
        if last.is_some_and(|prev| t < prev) {
            return Err(TraceError::NonMonotonic { line: line_no, timestamp: t });
        }
        last = Some(t);

        samples.push(AccelSample::new(x, y, z, Duration::from_secs_f64(t)));
    }

    if samples.is_empty() {
        return Err(TraceError::Empty);
    }
    Ok(samples)
}

/// Phases of the built-in demo: (seconds, x, z) relative to a flat phone
const DEMO_PHASES: [(f64, f64, f64); 6] = [
    (1.0, 0.0, 0.0),
    (1.5, 0.0, -0.3),
    (1.0, 0.0, 0.0),
    (1.5, -0.3, 0.0),
    (1.0, 0.0, 0.0),
    (1.5, -0.3, -0.3),
];

/// Synthesized tilt session: forward, right, then both, with rests in between
pub fn demo_trace(sample_interval: Duration) -> Vec<AccelSample> {
    let step = sample_interval.as_secs_f64().max(1e-3);
    let total: f64 = DEMO_PHASES.iter().map(|(secs, _, _)| secs).sum();
    let count = (total / step).floor() as usize + 1;

    (0..count)
        .map(|i| {
            let t = i as f64 * step;
            let (x, z) = phase_at(t);
            AccelSample::new(x, -1.0, z, Duration::from_secs_f64(t))
        })
        .collect()
}

fn phase_at(t: f64) -> (f64, f64) {
    let mut start = 0.0;
    for (secs, x, z) in DEMO_PHASES {
        if t < start + secs {
            return (x, z);
        }
        start += secs;
    }
    (0.0, 0.0)
}
