//! Output formatting for grown segment sequences.
//!
//! The driver prints one of three views of a run to stdout:
//! plain text (one segment per line), JSON (an array of
//! `[[x0, y0, z0], [x1, y1, z1]]` pairs), or a short summary with the
//! segment count, bounding box and lengths.

use std::fmt::Write as _;

use clap::ValueEnum;
use coral_core::Segment;
use glam::DVec3;

/// Output view selected with `--format`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// `x0 y0 z0 x1 y1 z1` per line.
    Text,
    /// JSON array of coordinate-triple pairs.
    Json,
    /// Counts, bounding box and lengths.
    Summary,
}

/// Aggregate shape statistics of a segment sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: DVec3,
    pub max: DVec3,
    pub total_length: f64,
}

impl Summary {
    /// Computes the summary, or `None` for an empty sequence.
    pub fn of(segments: &[Segment]) -> Option<Self> {
        let first = segments.first()?;
        let mut min = first.start;
        let mut max = first.start;
        let mut total_length = 0.0;

        for s in segments {
            min = min.min(s.start).min(s.end);
            max = max.max(s.start).max(s.end);
            total_length += s.length();
        }

        Some(Self {
            count: segments.len(),
            min,
            max,
            total_length,
        })
    }

    #[inline]
    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }

    #[inline]
    pub fn mean_length(&self) -> f64 {
        self.total_length / self.count as f64
    }
}

/// Renders `segments` in the requested format.
///
/// Only the JSON view can fail (serialization).
pub fn render(segments: &[Segment], format: Format) -> Result<String, serde_json::Error> {
    let out = match format {
        Format::Text => {
            let mut out = String::new();
            for s in segments {
                // Writing into a String cannot fail.
                let _ = writeln!(
                    out,
                    "{:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
                    s.start.x, s.start.y, s.start.z, s.end.x, s.end.y, s.end.z
                );
            }
            out
        }
        Format::Json => {
            let triples: Vec<_> = segments.iter().map(Segment::to_triples).collect();
            let mut out = serde_json::to_string_pretty(&triples)?;
            out.push('\n');
            out
        }
        Format::Summary => match Summary::of(segments) {
            None => "segments: 0\n".to_string(),
            Some(sum) => {
                let e = sum.extent();
                format!(
                    "segments: {}\n\
                     bounds: [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]\n\
                     extent: x {:.3}, y {:.3}, z {:.3}\n\
                     total length: {:.3}\n\
                     mean length: {:.3}\n",
                    sum.count,
                    sum.min.x,
                    sum.min.y,
                    sum.min.z,
                    sum.max.x,
                    sum.max.y,
                    sum.max.z,
                    e.x,
                    e.y,
                    e.z,
                    sum.total_length,
                    sum.mean_length(),
                )
            }
        },
    };
    Ok(out)
}
