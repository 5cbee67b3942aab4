//! File I/O: boundary files in, benchmark records out.
//!
//! ## Boundary files
//!
//! [`BoundaryFileFormat::Rows`] holds two lines, the lower bounds and then the
//! upper bounds, each a list of numbers separated by commas and/or whitespace.
//! An empty line means that side is absent (implicitly 0 for lower, 1 for
//! upper):
//!
//! ```text
//! 0, 0.15, 0.5,
//! 0.4, 0.7, 1
//! ```
//!
//! [`BoundaryFileFormat::Pairs`] holds one `lower, upper` pair per line.
//!
//! ## Benchmark records
//!
//! JSON array of [`BenchRecord`], pretty-printed.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::benchmark::BenchRecord;
use crate::error::{CrossprobError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryFileFormat {
    Rows,
    Pairs,
}

/// Bounds as read from a file; either side may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBoundaries {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl RawBoundaries {
    fn check_expected_n(len: usize, expected_n: Option<usize>) -> Result<usize> {
        if len == 0 {
            return Err(CrossprobError::EmptyBoundary);
        }
        match expected_n {
            Some(n) if n != len => Err(CrossprobError::InvalidParameter(format!(
                "file has {len} bounds but n = {n} was requested"
            ))),
            _ => Ok(len),
        }
    }

    /// Both sides, filling a missing side with 0 (lower) or 1 (upper).
    pub fn two_sided(&self, expected_n: Option<usize>) -> Result<(Vec<f64>, Vec<f64>)> {
        let len = match (self.lower.len(), self.upper.len()) {
            (0, 0) => expected_n.unwrap_or(0),
            (0, hi) => hi,
            (lo, 0) => lo,
            (lo, hi) if lo == hi => lo,
            (lo, hi) => return Err(CrossprobError::LengthMismatch { lower: lo, upper: hi }),
        };
        let n = Self::check_expected_n(len, expected_n)?;
        let lower = if self.lower.is_empty() {
            vec![0.0; n]
        } else {
            self.lower.clone()
        };
        let upper = if self.upper.is_empty() {
            vec![1.0; n]
        } else {
            self.upper.clone()
        };
        Ok((lower, upper))
    }

    /// The lower side of a file whose upper line is empty.
    pub fn lower_only(&self, expected_n: Option<usize>) -> Result<Vec<f64>> {
        if !self.upper.is_empty() {
            return Err(CrossprobError::InvalidParameter(
                "expected only lower bounds, found upper bounds too".into(),
            ));
        }
        Self::check_expected_n(self.lower.len(), expected_n)?;
        Ok(self.lower.clone())
    }

    /// The upper side of a file whose lower line is empty.
    pub fn upper_only(&self, expected_n: Option<usize>) -> Result<Vec<f64>> {
        if !self.lower.is_empty() {
            return Err(CrossprobError::InvalidParameter(
                "expected only upper bounds, found lower bounds too".into(),
            ));
        }
        Self::check_expected_n(self.upper.len(), expected_n)?;
        Ok(self.upper.clone())
    }
}

fn parse_numbers(line: &str, line_number: usize) -> Result<Vec<f64>> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<f64>().map_err(|e| CrossprobError::Parse {
                line: line_number,
                message: format!("{token:?}: {e}"),
            })
        })
        .collect()
}

/// Two-line format: lower bounds, then upper bounds.
pub fn parse_rows(text: &str) -> Result<RawBoundaries> {
    let lines: Vec<&str> = text.lines().collect();
    let trailing_blank = lines.iter().rev().take_while(|l| l.trim().is_empty()).count();
    let significant = lines.len() - trailing_blank;
    if significant > 2 {
        return Err(CrossprobError::Parse {
            line: 3,
            message: "expected at most two lines (lower, upper)".into(),
        });
    }
    let lower = match lines.first() {
        Some(line) => parse_numbers(line, 1)?,
        None => Vec::new(),
    };
    let upper = match lines.get(1) {
        Some(line) => parse_numbers(line, 2)?,
        None => Vec::new(),
    };
    Ok(RawBoundaries { lower, upper })
}

/// One `lower, upper` pair per line; blank lines are skipped.
pub fn parse_pairs(text: &str) -> Result<RawBoundaries> {
    let mut raw = RawBoundaries::default();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let values = parse_numbers(line, index + 1)?;
        match values.as_slice() {
            &[lo, hi] => {
                raw.lower.push(lo);
                raw.upper.push(hi);
            }
            _ => {
                return Err(CrossprobError::Parse {
                    line: index + 1,
                    message: format!("expected 2 values, found {}", values.len()),
                })
            }
        }
    }
    Ok(raw)
}

pub fn read_boundary_file(path: &Path, format: BoundaryFileFormat) -> Result<RawBoundaries> {
    let text = fs::read_to_string(path).map_err(|source| CrossprobError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        BoundaryFileFormat::Rows => parse_rows(&text),
        BoundaryFileFormat::Pairs => parse_pairs(&text),
    }
}

pub fn save_bench_records(path: &Path, records: &[BenchRecord]) -> Result<()> {
    let start = Instant::now();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| CrossprobError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).map_err(|source| CrossprobError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        records = records.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "saved benchmark records"
    );
    Ok(())
}

pub fn load_bench_records(path: &Path) -> Result<Vec<BenchRecord>> {
    let text = fs::read_to_string(path).map_err(|source| CrossprobError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
