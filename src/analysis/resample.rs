// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Uniform-grid re-alignment of the raw sample log
//!
//! The sampling loop is cadence-anchored but cooperative, so recorded
//! timestamps can jitter, repeat, or land out of order. Before a session is
//! persisted the raw log is re-aligned onto a uniform 8 ms (125 Hz) grid:
//! duplicate timestamps are collapsed (first occurrence wins), the rows are
//! sorted by time, and each channel is cubic-spline interpolated onto the
//! grid independently.

use serde::{Deserialize, Serialize};

use crate::device::Sample;
use crate::error::GripflowError;

/// Grid step of the re-aligned output: 8 ms, i.e. 125 Hz
pub const RESAMPLE_STEP_SECS: f64 = 0.008;

/// Channel-major view of a re-aligned session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledData {
    /// Calibrated pressure, grams
    pub pressure: Vec<f64>,
    /// Raw digital counts (interpolated, hence fractional)
    pub raw: Vec<f64>,
    /// Fake-feedback pressure, grams
    pub fake_pressure: Vec<f64>,
    /// Raw counts backing the fake channel
    pub fake_raw: Vec<f64>,
    /// Uniform grid timestamps, seconds
    pub elapsed_secs: Vec<f64>,
}

impl ResampledData {
    /// Number of grid points
    pub fn len(&self) -> usize {
        self.elapsed_secs.len()
    }

    /// True when the grid is empty
    pub fn is_empty(&self) -> bool {
        self.elapsed_secs.is_empty()
    }
}

/// Re-align a raw sample log onto the uniform 8 ms grid.
///
/// Fewer than four unique timestamps cannot support a cubic spline and yield
/// an explicit error rather than a degenerate fit.
pub fn resample_to_grid(samples: &[Sample]) -> Result<ResampledData, GripflowError> {
    // Collapse identical timestamps, first occurrence wins
    let mut rows: Vec<Sample> = Vec::with_capacity(samples.len());
    for s in samples {
        if rows.last().map(|p| p.elapsed_secs) != Some(s.elapsed_secs) {
            rows.push(*s);
        }
    }

    rows.sort_by(|a, b| a.elapsed_secs.total_cmp(&b.elapsed_secs));
    rows.dedup_by_key(|s| s.elapsed_secs);

    if rows.len() < 4 {
        return Err(GripflowError::DegenerateResampleInput(rows.len()));
    }

    let xs: Vec<f64> = rows.iter().map(|s| s.elapsed_secs).collect();
    let max_t = xs[xs.len() - 1];

    // arange semantics: the grid stops short of max_t, with a little slack
    // so a timestamp that is an exact grid multiple is not double counted
    let n = (max_t / RESAMPLE_STEP_SECS - 1e-9).ceil() as usize;
    let grid: Vec<f64> = (0..n).map(|i| i as f64 * RESAMPLE_STEP_SECS).collect();

    let channel = |f: fn(&Sample) -> f64| -> Vec<f64> {
        let ys: Vec<f64> = rows.iter().map(f).collect();
        spline_eval(&xs, &ys, &grid)
    };

    Ok(ResampledData {
        pressure: channel(|s| s.pressure),
        raw: channel(|s| s.raw as f64),
        fake_pressure: channel(|s| s.fake_pressure),
        fake_raw: channel(|s| s.fake_raw as f64),
        elapsed_secs: grid,
    })
}

/// Natural cubic spline through `(xs, ys)`, evaluated at `grid`.
///
/// `xs` must be strictly increasing with at least four knots. Points outside
/// the knot range are extrapolated with the boundary segments.
fn spline_eval(xs: &[f64], ys: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = (0..n - 1).map(|i| xs[i + 1] - xs[i]).collect();

    // Second derivatives via the Thomas algorithm, natural boundary conditions
    let mut diag = vec![0.0; n];
    let mut upper = vec![0.0; n];
    let mut rhs = vec![0.0; n];
    diag[0] = 1.0;
    diag[n - 1] = 1.0;
    for i in 1..n - 1 {
        diag[i] = 2.0 * (h[i - 1] + h[i]);
        upper[i] = h[i];
        rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
    }

    // Forward sweep. The first and last rows are the trivial m = 0 equations.
    for i in 2..n - 1 {
        let w = h[i - 1] / diag[i - 1];
        diag[i] -= w * upper[i - 1];
        rhs[i] -= w * rhs[i - 1];
    }

    let mut m = vec![0.0; n];
    for i in (1..n - 1).rev() {
        m[i] = (rhs[i] - upper[i] * m[i + 1]) / diag[i];
    }

    grid.iter()
        .map(|&x| {
            // Segment holding x, clamped so out-of-range points extrapolate
            let i = match xs.binary_search_by(|v| v.total_cmp(&x)) {
                Ok(k) => k.min(n - 2),
                Err(k) => k.saturating_sub(1).min(n - 2),
            };
            let hi = h[i];
            let a = xs[i + 1] - x;
            let b = x - xs[i];
            m[i] * a.powi(3) / (6.0 * hi)
                + m[i + 1] * b.powi(3) / (6.0 * hi)
                + (ys[i] / hi - m[i] * hi / 6.0) * a
                + (ys[i + 1] / hi - m[i + 1] * hi / 6.0) * b
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, pressure: f64) -> Sample {
        Sample {
            pressure,
            raw: (pressure * 10.0) as i64,
            fake_pressure: pressure / 2.0,
            fake_raw: (pressure * 5.0) as i64,
            elapsed_secs: t,
        }
    }

    #[test]
    fn test_degenerate_input_is_an_error() {
        let samples: Vec<Sample> = (0..3).map(|i| sample(i as f64 * 0.008, 1.0)).collect();
        let err = resample_to_grid(&samples).unwrap_err();
        assert!(matches!(err, GripflowError::DegenerateResampleInput(3)));
    }

    #[test]
    fn test_duplicate_timestamps_collapse_to_first() {
        let mut samples: Vec<Sample> = (0..10).map(|i| sample(i as f64 * 0.008, i as f64)).collect();
        // Duplicate of t = 0.016 with a wild value; the first occurrence wins
        let mut dup = sample(2.0 * 0.008, 999.0);
        dup.raw = 12345;
        samples.insert(3, dup);

        let out = resample_to_grid(&samples).unwrap();
        assert!((out.pressure[2] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_order_timestamps_are_sorted() {
        let mut samples: Vec<Sample> = (0..10).map(|i| sample(i as f64 * 0.008, i as f64)).collect();
        samples.swap(4, 7);
        let out = resample_to_grid(&samples).unwrap();
        for (i, t) in out.elapsed_secs.iter().enumerate() {
            assert!((t - i as f64 * RESAMPLE_STEP_SECS).abs() < 1e-12);
        }
        assert!((out.pressure[4] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_idempotent_on_uniform_input() {
        // Already-uniform 8 ms data comes back unchanged at the shared timestamps
        let samples: Vec<Sample> = (0..200)
            .map(|i| {
                let t = i as f64 * RESAMPLE_STEP_SECS;
                sample(t, 500.0 + 40.0 * (2.0 * std::f64::consts::PI * 0.5 * t).sin())
            })
            .collect();

        let out = resample_to_grid(&samples).unwrap();
        assert_eq!(out.len(), 199); // grid stops short of max_t

        for (i, &t) in out.elapsed_secs.iter().enumerate() {
            assert!((t - samples[i].elapsed_secs).abs() < 1e-12);
            assert!(
                (out.pressure[i] - samples[i].pressure).abs() < 1e-6,
                "channel diverged at grid point {}",
                i
            );
        }
    }
}
