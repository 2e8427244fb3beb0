// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Fake-pressure playback channel
//!
//! Fake-feedback blocks replay a previously recorded pressure trace instead of
//! the live signal. The trace is a JSON array of rows whose first two columns
//! are `(pressure_grams, raw_count)`; extra columns are ignored so a recorded
//! session file can be loaded directly.

use std::path::Path;

use tracing::{debug, warn};

/// Cyclic playback buffer for the fake-feedback channel.
#[derive(Debug, Clone)]
pub struct FakePressure {
    buffer: Vec<(f64, i64)>,
    cursor: usize,
}

impl Default for FakePressure {
    fn default() -> Self {
        warn!("No fake pressure trace loaded, using the built-in two-point default");
        Self {
            buffer: vec![(100.0, 45000), (200.0, 46000)],
            cursor: 0,
        }
    }
}

impl FakePressure {
    /// Build a playback buffer from `(pressure, raw)` pairs.
    /// An empty input falls back to the built-in default.
    pub fn new(pairs: Vec<(f64, i64)>) -> Self {
        if pairs.is_empty() {
            return Self::default();
        }

        let pressures: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let n = pressures.len();
        let max = pressures.iter().cloned().fold(f64::MIN, f64::max);
        let min = pressures.iter().cloned().fold(f64::MAX, f64::min);
        let avg = pressures.iter().sum::<f64>() / n as f64;
        debug!(
            "Loaded fake pressure trace: n={} min={:.1} max={:.1} avg={:.1}",
            n, min, max, avg
        );

        Self {
            buffer: pairs,
            cursor: 0,
        }
    }

    /// Load a trace from a JSON file. A malformed file is logged and the
    /// current buffer is retained.
    pub fn load_file(&mut self, path: &Path) -> bool {
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                serde_json::from_str::<Vec<Vec<f64>>>(&text).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(rows) => {
                let pairs: Vec<(f64, i64)> = rows
                    .iter()
                    .filter(|r| r.len() >= 2)
                    .map(|r| (r[0], r[1] as i64))
                    .collect();
                if pairs.is_empty() {
                    warn!("Fake pressure file {:?} holds no usable rows, keeping previous trace", path);
                    return false;
                }
                *self = Self::new(pairs);
                true
            }
            Err(e) => {
                warn!("Failed to load fake pressure file {:?}: {}", path, e);
                false
            }
        }
    }

    /// Next `(pressure, raw)` pair, wrapping around at the end of the trace.
    pub fn next_pair(&mut self) -> (f64, i64) {
        let pair = self.buffer[self.cursor];
        self.cursor = (self.cursor + 1) % self.buffer.len();
        pair
    }

    /// Number of time points in the trace
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when the trace is empty (never the case after construction)
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraparound() {
        let mut fake = FakePressure::new(vec![(1.0, 10), (2.0, 20), (3.0, 30)]);
        let seen: Vec<i64> = (0..7).map(|_| fake.next_pair().1).collect();
        assert_eq!(seen, vec![10, 20, 30, 10, 20, 30, 10]);
    }

    #[test]
    fn test_default_two_points() {
        let mut fake = FakePressure::default();
        assert_eq!(fake.len(), 2);
        assert_eq!(fake.next_pair(), (100.0, 45000));
        assert_eq!(fake.next_pair(), (200.0, 46000));
    }

    #[test]
    fn test_malformed_file_keeps_previous() {
        let path = std::env::temp_dir().join(format!("gripflow-fake-{}.json", std::process::id()));
        std::fs::write(&path, "not json at all").unwrap();

        let mut fake = FakePressure::new(vec![(5.0, 50)]);
        assert!(!fake.load_file(&path));
        assert_eq!(fake.next_pair(), (5.0, 50));
    }

    #[test]
    fn test_load_session_rows() {
        let path = std::env::temp_dir().join(format!("gripflow-rows-{}.json", std::process::id()));
        std::fs::write(&path, "[[100.0, 45000.0, -1, -1, 0.0], [110.0, 45100.0, -1, -1, 0.008]]")
            .unwrap();

        let mut fake = FakePressure::default();
        assert!(fake.load_file(&path));
        assert_eq!(fake.len(), 2);
        assert_eq!(fake.next_pair(), (100.0, 45000));
    }
}
