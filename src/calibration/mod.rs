// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Calibration constants for the pressure A/D converter
//!
//! Three scalars are persisted as plain-text single-integer files under the
//! correction directory: `g0.txt` (count at 0 g), `g200.txt` (count at 200 g)
//! and `offset_g0.txt` (tare offset). A recalibration averages a window of
//! recent raw counts and overwrites the corresponding file.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::DeviceConfig;
use crate::error::GripflowError;

const G0_FILE: &str = "g0.txt";
const G200_FILE: &str = "g200.txt";
const OFFSET_G0_FILE: &str = "offset_g0.txt";

/// Which calibration constant a recalibration targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPoint {
    /// Digital count with nothing on the sensor
    G0,
    /// Digital count with the 200 g reference weight
    G200,
    /// Tare offset count
    OffsetG0,
}

/// Persisted conversion constants from digital counts to grams
#[derive(Debug, Clone)]
pub struct Calibration {
    g0: i64,
    g200: i64,
    offset_g0: i64,
    dir: PathBuf,
}

impl Calibration {
    /// Build a calibration, rejecting a zero-width reference span.
    pub fn new(g0: i64, g200: i64, offset_g0: i64, dir: &Path) -> Result<Self, GripflowError> {
        if g0 == g200 {
            return Err(GripflowError::DegenerateCalibration { g0, g200 });
        }
        Ok(Self {
            g0,
            g200,
            offset_g0,
            dir: dir.to_path_buf(),
        })
    }

    /// Load constants from the correction directory, falling back to the
    /// configured defaults for any file that is missing or unreadable.
    pub fn load(dir: &Path, defaults: &DeviceConfig) -> Result<Self, GripflowError> {
        let g0 = read_constant(&dir.join(G0_FILE)).unwrap_or_else(|| {
            warn!("No stored g0, using default {}", defaults.g0);
            defaults.g0
        });
        let g200 = read_constant(&dir.join(G200_FILE)).unwrap_or_else(|| {
            warn!("No stored g200, using default {}", defaults.g200);
            defaults.g200
        });
        let offset_g0 = read_constant(&dir.join(OFFSET_G0_FILE)).unwrap_or_else(|| {
            warn!("No stored offset_g0, using default {}", defaults.offset_g0);
            defaults.offset_g0
        });

        let cal = Self::new(g0, g200, offset_g0, dir)?;
        info!(
            "Calibration loaded: g0={} g200={} offset_g0={}",
            cal.g0, cal.g200, cal.offset_g0
        );
        Ok(cal)
    }

    /// Persist all three constants, overwriting the correction files.
    pub fn save(&self) -> Result<(), GripflowError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(G0_FILE), format!("{}\n", self.g0))?;
        std::fs::write(self.dir.join(G200_FILE), format!("{}\n", self.g200))?;
        std::fs::write(self.dir.join(OFFSET_G0_FILE), format!("{}\n", self.offset_g0))?;
        info!("Calibration saved to {:?}", self.dir);
        Ok(())
    }

    /// Convert a raw digital count to grams.
    ///
    /// `grams = (raw - g0) / (g200 - g0) * 200`. The constructor guarantees
    /// `g0 != g200`, so the division is always defined.
    pub fn to_grams(&self, raw: i64) -> f64 {
        (raw - self.g0) as f64 / (self.g200 - self.g0) as f64 * 200.0
    }

    /// Recalibrate one constant from a window of recent raw counts.
    ///
    /// The window is averaged and the result replaces the targeted constant.
    /// An empty window leaves the calibration untouched.
    pub fn recalibrate(
        &mut self,
        point: CalibrationPoint,
        window: &[i64],
    ) -> Result<i64, GripflowError> {
        if window.is_empty() {
            warn!("Recalibration requested with an empty window, ignoring");
            return Err(GripflowError::EmptyCalibrationWindow);
        }

        let avg = window.iter().sum::<i64>() / window.len() as i64;
        match point {
            CalibrationPoint::G0 => {
                if avg == self.g200 {
                    return Err(GripflowError::DegenerateCalibration {
                        g0: avg,
                        g200: self.g200,
                    });
                }
                self.g0 = avg;
            }
            CalibrationPoint::G200 => {
                if avg == self.g0 {
                    return Err(GripflowError::DegenerateCalibration {
                        g0: self.g0,
                        g200: avg,
                    });
                }
                self.g200 = avg;
            }
            CalibrationPoint::OffsetG0 => self.offset_g0 = avg,
        }

        self.save()?;
        info!("Recalibrated {:?} to {} from {} samples", point, avg, window.len());
        Ok(avg)
    }

    /// Count at 0 g
    pub fn g0(&self) -> i64 {
        self.g0
    }

    /// Count at 200 g
    pub fn g200(&self) -> i64 {
        self.g200
    }

    /// Tare offset count
    pub fn offset_g0(&self) -> i64 {
        self.offset_g0
    }
}

fn read_constant(path: &Path) -> Option<i64> {
    let text = std::fs::read_to_string(path).ok()?;
    match text.trim().parse::<i64>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Malformed calibration file {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gripflow-cal-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_to_grams() {
        let cal = Calibration::new(44000, 46000, 0, Path::new(".")).unwrap();
        assert_eq!(cal.to_grams(45000), 100.0);
        assert_eq!(cal.to_grams(44000), 0.0);
        assert_eq!(cal.to_grams(46000), 200.0);
    }

    #[test]
    fn test_degenerate_span_rejected() {
        let err = Calibration::new(44000, 44000, 0, Path::new(".")).unwrap_err();
        assert!(matches!(err, GripflowError::DegenerateCalibration { .. }));
    }

    #[test]
    fn test_empty_window_is_rejected_without_change() {
        let dir = scratch_dir("empty");
        let mut cal = Calibration::new(44000, 46000, 0, &dir).unwrap();
        let err = cal.recalibrate(CalibrationPoint::G0, &[]).unwrap_err();
        assert!(matches!(err, GripflowError::EmptyCalibrationWindow));
        assert_eq!(cal.g0(), 44000);
    }

    #[test]
    fn test_recalibrate_persists_average() {
        let dir = scratch_dir("persist");
        let mut cal = Calibration::new(44000, 46000, 0, &dir).unwrap();
        let avg = cal
            .recalibrate(CalibrationPoint::G0, &[43990, 44000, 44010])
            .unwrap();
        assert_eq!(avg, 44000);

        let text = std::fs::read_to_string(dir.join(G0_FILE)).unwrap();
        assert_eq!(text.trim().parse::<i64>().unwrap(), 44000);
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let dir = scratch_dir("defaults");
        let defaults = DeviceConfig::default();
        let cal = Calibration::load(&dir.join("missing"), &defaults).unwrap();
        assert_eq!(cal.g0(), defaults.g0);
        assert_eq!(cal.g200(), defaults.g200);
    }
}
