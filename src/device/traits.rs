// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Pressure source trait and sample types

use serde::{Deserialize, Serialize};

use crate::error::GripflowError;

/// One acquired time point.
///
/// Appended monotonically by the reader thread and immutable once written.
/// `elapsed_secs` is measured from the start of the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Calibrated pressure in grams
    pub pressure: f64,
    /// Raw digital count from the A/D converter
    pub raw: i64,
    /// Fake-feedback pressure in grams (playback channel)
    pub fake_pressure: f64,
    /// Raw count backing the fake-feedback channel
    pub fake_raw: i64,
    /// Seconds since the sampling loop started
    pub elapsed_secs: f64,
}

/// Windowed aggregate of the most recent samples, emitted once per sample
/// after the delay window has filled. Timestamps are shifted back by the
/// delay so the aggregate lines up with the samples it summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayedAggregate {
    /// Window mean of the real pressure channel, grams
    pub mean_pressure: f64,
    /// Window mean of the fake pressure channel, grams
    pub mean_fake: f64,
    /// Window standard deviation of the real pressure channel
    pub std_pressure: f64,
    /// Window standard deviation of the fake pressure channel
    pub std_fake: f64,
    /// Sample timestamp minus the delay, seconds
    pub elapsed_secs: f64,
}

/// A source of raw pressure counts, one reading per sampling tick.
///
/// Implemented by the HID hardware backend and by the simulator that stands
/// in when no device is attached.
pub trait PressureSource: Send {
    /// Human-readable identification for logs
    fn describe(&self) -> String;

    /// Read one raw digital count. Blocks at most for the hardware driver's
    /// own read timeout.
    fn read_raw(&mut self) -> Result<i64, GripflowError>;
}

/// Decode one 16-byte HID report into a raw pressure count.
///
/// The count sits at fixed offsets 3 and 4, combined big-endian
/// (`byte4 * 256 + byte3`).
pub fn decode_report(report: &[u8]) -> Result<i64, GripflowError> {
    if report.len() < 5 {
        return Err(GripflowError::DeviceRead(format!(
            "short HID report: {} bytes",
            report.len()
        )));
    }
    Ok(report[4] as i64 * 256 + report[3] as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_report() {
        let mut report = [0u8; 16];
        report[3] = 0xA0; // low byte
        report[4] = 0xAC; // high byte
        assert_eq!(decode_report(&report).unwrap(), 0xAC * 256 + 0xA0);
    }

    #[test]
    fn test_decode_short_report() {
        assert!(decode_report(&[1, 2, 3]).is_err());
    }
}
