// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Error types for GripFlow

use thiserror::Error;

/// Errors raised by the acquisition and experiment engine
#[derive(Debug, Error)]
pub enum GripflowError {
    /// Calibration constants would make the count-to-gram conversion divide by zero.
    #[error("invalid calibration: g0 ({g0}) equals g200 ({g200})")]
    DegenerateCalibration {
        /// Zero-gram reference count
        g0: i64,
        /// 200-gram reference count
        g200: i64,
    },

    /// Recalibration was requested with no samples in the averaging window.
    #[error("recalibration window is empty")]
    EmptyCalibrationWindow,

    /// Resampling needs at least four unique timestamps for a cubic spline.
    #[error("resampling needs at least 4 unique timestamps, got {0}")]
    DegenerateResampleInput(usize),

    /// The named protocol does not exist in the library.
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    /// The target HID device was not found on the bus.
    #[error("pressure device not found: {0}")]
    DeviceNotFound(String),

    /// A hardware read failed.
    #[error("device read failed: {0}")]
    DeviceRead(String),

    /// Invalid JSON in a protocol, fake-pressure, or session file.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure while loading or persisting state.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
