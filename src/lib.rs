// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! GripFlow - Pressure Biofeedback Acquisition & Experiment Engine
//!
//! A native engine for finger-pressure biofeedback sessions:
//! - Fixed-rate acquisition from a USB HID pressure A/D converter
//!   (simulated noise source when no hardware is attached)
//! - Block-design experiment protocols (real / fake / hidden feedback segments)
//! - Two-step gamified scoring driven by the delayed aggregate stream
//! - Per-session JSON artifacts for offline analysis
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Session Controller                    │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌───────────┐   ┌─────────┐  ┌────────┐  │
//! │  │ Realtime │ → │  Block    │ → │ TwoStep │  │Protocol│  │
//! │  │ Reader   │   │  Manager  │   │ Scorer  │  │Library │  │
//! │  └──────────┘   └───────────┘   └─────────┘  └────────┘  │
//! │       ↓                                          ↓       │
//! │  ┌───────────┐  ┌───────────┐   ┌────────────────────┐   │
//! │  │Calibration│  │ Resampler │   │ Session artifacts  │   │
//! │  └───────────┘  └───────────┘   └────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod analysis;
pub mod calibration;
pub mod config;
pub mod device;
pub mod error;
pub mod experiment;
pub mod session;

// Re-exports for convenience
pub use calibration::Calibration;
pub use config::Config;
pub use device::{DelayedAggregate, FakePressure, PressureSource, RealTimeReader, Sample};
pub use error::GripflowError;
pub use experiment::{Block, BlockManager, BlockName, BlockOutcome, ProtocolLibrary, TwoStepScorer};
pub use session::{SessionController, SessionStatus, SubjectInfo};

/// GripFlow version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GripFlow name
pub const NAME: &str = "GripFlow";
