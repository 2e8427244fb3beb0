// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Device module - pressure hardware, simulation and the real-time reader

mod fake;
mod reader;
mod simulator;
mod traits;

#[cfg(feature = "hardware")]
mod hid;

pub use fake::FakePressure;
pub use reader::RealTimeReader;
pub use simulator::SimulatedSource;
pub use traits::{decode_report, DelayedAggregate, PressureSource, Sample};

#[cfg(feature = "hardware")]
pub use hid::HidSource;
