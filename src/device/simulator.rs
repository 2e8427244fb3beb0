// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Simulated pressure source for demo/testing

use rand::prelude::*;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

use super::traits::PressureSource;
use crate::error::GripflowError;

/// Generates plausible raw counts when no hardware is attached.
///
/// The output wanders smoothly around two and a half reference weights above
/// g0 (roughly 500 g on a default calibration), with slow sinusoidal sway and
/// Gaussian measurement noise on top.
pub struct SimulatedSource {
    rng: StdRng,
    time: f64,
    step: f64,
    center: f64,
    sway: f64,
    drift: f64,
}

impl SimulatedSource {
    /// Build a simulator matched to the calibration span and sample rate.
    pub fn new(g0: i64, g200: i64, sample_rate: u32) -> Self {
        let span = (g200 - g0) as f64;
        Self {
            rng: StdRng::from_entropy(),
            time: 0.0,
            step: 1.0 / sample_rate.max(1) as f64,
            center: g0 as f64 + span * 2.5,
            sway: span * 0.25,
            drift: 0.0,
        }
    }
}

impl PressureSource for SimulatedSource {
    fn describe(&self) -> String {
        "simulated pressure source".to_string()
    }

    fn read_raw(&mut self) -> Result<i64, GripflowError> {
        self.time += self.step;
        self.drift += self.rng.gen_range(-0.5..0.5);

        // Two incommensurate slow sines stand in for hand tremor
        let mut value = self.center + self.drift;
        value += self.sway * (2.0 * PI * 0.13 * self.time).sin();
        value += self.sway * 0.4 * (2.0 * PI * 0.47 * self.time).sin();
        value += self.rng.sample::<f64, _>(StandardNormal) * 20.0;

        Ok(value.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_stays_near_center() {
        let mut source = SimulatedSource::new(44000, 46000, 125);
        for _ in 0..1000 {
            let raw = source.read_raw().unwrap();
            // center 49000, sway+noise well under a full span
            assert!((44000..=54000).contains(&raw), "raw {} out of range", raw);
        }
    }
}
