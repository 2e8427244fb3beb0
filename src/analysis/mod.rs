// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Signal analysis - window statistics and uniform-grid resampling

mod resample;
mod stats;

pub use resample::{resample_to_grid, ResampledData, RESAMPLE_STEP_SECS};
pub use stats::{mean, population_std};
