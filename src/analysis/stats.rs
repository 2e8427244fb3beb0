// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Window statistics for the delayed aggregate stream

/// Arithmetic mean. Empty input yields 0.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (the aggregate stream summarizes a complete
/// window, not a sample of one). Empty input yields 0.
pub fn population_std(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let var = data.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    var.sqrt()
}
