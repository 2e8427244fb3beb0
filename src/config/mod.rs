// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! Configuration module

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Application version
    pub version: String,

    /// Data directory (session artifacts are written beneath it)
    pub data_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Display configuration
    pub display: DisplayConfig,

    /// Device configuration
    pub device: DeviceConfig,

    /// Experiment configuration
    pub experiment: ExperimentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "GripFlow".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            display: DisplayConfig::default(),
            device: DeviceConfig::default(),
            experiment: ExperimentConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("gripflow"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Display / feedback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Visible signal window in seconds
    pub window_length_seconds: f64,

    /// Feedback delay in seconds (length of the aggregate window)
    pub delay_seconds: f64,

    /// Reference pressure for the scorer, in grams
    pub ref_value: f64,

    /// Lower bound of the displayed value range, in grams
    pub min_value: f64,

    /// Upper bound of the displayed value range, in grams
    pub max_value: f64,

    /// Mean-proximity threshold for the two-step scorer, in grams
    pub two_step_mean_threshold: f64,

    /// Stability threshold for the two-step scorer, in grams
    pub two_step_std_threshold: f64,

    /// Length of the scoring window in seconds
    pub two_step_window_seconds: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_length_seconds: 20.0,
            delay_seconds: 10.0,
            ref_value: 500.0,
            min_value: -10.0,
            max_value: 1000.0,
            two_step_mean_threshold: 50.0,
            two_step_std_threshold: 10.0,
            two_step_window_seconds: 2.0,
        }
    }
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// USB product string of the pressure A/D converter
    pub product_string: String,

    /// Default digital count at 0 g (overridden by the correction files)
    pub g0: i64,

    /// Default digital count at 200 g (overridden by the correction files)
    pub g200: i64,

    /// Default tare offset count
    pub offset_g0: i64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_rate: 125,
            product_string: "HIDtoUART example".to_string(),
            g0: 44000,
            g200: 46000,
            offset_g0: 0,
        }
    }
}

/// Experiment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Directory holding saved protocol files
    pub protocols_dir: PathBuf,

    /// Directory holding the calibration correction files
    pub correction_dir: PathBuf,

    /// Numeric code stamped into artifacts for real-feedback blocks
    pub code_real: u8,

    /// Numeric code for fake-feedback blocks
    pub code_fake: u8,

    /// Numeric code for hidden-feedback blocks
    pub code_hide: u8,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            protocols_dir: PathBuf::from("./Protocols"),
            correction_dir: PathBuf::from("./correction"),
            code_real: 1,
            code_fake: 2,
            code_hide: 3,
        }
    }
}
