// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! USB HID backend for the pressure A/D converter

use hidapi::{HidApi, HidDevice};
use tracing::info;

use super::traits::{decode_report, PressureSource};
use crate::error::GripflowError;

/// Per-read timeout handed to the HID driver, milliseconds
const READ_TIMEOUT_MS: i32 = 100;

/// A finger-pressure A/D converter speaking 16-byte HID reports.
pub struct HidSource {
    device: HidDevice,
    product_string: String,
}

impl HidSource {
    /// Enumerate the HID bus and open the first device whose product string
    /// matches. Absence is an error; the caller decides whether to fall back
    /// to the simulator.
    pub fn detect(product_string: &str) -> Result<Self, GripflowError> {
        let api = HidApi::new()
            .map_err(|e| GripflowError::DeviceNotFound(format!("hidapi init failed: {}", e)))?;

        let info = api
            .device_list()
            .find(|d| d.product_string() == Some(product_string))
            .ok_or_else(|| GripflowError::DeviceNotFound(product_string.to_string()))?;

        let device = info
            .open_device(&api)
            .map_err(|e| GripflowError::DeviceNotFound(format!("open failed: {}", e)))?;

        info!(
            "Opened pressure device '{}' at {:?}",
            product_string,
            info.path()
        );

        Ok(Self {
            device,
            product_string: product_string.to_string(),
        })
    }
}

impl PressureSource for HidSource {
    fn describe(&self) -> String {
        format!("HID device '{}'", self.product_string)
    }

    fn read_raw(&mut self) -> Result<i64, GripflowError> {
        let mut report = [0u8; 16];
        let n = self
            .device
            .read_timeout(&mut report, READ_TIMEOUT_MS)
            .map_err(|e| GripflowError::DeviceRead(e.to_string()))?;
        if n == 0 {
            return Err(GripflowError::DeviceRead("read timed out".to_string()));
        }
        decode_report(&report)
    }
}
