//! Runtime settings for the loop driver and its device link.
//!
//! The control law is deliberately absent: gains are fixed constants.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::constants::{LOOP_PERIOD, PRODUCT_ID, VENDOR_ID};
use crate::sim::JoystickProfile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("loop period of {period_ms}ms is below the {min_ms}ms floor")]
    PeriodTooShort { period_ms: u64, min_ms: u64 },
    #[error("device `{0}` has no hardware link")]
    NoLink(DeviceKind),
}

/// Which device the loop talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    #[serde(rename = "sim")]
    #[strum(serialize = "sim")]
    Simulated,
    Hid,
    Bluetooth,
    /// USB HID, falling back to Bluetooth.
    Auto,
}

impl Default for DeviceKind {
    fn default() -> Self {
        DeviceKind::Simulated
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidConfig {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for HidConfig {
    fn default() -> Self {
        HidConfig {
            vendor_id: VENDOR_ID,
            product_id: PRODUCT_ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    pub local_name: String,
    pub scan_timeout_secs: u64,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        BluetoothConfig {
            local_name: "Hapkit".to_string(),
            scan_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub joystick: JoystickProfile,
    /// Arm speed at full servo deflection, in position units per second.
    pub max_speed: f32,
    pub initial_position: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            joystick: JoystickProfile::default(),
            max_speed: 100.0,
            initial_position: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub device: DeviceKind,
    pub loop_period_ms: u64,
    pub hid: HidConfig,
    pub bluetooth: BluetoothConfig,
    pub sim: SimConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            device: DeviceKind::default(),
            loop_period_ms: LOOP_PERIOD.as_millis() as u64,
            hid: HidConfig::default(),
            bluetooth: BluetoothConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_ms = LOOP_PERIOD.as_millis() as u64;
        if self.loop_period_ms < min_ms {
            return Err(ConfigError::PeriodTooShort {
                period_ms: self.loop_period_ms,
                min_ms,
            });
        }
        Ok(())
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }
}
