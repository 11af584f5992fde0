use crate::config::{BluetoothConfig, HidConfig};
use crate::constants::*;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(feature = "hid")]
use hidapi::HidApi;
#[cfg(feature = "hid")]
use parking_lot::Mutex;
#[cfg(feature = "hid")]
use std::sync::Arc;

#[cfg(feature = "bluetooth")]
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
#[cfg(feature = "bluetooth")]
use btleplug::platform::{Manager, Peripheral};
#[cfg(feature = "bluetooth")]
use futures::stream::StreamExt;
#[cfg(feature = "bluetooth")]
use tokio::time::Duration;
#[cfg(feature = "bluetooth")]
use uuid::Uuid;

#[cfg(feature = "bluetooth")]
const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000ffe000001000800000805f9b34fb);
#[cfg(feature = "bluetooth")]
const CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x0000ffe100001000800000805f9b34fb);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(
        "Invalid response data: expected length {expected_len} but got {actual_len}. \
         Raw data: {raw_data:02x?}"
    )]
    InvalidResponse {
        expected_len: usize,
        actual_len: usize,
        raw_data: Vec<u8>,
    },
    #[error("Device error: {0}")]
    DeviceError(String),
    #[error("No device found")]
    NoDeviceFound,
    #[error("{0} support was not compiled in")]
    Unsupported(&'static str),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// Builds `0x55 0x55 <len> <cmd> <data..>`, where `len` counts `data` plus two.
pub fn encode_frame(cmd: u8, data: &[u8]) -> Vec<u8> {
    let mut frame = vec![SIGNATURE, SIGNATURE, (data.len() + 2) as u8, cmd];
    frame.extend_from_slice(data);
    frame
}

/// Checks a reply frame for `cmd` and returns its payload.
pub fn decode_frame(cmd: u8, buf: &[u8]) -> Result<Vec<u8>, TransportError> {
    if buf.len() < 4 {
        return Err(TransportError::InvalidResponse {
            expected_len: 4,
            actual_len: buf.len(),
            raw_data: buf.to_vec(),
        });
    }

    if buf[0] != SIGNATURE || buf[1] != SIGNATURE {
        return Err(TransportError::DeviceError(format!(
            "Invalid signature: {:02x} {:02x}",
            buf[0], buf[1]
        )));
    }

    if buf[3] != cmd {
        return Err(TransportError::DeviceError(format!(
            "Reply to command {:02x} while waiting for {:02x}",
            buf[3], cmd
        )));
    }

    let payload_len = (buf[2] as usize).saturating_sub(2);
    if buf.len() < 4 + payload_len {
        return Err(TransportError::InvalidResponse {
            expected_len: 4 + payload_len,
            actual_len: buf.len(),
            raw_data: buf.to_vec(),
        });
    }

    Ok(buf[4..4 + payload_len].to_vec())
}

/// Link to the Hapkit bridge board.
pub enum Transport {
    #[cfg(feature = "hid")]
    Hid(Arc<Mutex<hidapi::HidDevice>>),
    #[cfg(feature = "bluetooth")]
    Bluetooth {
        device: Peripheral,
        characteristic: Characteristic,
    },
}

impl Transport {
    /// USB first, Bluetooth if that fails.
    pub async fn new(hid: &HidConfig, bluetooth: &BluetoothConfig) -> Result<Self, TransportError> {
        match Self::hid(hid).await {
            Ok(transport) => Ok(transport),
            Err(e) => {
                warn!("Failed to connect via USB HID: {}. Trying Bluetooth...", e);
                match Self::bluetooth(bluetooth).await {
                    Ok(transport) => Ok(transport),
                    Err(e) => {
                        warn!("Failed to connect via Bluetooth: {}", e);
                        Err(TransportError::NoDeviceFound)
                    }
                }
            }
        }
    }

    #[cfg(feature = "hid")]
    pub async fn hid(config: &HidConfig) -> Result<Self, TransportError> {
        let (vendor_id, product_id) = (config.vendor_id, config.product_id);
        let device = tokio::task::spawn_blocking(
            move || -> Result<hidapi::HidDevice, TransportError> {
                let api = HidApi::new().map_err(|e| TransportError::DeviceError(e.to_string()))?;
                api.open(vendor_id, product_id)
                    .map_err(|e| TransportError::DeviceError(e.to_string()))
            },
        )
        .await??;

        tracing::info!(vendor_id, product_id, "Connected via USB HID");
        Ok(Transport::Hid(Arc::new(Mutex::new(device))))
    }

    #[cfg(not(feature = "hid"))]
    pub async fn hid(_config: &HidConfig) -> Result<Self, TransportError> {
        Err(TransportError::Unsupported("USB HID"))
    }

    #[cfg(feature = "bluetooth")]
    pub async fn bluetooth(config: &BluetoothConfig) -> Result<Self, TransportError> {
        let (device, characteristic) = Self::try_bluetooth(config)
            .await
            .map_err(|e| TransportError::DeviceError(e.to_string()))?;

        tracing::info!(name = %config.local_name, "Connected via Bluetooth");
        Ok(Transport::Bluetooth {
            device,
            characteristic,
        })
    }

    #[cfg(not(feature = "bluetooth"))]
    pub async fn bluetooth(_config: &BluetoothConfig) -> Result<Self, TransportError> {
        Err(TransportError::Unsupported("Bluetooth"))
    }

    #[cfg(feature = "bluetooth")]
    async fn try_bluetooth(
        config: &BluetoothConfig,
    ) -> Result<(Peripheral, Characteristic), Box<dyn std::error::Error + Send + Sync>> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters.into_iter().next().ok_or("No Bluetooth adapter found")?;

        adapter.start_scan(ScanFilter::default()).await?;

        let mut events = adapter.events().await?;
        let scan_timeout = Duration::from_secs(config.scan_timeout_secs);

        tracing::info!("Scanning for {}...", config.local_name);

        let mut found_device = None;
        while let Ok(Some(event)) = tokio::time::timeout(scan_timeout, events.next()).await {
            if let btleplug::api::CentralEvent::DeviceDiscovered(id) = event {
                let peripheral = adapter.peripheral(&id).await?;
                if let Ok(Some(properties)) = peripheral.properties().await {
                    if properties.local_name.as_deref() == Some(config.local_name.as_str()) {
                        found_device = Some(peripheral);
                        break;
                    }
                }
            }
        }

        adapter.stop_scan().await?;

        let device = found_device.ok_or_else(|| format!("{} not found", config.local_name))?;
        device.connect().await?;
        device.discover_services().await?;

        let characteristic = device
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == CHARACTERISTIC_UUID && c.service_uuid == SERVICE_UUID)
            .ok_or("Communication characteristic not found")?;

        if characteristic.properties.contains(CharPropFlags::NOTIFY) {
            device.subscribe(&characteristic).await?;
        }

        Ok((device, characteristic))
    }

    pub async fn send(&mut self, cmd: u8, data: &[u8]) -> Result<(), TransportError> {
        debug!(cmd, ?data, "send");
        match *self {
            #[cfg(feature = "hid")]
            Transport::Hid(ref device) => {
                let device = Arc::clone(device);
                // HID reports lead with the report id.
                let mut report_data = vec![0];
                report_data.extend_from_slice(&encode_frame(cmd, data));

                tokio::task::spawn_blocking(move || device.lock().write(&report_data))
                    .await?
                    .map_err(|e| TransportError::DeviceError(e.to_string()))?;

                Ok(())
            }
            #[cfg(feature = "bluetooth")]
            Transport::Bluetooth {
                ref device,
                ref characteristic,
            } => {
                device
                    .write(characteristic, &encode_frame(cmd, data), WriteType::WithResponse)
                    .await
                    .map_err(|e| TransportError::DeviceError(e.to_string()))?;
                Ok(())
            }
        }
    }

    #[cfg_attr(not(any(feature = "hid", feature = "bluetooth")), allow(unused_variables))]
    pub async fn recv(&mut self, cmd: u8) -> Result<Vec<u8>, TransportError> {
        match *self {
            #[cfg(feature = "hid")]
            Transport::Hid(ref device) => {
                let device = Arc::clone(device);
                let (buf, res) = tokio::task::spawn_blocking(
                    move || -> Result<([u8; 64], usize), TransportError> {
                        let mut buf = [0u8; 64];
                        let res = device
                            .lock()
                            .read_timeout(&mut buf, 1000)
                            .map_err(|e| TransportError::DeviceError(e.to_string()))?;
                        Ok((buf, res))
                    },
                )
                .await??;

                decode_frame(cmd, &buf[..res])
            }
            #[cfg(feature = "bluetooth")]
            Transport::Bluetooth {
                ref device,
                ref characteristic,
            } => {
                let buf = if characteristic.properties.contains(CharPropFlags::NOTIFY) {
                    let mut notifications = device
                        .notifications()
                        .await
                        .map_err(|e| TransportError::DeviceError(e.to_string()))?;
                    match tokio::time::timeout(Duration::from_secs(1), notifications.next()).await {
                        Ok(Some(data)) => data.value,
                        _ => return Err(TransportError::DeviceError("No response received".into())),
                    }
                } else {
                    device
                        .read(characteristic)
                        .await
                        .map_err(|e| TransportError::DeviceError(e.to_string()))?
                };

                decode_frame(cmd, &buf)
            }
        }
    }
}
