//! Device models
//!
//! This module provides the stored device shape, its transfer shape and the
//! typed requests used to create and update devices.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::sensor::{Sensor, SensorDto};

/// Maximum length for a device name (matches database constraint)
pub const MAX_DEVICE_NAME_LEN: usize = 255;
/// Maximum length for a device description (matches database constraint)
pub const MAX_DEVICE_DESCRIPTION_LEN: usize = 1024;

/// Errors that can occur during device request validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceValidationError {
    #[error("device name cannot be empty")]
    EmptyName,
    #[error("device name exceeds maximum length of {MAX_DEVICE_NAME_LEN} (got {0})")]
    NameTooLong(usize),
    #[error("device description exceeds maximum length of {MAX_DEVICE_DESCRIPTION_LEN} (got {0})")]
    DescriptionTooLong(usize),
}

/// Device as stored, plus its associated sensors
///
/// An `id` of `0` means the row was never persisted or was not found; the
/// executor hands back a zero-valued device when a lookup matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Loaded by a second query; never written with the device row
    pub sensors: Vec<Sensor>,
}

impl Device {
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    pub fn has_sensor(&self, sensor_id: i32) -> bool {
        self.sensors.iter().any(|sensor| sensor.id == sensor_id)
    }
}

/// Externally-facing device representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDto {
    pub id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sensors: Vec<SensorDto>,
}

impl From<Device> for DeviceDto {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            name: device.name,
            description: device.description,
            sensors: device.sensors.into_iter().map(SensorDto::from).collect(),
        }
    }
}

fn validate_fields(name: &str, description: Option<&str>) -> Result<(), DeviceValidationError> {
    if name.trim().is_empty() {
        return Err(DeviceValidationError::EmptyName);
    }
    let name_len = name.chars().count();
    if name_len > MAX_DEVICE_NAME_LEN {
        return Err(DeviceValidationError::NameTooLong(name_len));
    }
    if let Some(description) = description {
        let description_len = description.chars().count();
        if description_len > MAX_DEVICE_DESCRIPTION_LEN {
            return Err(DeviceValidationError::DescriptionTooLong(description_len));
        }
    }
    Ok(())
}

/// Request to create a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddDeviceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl AddDeviceRequest {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }

    /// Decode an untyped request body; unknown fields are rejected
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn validate(&self) -> Result<(), DeviceValidationError> {
        validate_fields(&self.name, self.description.as_deref())
    }

    /// Unsaved device carrying the requested fields
    pub fn into_device(self) -> Device {
        Device {
            id: 0,
            name: self.name,
            description: self.description,
            sensors: Vec::new(),
        }
    }
}

/// Request to replace a device's name and description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDeviceRequest {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdateDeviceRequest {
    pub fn new(id: i32, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description,
        }
    }

    /// Decode an untyped request body; unknown fields are rejected
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Field checks only; whether `id` names a device is the service's call
    pub fn validate(&self) -> Result<(), DeviceValidationError> {
        validate_fields(&self.name, self.description.as_deref())
    }

    pub fn into_device(self) -> Device {
        Device {
            id: self.id,
            name: self.name,
            description: self.description,
            sensors: Vec::new(),
        }
    }
}
