//! Sensor models
//!
//! Sensors are owned elsewhere; this crate only reads them through the
//! `device_sensor` association and never writes sensor rows.

use serde::{Deserialize, Serialize};

/// Sensor row as returned by the association join
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sensor {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
}

/// Externally-facing sensor representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDto {
    pub id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl From<Sensor> for SensorDto {
    fn from(sensor: Sensor) -> Self {
        Self {
            id: sensor.id,
            name: sensor.name,
            description: sensor.description,
            unit: sensor.unit,
        }
    }
}
