//! Named query contract
//!
//! Every statement the device layer runs is declared here once, together
//! with its positional parameter count. Repositories refer to statements by
//! [`NamedQuery`] only, so parameter order lives in a single place.

use std::fmt;

const GET_ALL_DEVICES: &str = "SELECT id, name, description FROM device";

const GET_ALL_SENSORS_BY_DEVICE_ID: &str = r#"
    SELECT s.id, s.name, s.description, s.unit
    FROM sensor s
    INNER JOIN device_sensor ds ON ds.sensor_id = s.id
    WHERE ds.device_id = $1
"#;

// Guarded insert: a name that is already taken inserts zero rows instead of
// a duplicate, so conflicts are visible on the mutation itself.
const INSERT_DEVICE: &str = r#"
    INSERT INTO device (name, description)
    SELECT $1, $2
    WHERE NOT EXISTS (SELECT 1 FROM device WHERE name = $1)
"#;

const INSERT_DEVICE_SENSORS: &str =
    "INSERT INTO device_sensor (device_id, sensor_id) VALUES ($1, $2)";

const UPDATE_DEVICE: &str = "UPDATE device SET name = $1, description = $2 WHERE id = $3";

const GET_DEVICE_BY_ID: &str = "SELECT id, name, description FROM device WHERE id = $1";

const DELETE_DEVICE: &str = "DELETE FROM device WHERE id = $1";

const GET_DEVICE_ID_BY_NAME: &str = "SELECT id FROM device WHERE name = $1";

const GET_DEVICE_NAME_BY_ID: &str = "SELECT name FROM device WHERE id = $1";

/// Whether a statement reads rows or mutates them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    Modify,
}

/// Identified, parameterized unit of persistence work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedQuery {
    /// `()`
    GetAllDevices,
    /// `(device_id)`
    GetAllSensorsByDeviceId,
    /// `(name, description)`
    InsertDevice,
    /// `(device_id, sensor_id)`
    InsertDeviceSensors,
    /// `(name, description, id)`
    UpdateDevice,
    /// `(id)`
    GetDeviceById,
    /// `(id)`
    DeleteDevice,
    /// `(name)`
    GetDeviceIdByName,
    /// `(id)`
    GetDeviceNameById,
}

impl NamedQuery {
    /// Every declared operation
    pub const ALL: [NamedQuery; 9] = [
        Self::GetAllDevices,
        Self::GetAllSensorsByDeviceId,
        Self::InsertDevice,
        Self::InsertDeviceSensors,
        Self::UpdateDevice,
        Self::GetDeviceById,
        Self::DeleteDevice,
        Self::GetDeviceIdByName,
        Self::GetDeviceNameById,
    ];

    /// Stable operation identity, used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetAllDevices => "GetAllDevices",
            Self::GetAllSensorsByDeviceId => "GetAllSensorsByDeviceID",
            Self::InsertDevice => "InsertDevice",
            Self::InsertDeviceSensors => "InsertDeviceSensors",
            Self::UpdateDevice => "UpdateDevice",
            Self::GetDeviceById => "GetDeviceByID",
            Self::DeleteDevice => "DeleteDevice",
            Self::GetDeviceIdByName => "GetDeviceIDByName",
            Self::GetDeviceNameById => "GetDeviceNameByID",
        }
    }

    /// PostgreSQL text of the statement
    pub fn sql(&self) -> &'static str {
        match self {
            Self::GetAllDevices => GET_ALL_DEVICES,
            Self::GetAllSensorsByDeviceId => GET_ALL_SENSORS_BY_DEVICE_ID,
            Self::InsertDevice => INSERT_DEVICE,
            Self::InsertDeviceSensors => INSERT_DEVICE_SENSORS,
            Self::UpdateDevice => UPDATE_DEVICE,
            Self::GetDeviceById => GET_DEVICE_BY_ID,
            Self::DeleteDevice => DELETE_DEVICE,
            Self::GetDeviceIdByName => GET_DEVICE_ID_BY_NAME,
            Self::GetDeviceNameById => GET_DEVICE_NAME_BY_ID,
        }
    }

    /// Number of positional parameters the statement binds
    pub fn arity(&self) -> usize {
        match self {
            Self::GetAllDevices => 0,
            Self::GetAllSensorsByDeviceId
            | Self::GetDeviceById
            | Self::DeleteDevice
            | Self::GetDeviceIdByName
            | Self::GetDeviceNameById => 1,
            Self::InsertDevice | Self::InsertDeviceSensors => 2,
            Self::UpdateDevice => 3,
        }
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Self::InsertDevice
            | Self::InsertDeviceSensors
            | Self::UpdateDevice
            | Self::DeleteDevice => QueryKind::Modify,
            _ => QueryKind::Select,
        }
    }
}

impl fmt::Display for NamedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Positional parameter bound to a named query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Int(i32),
    Text(String),
    NullableText(Option<String>),
}

impl QueryParam {
    /// Integer value, if this is an integer parameter
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Text value; `None` for integers and SQL NULL
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::NullableText(value) => value.as_deref(),
            Self::Int(_) => None,
        }
    }
}

impl From<i32> for QueryParam {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<String>> for QueryParam {
    fn from(value: Option<String>) -> Self {
        Self::NullableText(value)
    }
}
