//! Data models for sensorapi
//!
//! Stored shapes (`Device`, `Sensor`) are what the store returns. Transfer
//! shapes (`DeviceDto`, `SensorDto`) are what callers see, and are only
//! ever produced through `From` conversions.

pub mod device;
pub mod sensor;

pub use device::{
    AddDeviceRequest, Device, DeviceDto, DeviceValidationError, UpdateDeviceRequest,
};
pub use sensor::{Sensor, SensorDto};
