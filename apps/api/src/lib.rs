//! sensorapi library
//!
//! This module exposes the device data-access and service layers for use
//! by the binary and by integration tests.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use error::{RepositoryError, ResourceKey, ServiceError, ServiceResult};
pub use services::{DeviceService, EntityService};
