//! Shared test utilities for the sensorapi workspace
//!
//! This crate provides in-memory stand-ins for external services so the
//! repository and service layers can be tested without a database.
//!
//! # Mock Services
//!
//! - [`MockDeviceStore`] - In-memory implementation of the device named
//!   queries, with fault injection and per-query call counting
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sensorapi_test_utils::MockDeviceStore;
//!
//! #[tokio::test]
//! async fn test_with_mock_store() {
//!     let store = MockDeviceStore::new();
//!     store.seed_device("gateway-01", Some("roof"));
//!
//!     // Hand Arc::new(store.clone()) to the repository under test
//! }
//! ```

mod device_store;

pub use device_store::MockDeviceStore;
