//! Test fixtures for API integration tests
//!
//! Provides services wired to an in-memory store and generated device data.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fake::faker::company::en::Buzzword;
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use sensorapi_api::repositories::SqlDeviceRepository;
use sensorapi_api::DeviceService;
use sensorapi_test_utils::MockDeviceStore;

static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Generated device name, unique within the test process
pub fn device_name() -> String {
    let word: String = Buzzword().fake();
    let n = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    let salt: u32 = (1000..10_000).fake();
    format!("{}-{}-{}", word.to_lowercase(), salt, n)
}

/// Generated short description
pub fn device_description() -> String {
    Sentence(3..6).fake()
}

/// Service and store sharing the same in-memory rows
pub struct TestContext {
    pub store: MockDeviceStore,
    pub service: DeviceService,
}

impl TestContext {
    pub fn new() -> Self {
        let store = MockDeviceStore::new();
        let service = DeviceService::new(Arc::new(store.clone()));
        Self { store, service }
    }

    /// Repository over the same store, for repository-level tests
    pub fn repository(&self) -> SqlDeviceRepository {
        SqlDeviceRepository::new(Arc::new(self.store.clone()))
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
