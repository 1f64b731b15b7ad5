//! In-memory device store for repository and service tests
//!
//! Provides a [`MockDeviceStore`] that answers every device named query the
//! way the PostgreSQL schema would, so the real repository and service code
//! can run without a database.
//!
//! # Lock Poisoning Recovery
//!
//! Locks are acquired with `unwrap_or_else(|e| e.into_inner())`, so a test
//! that panics while holding one does not poison the store for the next.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sensorapi_store::{NamedQuery, QueryErrorKind, QueryExecutor, QueryParam, Record};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct DeviceRow {
    id: i32,
    name: String,
    description: Option<String>,
}

#[derive(Debug, Clone)]
struct SensorRow {
    id: i32,
    name: String,
    description: Option<String>,
    unit: Option<String>,
}

/// Injected behaviour for a single named query
#[derive(Debug, Clone)]
enum Fault {
    Backend(String),
    Constraint(String),
    Stall,
    SkipWrite,
}

#[derive(Debug, Default)]
struct StoreState {
    devices: Vec<DeviceRow>,
    sensors: BTreeMap<i32, SensorRow>,
    links: Vec<(i32, i32)>,
    next_device_id: i32,
    faults: HashMap<NamedQuery, Fault>,
    calls: HashMap<NamedQuery, usize>,
}

/// Mock store implementing the device query contract in memory
///
/// # Thread Safety
///
/// `MockDeviceStore` uses `Arc<RwLock<...>>` internally, so it can be cloned
/// and shared across tasks. All clones see the same rows.
///
/// # Example
///
/// ```rust
/// use sensorapi_test_utils::MockDeviceStore;
///
/// let store = MockDeviceStore::new();
/// store.add_sensor(1, "temperature", Some("C"));
/// let id = store.seed_device("gateway-01", None);
///
/// assert_eq!(store.device_count(), 1);
/// assert!(id > 0);
/// ```
#[derive(Clone, Default)]
pub struct MockDeviceStore {
    state: Arc<RwLock<StoreState>>,
}

impl MockDeviceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a device directly, bypassing the query contract
    pub fn seed_device(&self, name: &str, description: Option<&str>) -> i32 {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.insert_device(name.to_string(), description.map(str::to_string))
    }

    /// Register a sensor that devices can be linked to
    pub fn add_sensor(&self, id: i32, name: &str, unit: Option<&str>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.sensors.insert(
            id,
            SensorRow {
                id,
                name: name.to_string(),
                description: None,
                unit: unit.map(str::to_string),
            },
        );
    }

    /// Every call to `query` fails with a generic store error
    pub fn fail_on(&self, query: NamedQuery, message: &str) {
        self.set_fault(query, Fault::Backend(message.to_string()));
    }

    /// Every call to `query` fails with a constraint violation
    pub fn violate_constraint_on(&self, query: NamedQuery, constraint: &str) {
        self.set_fault(query, Fault::Constraint(constraint.to_string()));
    }

    /// Every call to `query` waits forever (for cancellation tests)
    pub fn stall_on(&self, query: NamedQuery) {
        self.set_fault(query, Fault::Stall);
    }

    /// Writes through `query` succeed but affect no rows, as if the target
    /// row disappeared between a check and the write
    pub fn skip_writes_on(&self, query: NamedQuery) {
        self.set_fault(query, Fault::SkipWrite);
    }

    /// Remove every injected fault
    pub fn clear_faults(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.faults.clear();
    }

    /// Number of devices currently stored
    pub fn device_count(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.devices.len()
    }

    /// Number of device-sensor association rows
    pub fn link_count(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.links.len()
    }

    /// How many times `query` reached the store
    pub fn call_count(&self, query: NamedQuery) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.calls.get(&query).copied().unwrap_or(0)
    }

    /// Total number of statements that reached the store
    pub fn total_calls(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.calls.values().sum()
    }

    fn set_fault(&self, query: NamedQuery, fault: Fault) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.faults.insert(query, fault);
    }

    /// Count the call and return the fault registered for it, if any
    fn enter(&self, query: NamedQuery) -> Option<Fault> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state.calls.entry(query).or_insert(0) += 1;
        state.faults.get(&query).cloned()
    }
}

impl StoreState {
    fn insert_device(&mut self, name: String, description: Option<String>) -> i32 {
        self.next_device_id += 1;
        let id = self.next_device_id;
        self.devices.push(DeviceRow {
            id,
            name,
            description,
        });
        id
    }

    fn device(&self, id: i32) -> Option<&DeviceRow> {
        self.devices.iter().find(|d| d.id == id)
    }
}

fn int_param(query: NamedQuery, params: &[QueryParam], index: usize) -> Result<i32, QueryErrorKind> {
    params
        .get(index)
        .and_then(QueryParam::as_int)
        .ok_or_else(|| bad_param(query, index, "integer"))
}

fn text_param(
    query: NamedQuery,
    params: &[QueryParam],
    index: usize,
) -> Result<String, QueryErrorKind> {
    params
        .get(index)
        .and_then(QueryParam::as_text)
        .map(str::to_string)
        .ok_or_else(|| bad_param(query, index, "text"))
}

fn nullable_text_param(
    query: NamedQuery,
    params: &[QueryParam],
    index: usize,
) -> Result<Option<String>, QueryErrorKind> {
    match params.get(index) {
        Some(QueryParam::Int(_)) | None => Err(bad_param(query, index, "text or NULL")),
        Some(param) => Ok(param.as_text().map(str::to_string)),
    }
}

fn bad_param(query: NamedQuery, index: usize, expected: &str) -> QueryErrorKind {
    QueryErrorKind::Backend(format!(
        "{}: parameter ${} must be {}",
        query,
        index + 1,
        expected
    ))
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn device_record(row: &DeviceRow) -> Record {
    record(json!({
        "id": row.id,
        "name": row.name,
        "description": row.description,
    }))
}

fn sensor_record(row: &SensorRow) -> Record {
    record(json!({
        "id": row.id,
        "name": row.name,
        "description": row.description,
        "unit": row.unit,
    }))
}

#[async_trait]
impl QueryExecutor for MockDeviceStore {
    async fn fetch(
        &self,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> Result<Vec<Record>, QueryErrorKind> {
        match self.enter(query) {
            Some(Fault::Stall) => std::future::pending().await,
            Some(Fault::Backend(message)) => return Err(QueryErrorKind::Backend(message)),
            Some(Fault::Constraint(name)) => return Err(QueryErrorKind::Constraint(name)),
            Some(Fault::SkipWrite) | None => {}
        }

        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let rows = match query {
            NamedQuery::GetAllDevices => state.devices.iter().map(device_record).collect(),
            NamedQuery::GetAllSensorsByDeviceId => {
                let device_id = int_param(query, params, 0)?;
                state
                    .links
                    .iter()
                    .filter(|(d, _)| *d == device_id)
                    .filter_map(|(_, s)| state.sensors.get(s))
                    .map(sensor_record)
                    .collect()
            }
            NamedQuery::GetDeviceById => {
                let id = int_param(query, params, 0)?;
                state.device(id).map(device_record).into_iter().collect()
            }
            NamedQuery::GetDeviceIdByName => {
                let name = text_param(query, params, 0)?;
                state
                    .devices
                    .iter()
                    .find(|d| d.name == name)
                    .map(|d| record(json!({ "id": d.id })))
                    .into_iter()
                    .collect()
            }
            NamedQuery::GetDeviceNameById => {
                let id = int_param(query, params, 0)?;
                state
                    .device(id)
                    .map(|d| record(json!({ "name": d.name })))
                    .into_iter()
                    .collect()
            }
            other => {
                return Err(QueryErrorKind::Backend(format!(
                    "{} is not a select statement",
                    other
                )))
            }
        };
        Ok(rows)
    }

    async fn execute(
        &self,
        query: NamedQuery,
        params: &[QueryParam],
    ) -> Result<u64, QueryErrorKind> {
        match self.enter(query) {
            Some(Fault::Stall) => std::future::pending().await,
            Some(Fault::Backend(message)) => return Err(QueryErrorKind::Backend(message)),
            Some(Fault::Constraint(name)) => return Err(QueryErrorKind::Constraint(name)),
            Some(Fault::SkipWrite) => return Ok(0),
            None => {}
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        match query {
            NamedQuery::InsertDevice => {
                let name = text_param(query, params, 0)?;
                let description = nullable_text_param(query, params, 1)?;
                if state.devices.iter().any(|d| d.name == name) {
                    return Ok(0);
                }
                state.insert_device(name, description);
                Ok(1)
            }
            NamedQuery::InsertDeviceSensors => {
                let link = (int_param(query, params, 0)?, int_param(query, params, 1)?);
                if state.links.contains(&link) {
                    return Err(QueryErrorKind::Constraint(
                        "device_sensor_pkey".to_string(),
                    ));
                }
                state.links.push(link);
                Ok(1)
            }
            NamedQuery::UpdateDevice => {
                let name = text_param(query, params, 0)?;
                let description = nullable_text_param(query, params, 1)?;
                let id = int_param(query, params, 2)?;
                match state.devices.iter_mut().find(|d| d.id == id) {
                    Some(row) => {
                        row.name = name;
                        row.description = description;
                        Ok(1)
                    }
                    None => Ok(0),
                }
            }
            NamedQuery::DeleteDevice => {
                let id = int_param(query, params, 0)?;
                let before = state.devices.len();
                state.devices.retain(|d| d.id != id);
                // device_sensor rows go with the device (ON DELETE CASCADE)
                state.links.retain(|&(device_id, _)| device_id != id);
                Ok((before - state.devices.len()) as u64)
            }
            other => Err(QueryErrorKind::Backend(format!(
                "{} is not a modifying statement",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MockDeviceStore::new();
        let params = ["a".into(), QueryParam::NullableText(None)];
        assert_eq!(store.execute(NamedQuery::InsertDevice, &params).await.unwrap(), 1);
        let params = ["b".into(), QueryParam::NullableText(Some("x".into()))];
        assert_eq!(store.execute(NamedQuery::InsertDevice, &params).await.unwrap(), 1);

        let rows = store.fetch(NamedQuery::GetAllDevices, &[]).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_guarded_insert_skips_taken_name() {
        let store = MockDeviceStore::new();
        store.seed_device("gateway", None);
        let params = ["gateway".into(), QueryParam::NullableText(None)];
        assert_eq!(store.execute(NamedQuery::InsertDevice, &params).await.unwrap(), 0);
        assert_eq!(store.device_count(), 1);
    }

    #[tokio::test]
    async fn test_sensor_join_skips_unknown_sensors() {
        let store = MockDeviceStore::new();
        let id = store.seed_device("gateway", None);
        store.add_sensor(10, "humidity", Some("%"));
        store
            .execute(NamedQuery::InsertDeviceSensors, &[id.into(), QueryParam::Int(10)])
            .await
            .unwrap();
        store
            .execute(NamedQuery::InsertDeviceSensors, &[id.into(), QueryParam::Int(11)])
            .await
            .unwrap();

        let rows = store
            .fetch(NamedQuery::GetAllSensorsByDeviceId, &[id.into()])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["unit"], "%");
        assert_eq!(store.link_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_links() {
        let store = MockDeviceStore::new();
        let doomed = store.seed_device("doomed", None);
        let kept = store.seed_device("kept", None);
        for params in [
            [QueryParam::Int(doomed), QueryParam::Int(1)],
            [QueryParam::Int(doomed), QueryParam::Int(2)],
            [QueryParam::Int(kept), QueryParam::Int(1)],
        ] {
            store.execute(NamedQuery::InsertDeviceSensors, &params).await.unwrap();
        }

        let affected = store
            .execute(NamedQuery::DeleteDevice, &[QueryParam::Int(doomed)])
            .await
            .unwrap();

        assert_eq!(affected, 1);
        assert_eq!(store.link_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_link_violates_primary_key() {
        let store = MockDeviceStore::new();
        let params = [QueryParam::Int(1), QueryParam::Int(2)];
        store.execute(NamedQuery::InsertDeviceSensors, &params).await.unwrap();
        let err = store
            .execute(NamedQuery::InsertDeviceSensors, &params)
            .await
            .unwrap_err();
        assert_matches!(err, QueryErrorKind::Constraint(_));
    }

    #[tokio::test]
    async fn test_faults_and_call_counts() {
        let store = MockDeviceStore::new();
        store.fail_on(NamedQuery::GetAllDevices, "connection refused");
        let err = store.fetch(NamedQuery::GetAllDevices, &[]).await.unwrap_err();
        assert_matches!(err, QueryErrorKind::Backend(msg) if msg == "connection refused");

        store.clear_faults();
        assert!(store.fetch(NamedQuery::GetAllDevices, &[]).await.is_ok());
        assert_eq!(store.call_count(NamedQuery::GetAllDevices), 2);
        assert_eq!(store.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_wrong_parameter_type_is_reported() {
        let store = MockDeviceStore::new();
        let err = store
            .fetch(NamedQuery::GetDeviceById, &["seven".into()])
            .await
            .unwrap_err();
        assert_matches!(err, QueryErrorKind::Backend(msg) if msg.contains("$1"));
    }

    #[tokio::test]
    async fn test_skip_writes_leaves_rows_untouched() {
        let store = MockDeviceStore::new();
        let id = store.seed_device("gateway", None);
        store.skip_writes_on(NamedQuery::DeleteDevice);
        let affected = store
            .execute(NamedQuery::DeleteDevice, &[id.into()])
            .await
            .unwrap();
        assert_eq!(affected, 0);
        assert_eq!(store.device_count(), 1);
    }
}
