//! Device repository
//!
//! Every read that returns devices runs a second query per device to load
//! its sensors through the `device_sensor` association.

use std::sync::Arc;

use async_trait::async_trait;
use sensorapi_store::{NamedQuery, QueryExecutor, QueryExecutorExt, QueryParam, RequestContext};
use tracing::{debug, instrument};

use super::Repository;
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{Device, Sensor};

/// Device-specific operations on top of CRUD
#[async_trait]
pub trait DeviceRepository: Repository<Entity = Device, Id = i32> {
    /// Name of the device with `id`; `ObjectNotFound` when none
    async fn get_device_name_by_id(&self, ctx: &RequestContext, id: i32)
        -> RepositoryResult<String>;

    /// Id of the device called `name`; `ObjectNotFound` when none
    async fn get_device_id_by_name(&self, ctx: &RequestContext, name: &str)
        -> RepositoryResult<i32>;

    /// Link a sensor to a device; no existence checks on either side
    async fn add_device_sensors(
        &self,
        ctx: &RequestContext,
        device_id: i32,
        sensor_id: i32,
    ) -> RepositoryResult<u64>;
}

/// Device repository backed by named queries
#[derive(Clone)]
pub struct SqlDeviceRepository {
    executor: Arc<dyn QueryExecutor>,
}

impl SqlDeviceRepository {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    async fn sensors_for(&self, ctx: &RequestContext, device_id: i32) -> RepositoryResult<Vec<Sensor>> {
        let sensors = self
            .executor
            .select_all(ctx, NamedQuery::GetAllSensorsByDeviceId, &[device_id.into()])
            .await?;
        Ok(sensors)
    }
}

fn write_params(device: &Device) -> [QueryParam; 2] {
    [
        QueryParam::from(device.name.as_str()),
        QueryParam::from(device.description.clone()),
    ]
}

#[async_trait]
impl Repository for SqlDeviceRepository {
    type Entity = Device;
    type Id = i32;

    #[instrument(skip(self, ctx))]
    async fn get_all(&self, ctx: &RequestContext) -> RepositoryResult<Vec<Device>> {
        let mut devices: Vec<Device> = self
            .executor
            .select_all(ctx, NamedQuery::GetAllDevices, &[])
            .await?;

        for device in &mut devices {
            device.sensors = self.sensors_for(ctx, device.id).await?;
        }

        debug!(count = devices.len(), "Loaded devices");
        Ok(devices)
    }

    #[instrument(skip(self, ctx))]
    async fn get_by_id(&self, ctx: &RequestContext, id: i32) -> RepositoryResult<Device> {
        let mut device: Device = self
            .executor
            .select_one(ctx, NamedQuery::GetDeviceById, &[id.into()])
            .await?;

        // Runs even when nothing matched, against the zero id
        device.sensors = self.sensors_for(ctx, device.id).await?;
        Ok(device)
    }

    #[instrument(skip(self, ctx, device), fields(name = %device.name))]
    async fn add(&self, ctx: &RequestContext, device: &Device) -> RepositoryResult<u64> {
        let inserted = self
            .executor
            .modify(ctx, NamedQuery::InsertDevice, &write_params(device))
            .await?;
        Ok(inserted)
    }

    #[instrument(skip(self, ctx, device), fields(id = device.id, name = %device.name))]
    async fn update(&self, ctx: &RequestContext, device: &Device) -> RepositoryResult<u64> {
        let [name, description] = write_params(device);
        let affected = self
            .executor
            .modify(ctx, NamedQuery::UpdateDevice, &[name, description, device.id.into()])
            .await?;
        Ok(affected)
    }

    #[instrument(skip(self, ctx))]
    async fn delete(&self, ctx: &RequestContext, id: i32) -> RepositoryResult<u64> {
        let affected = self
            .executor
            .modify(ctx, NamedQuery::DeleteDevice, &[id.into()])
            .await?;
        Ok(affected)
    }
}

#[async_trait]
impl DeviceRepository for SqlDeviceRepository {
    #[instrument(skip(self, ctx))]
    async fn get_device_name_by_id(&self, ctx: &RequestContext, id: i32) -> RepositoryResult<String> {
        let name: String = self
            .executor
            .select_scalar(ctx, NamedQuery::GetDeviceNameById, &[id.into()])
            .await?;

        if name.is_empty() {
            return Err(RepositoryError::ObjectNotFound);
        }
        Ok(name)
    }

    #[instrument(skip(self, ctx))]
    async fn get_device_id_by_name(&self, ctx: &RequestContext, name: &str) -> RepositoryResult<i32> {
        let id: i32 = self
            .executor
            .select_scalar(ctx, NamedQuery::GetDeviceIdByName, &[name.into()])
            .await
            .map_err(|source| RepositoryError::Lookup {
                name: name.to_string(),
                source,
            })?;

        if id == 0 {
            return Err(RepositoryError::ObjectNotFound);
        }
        Ok(id)
    }

    #[instrument(skip(self, ctx))]
    async fn add_device_sensors(
        &self,
        ctx: &RequestContext,
        device_id: i32,
        sensor_id: i32,
    ) -> RepositoryResult<u64> {
        let inserted = self
            .executor
            .modify(
                ctx,
                NamedQuery::InsertDeviceSensors,
                &[device_id.into(), sensor_id.into()],
            )
            .await?;
        Ok(inserted)
    }
}
