//! Device service
//!
//! Existence checks and duplicate detection run before each mutation, and
//! the mutation itself reports how many rows it touched, so a device that
//! appears or disappears between the check and the write is still caught.

use std::sync::Arc;

use async_trait::async_trait;
use sensorapi_store::{QueryExecutor, RequestContext};
use tracing::{info, instrument};

use super::EntityService;
use crate::error::{RepositoryError, ResourceKey, ServiceError, ServiceResult};
use crate::models::{AddDeviceRequest, Device, DeviceDto, UpdateDeviceRequest};
use crate::repositories::{DeviceRepository, Repository, SqlDeviceRepository};

const DEVICE: &str = "device";
const DEVICE_SENSOR: &str = "device sensor";

/// Service for device operations
#[derive(Clone)]
pub struct DeviceService {
    repository: Arc<dyn DeviceRepository>,
}

impl DeviceService {
    /// Create a service backed by the named-query repository
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self::with_repository(Arc::new(SqlDeviceRepository::new(executor)))
    }

    pub fn with_repository(repository: Arc<dyn DeviceRepository>) -> Self {
        Self { repository }
    }

    /// Load a device, treating the zero value as absent
    async fn load_existing(&self, ctx: &RequestContext, id: i32) -> ServiceResult<Device> {
        let device = self.repository.get_by_id(ctx, id).await?;
        if !device.is_persisted() {
            return Err(ServiceError::not_found(DEVICE, id));
        }
        Ok(device)
    }

    /// Name of the device with `id`
    #[instrument(skip(self, ctx))]
    pub async fn device_name_by_id(&self, ctx: &RequestContext, id: i32) -> ServiceResult<String> {
        match self.repository.get_device_name_by_id(ctx, id).await {
            Err(RepositoryError::ObjectNotFound) => Err(ServiceError::not_found(DEVICE, id)),
            result => Ok(result?),
        }
    }

    /// Id of the device called `name`
    #[instrument(skip(self, ctx))]
    pub async fn device_id_by_name(&self, ctx: &RequestContext, name: &str) -> ServiceResult<i32> {
        match self.repository.get_device_id_by_name(ctx, name).await {
            Err(RepositoryError::ObjectNotFound) => Err(ServiceError::not_found(DEVICE, name)),
            result => Ok(result?),
        }
    }

    /// Associate a sensor with an existing device, at most once
    #[instrument(skip(self, ctx))]
    pub async fn attach_sensor(
        &self,
        ctx: &RequestContext,
        device_id: i32,
        sensor_id: i32,
    ) -> ServiceResult<()> {
        let device = self.load_existing(ctx, device_id).await?;
        let link = ResourceKey::Link {
            device_id,
            sensor_id,
        };
        if device.has_sensor(sensor_id) {
            return Err(ServiceError::conflict(DEVICE_SENSOR, link));
        }

        let linked = self
            .repository
            .add_device_sensors(ctx, device_id, sensor_id)
            .await;
        match linked {
            Ok(_) => {
                info!(device_id, sensor_id, "Sensor attached to device");
                Ok(())
            }
            Err(err) if err.is_unique_violation() => {
                Err(ServiceError::conflict(DEVICE_SENSOR, link))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl EntityService for DeviceService {
    type Output = DeviceDto;
    type Id = i32;
    type CreateRequest = AddDeviceRequest;
    type UpdateRequest = UpdateDeviceRequest;

    #[instrument(skip(self, ctx))]
    async fn get_all(&self, ctx: &RequestContext) -> ServiceResult<Vec<DeviceDto>> {
        let devices = self.repository.get_all(ctx).await?;
        Ok(devices.into_iter().map(DeviceDto::from).collect())
    }

    #[instrument(skip(self, ctx))]
    async fn get_by_id(&self, ctx: &RequestContext, id: i32) -> ServiceResult<DeviceDto> {
        let device = self.load_existing(ctx, id).await?;
        Ok(device.into())
    }

    #[instrument(skip(self, ctx, request), fields(name = %request.name))]
    async fn add(&self, ctx: &RequestContext, request: AddDeviceRequest) -> ServiceResult<()> {
        request.validate()?;

        let lookup = self.repository.get_device_id_by_name(ctx, &request.name).await;
        match lookup {
            Ok(_) => return Err(ServiceError::conflict(DEVICE, request.name)),
            Err(RepositoryError::ObjectNotFound) => {}
            Err(source) => {
                return Err(ServiceError::NameResolution {
                    name: request.name,
                    source,
                })
            }
        }

        let device = request.into_device();
        let inserted = self.repository.add(ctx, &device).await;
        match inserted {
            // The guarded insert skips a name taken since the lookup
            Ok(0) => Err(ServiceError::conflict(DEVICE, device.name)),
            Ok(_) => {
                info!(name = %device.name, "Device added");
                Ok(())
            }
            Err(err) if err.is_unique_violation() => {
                Err(ServiceError::conflict(DEVICE, device.name))
            }
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self, ctx, request), fields(id = request.id))]
    async fn update(&self, ctx: &RequestContext, request: UpdateDeviceRequest) -> ServiceResult<()> {
        request.validate()?;
        self.load_existing(ctx, request.id).await?;

        let device = request.into_device();
        let updated = self.repository.update(ctx, &device).await;
        match updated {
            Ok(0) => Err(ServiceError::not_found(DEVICE, device.id)),
            Ok(_) => {
                info!(id = device.id, "Device updated");
                Ok(())
            }
            Err(err) if err.is_unique_violation() => {
                Err(ServiceError::conflict(DEVICE, device.name))
            }
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self, ctx))]
    async fn delete(&self, ctx: &RequestContext, id: i32) -> ServiceResult<DeviceDto> {
        let device = self.load_existing(ctx, id).await?;
        // TODO: reject the delete while device.sensors is non-empty instead of
        // relying on the device_sensor foreign key

        let affected = self.repository.delete(ctx, id).await?;
        if affected == 0 {
            return Err(ServiceError::not_found(DEVICE, id));
        }

        info!(id, "Device deleted");
        Ok(device.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Repository whose name lookup always fails in the store
    struct UnreachableStore;

    #[async_trait]
    impl crate::repositories::Repository for UnreachableStore {
        type Entity = Device;
        type Id = i32;

        async fn get_all(&self, _: &RequestContext) -> crate::error::RepositoryResult<Vec<Device>> {
            Ok(Vec::new())
        }

        async fn get_by_id(&self, _: &RequestContext, _: i32) -> crate::error::RepositoryResult<Device> {
            Ok(Device::default())
        }

        async fn add(&self, _: &RequestContext, _: &Device) -> crate::error::RepositoryResult<u64> {
            panic!("insert must not run when name resolution fails")
        }

        async fn update(&self, _: &RequestContext, _: &Device) -> crate::error::RepositoryResult<u64> {
            Ok(0)
        }

        async fn delete(&self, _: &RequestContext, _: i32) -> crate::error::RepositoryResult<u64> {
            Ok(0)
        }
    }

    #[async_trait]
    impl DeviceRepository for UnreachableStore {
        async fn get_device_name_by_id(
            &self,
            _: &RequestContext,
            _: i32,
        ) -> crate::error::RepositoryResult<String> {
            Err(RepositoryError::ObjectNotFound)
        }

        async fn get_device_id_by_name(
            &self,
            _: &RequestContext,
            name: &str,
        ) -> crate::error::RepositoryResult<i32> {
            Err(RepositoryError::Lookup {
                name: name.to_string(),
                source: sensorapi_store::QueryError::new(
                    sensorapi_store::NamedQuery::GetDeviceIdByName,
                    sensorapi_store::QueryErrorKind::Backend("connection reset".to_string()),
                ),
            })
        }

        async fn add_device_sensors(
            &self,
            _: &RequestContext,
            _: i32,
            _: i32,
        ) -> crate::error::RepositoryResult<u64> {
            Ok(0)
        }
    }

    fn service() -> DeviceService {
        DeviceService::with_repository(Arc::new(UnreachableStore))
    }

    #[tokio::test]
    async fn test_add_surfaces_name_resolution_failure() {
        let ctx = RequestContext::background();
        let err = service()
            .add(&ctx, AddDeviceRequest::new("gateway", None))
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::NameResolution { ref name, .. } if name == "gateway");
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_zero_valued_device_is_not_found() {
        let ctx = RequestContext::background();
        let err = service().get_by_id(&ctx, 5).await.unwrap_err();
        assert_eq!(err.to_string(), "device with id: 5 does not exist");
    }

    #[tokio::test]
    async fn test_name_lookup_not_found_message() {
        let ctx = RequestContext::background();
        let err = service().device_name_by_id(&ctx, 8).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_validation_runs_before_store() {
        let ctx = RequestContext::background();
        let err = service()
            .add(&ctx, AddDeviceRequest::new("  ", None))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::Validation(_));
    }
}
