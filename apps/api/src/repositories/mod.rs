//! Data access layer for sensorapi
//!
//! Repositories translate entity operations into named queries. They hold
//! no state between calls and never decide what an empty result means,
//! with one exception: the keyed lookups by name and by id report
//! [`RepositoryError::ObjectNotFound`](crate::error::RepositoryError).

pub mod device;

pub use device::{DeviceRepository, SqlDeviceRepository};

use async_trait::async_trait;
use sensorapi_store::RequestContext;

use crate::error::RepositoryResult;

/// CRUD capability set shared by every entity repository
#[async_trait]
pub trait Repository: Send + Sync {
    type Entity: Send + Sync;
    type Id: Send + Sync + Copy;

    /// Every stored entity, in store order
    async fn get_all(&self, ctx: &RequestContext) -> RepositoryResult<Vec<Self::Entity>>;

    /// Entity with `id`, or its zero value when no row matches
    async fn get_by_id(&self, ctx: &RequestContext, id: Self::Id)
        -> RepositoryResult<Self::Entity>;

    /// Insert; returns rows inserted
    async fn add(&self, ctx: &RequestContext, entity: &Self::Entity) -> RepositoryResult<u64>;

    /// Update by id; returns rows affected
    async fn update(&self, ctx: &RequestContext, entity: &Self::Entity)
        -> RepositoryResult<u64>;

    /// Delete by id; returns rows affected
    async fn delete(&self, ctx: &RequestContext, id: Self::Id) -> RepositoryResult<u64>;
}
