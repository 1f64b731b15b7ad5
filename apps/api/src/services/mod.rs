//! Business logic services for sensorapi
//!
//! Services sit between callers and repositories. They validate requests,
//! classify "not found" and duplicates, and convert stored entities into
//! transfer shapes.

pub mod device;

pub use device::DeviceService;

use async_trait::async_trait;
use sensorapi_store::RequestContext;

use crate::error::ServiceResult;

/// Capability set every entity service exposes
#[async_trait]
pub trait EntityService: Send + Sync {
    type Output: Send;
    type Id: Send + Copy;
    type CreateRequest: Send;
    type UpdateRequest: Send;

    async fn get_all(&self, ctx: &RequestContext) -> ServiceResult<Vec<Self::Output>>;

    async fn get_by_id(&self, ctx: &RequestContext, id: Self::Id) -> ServiceResult<Self::Output>;

    async fn add(&self, ctx: &RequestContext, request: Self::CreateRequest) -> ServiceResult<()>;

    async fn update(&self, ctx: &RequestContext, request: Self::UpdateRequest)
        -> ServiceResult<()>;

    /// Remove the entity and return it as it was before deletion
    async fn delete(&self, ctx: &RequestContext, id: Self::Id) -> ServiceResult<Self::Output>;
}
