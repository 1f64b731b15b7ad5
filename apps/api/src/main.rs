use std::sync::Arc;

use anyhow::Context;
use sensorapi_api::config::Config;
use sensorapi_api::{telemetry, DeviceService, EntityService};
use sensorapi_store::PgQueryExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before the config reads them
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_level());

    tracing::info!(environment = %config.environment(), "Starting sensorapi");

    let executor = PgQueryExecutor::connect(config.database())
        .await
        .context("Failed to connect to database")?;
    let service = DeviceService::new(Arc::new(executor));

    let ctx = config.request_context();
    let devices = service.get_all(&ctx).await.map_err(|err| {
        err.log();
        err
    })?;

    for device in &devices {
        tracing::debug!(
            id = device.id,
            name = %device.name,
            sensors = device.sensors.len(),
            "Device"
        );
    }

    let sensors: usize = devices.iter().map(|device| device.sensors.len()).sum();
    tracing::info!(devices = devices.len(), sensors, "Device inventory loaded");

    Ok(())
}
