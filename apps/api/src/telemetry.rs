//! Tracing setup for the sensorapi binary

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor `LOG_LEVEL` is set
pub const DEFAULT_FILTER: &str = "sensorapi_api=debug,sensorapi_store=debug";

/// Build the log filter from configured directives, falling back to
/// [`DEFAULT_FILTER`] when none are set or they do not parse
pub fn env_filter(log_level: Option<&str>) -> EnvFilter {
    log_level
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| DEFAULT_FILTER.into())
}

/// Install the global subscriber; call once at startup
pub fn init_tracing(log_level: Option<&str>) {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
