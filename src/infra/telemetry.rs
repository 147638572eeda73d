use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install the global tracing subscriber for the given logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for the cache counters. Safe to call repeatedly.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "blogo_cache_hit_total",
            Unit::Count,
            "Entity lookups answered by the cache, labelled by kind."
        );
        describe_counter!(
            "blogo_cache_miss_total",
            Unit::Count,
            "Entity lookups that fell through to the store, labelled by kind."
        );
        describe_counter!(
            "blogo_cache_error_total",
            Unit::Count,
            "Cache operations that failed and were ignored, labelled by kind."
        );
        describe_counter!(
            "blogo_cache_invalidate_total",
            Unit::Count,
            "Successful cache invalidations, labelled by kind."
        );
        describe_counter!(
            "blogo_cache_evict_total",
            Unit::Count,
            "Entries evicted from the in-process cache due to capacity."
        );
    });
}
