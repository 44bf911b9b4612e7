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

/// Install a global tracing subscriber using the provided logging settings.
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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "folio_media_uploads_total",
            Unit::Count,
            "Media assets stored, labelled by processing kind."
        );
        describe_counter!(
            "folio_media_cleanup_failures_total",
            Unit::Count,
            "Storage objects that best-effort cleanup failed to delete."
        );
        describe_counter!(
            "folio_views_recorded_total",
            Unit::Count,
            "First views recorded within the dedup window."
        );
        describe_counter!(
            "folio_view_counter_increment_failures_total",
            Unit::Count,
            "Durable view counter increments that failed after the dedup key was set."
        );
        describe_counter!(
            "folio_view_store_errors_total",
            Unit::Count,
            "View store operations that failed."
        );
    });
}
