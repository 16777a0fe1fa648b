//! Process-wide tracing setup.
//!
//! Events are always written to stdout through `tracing_subscriber::fmt` in
//! the configured [`LogFormat`]. When an OTLP endpoint is configured, spans
//! are additionally exported over OTLP/HTTP, so the per-request spans of the
//! gateway and the storage spans of `TracedStore` end up in one trace.

mod error;

pub use error::TelemetryError;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};
use typed_builder::TypedBuilder;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_SERVICE_NAME: &str = "warren";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    Pretty,
    #[default]
    Compact,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Compact => write!(f, "compact"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(TelemetryError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct TelemetrySettings {
    /// An `EnvFilter` directive, e.g. `info` or `warren_slugs=trace,info`.
    #[builder(default = DEFAULT_LOG_LEVEL.to_string(), setter(into))]
    pub log_level: String,
    #[builder(default)]
    pub log_format: LogFormat,
    /// OTLP/HTTP traces endpoint. Span export is disabled when unset.
    #[builder(default, setter(strip_option, into))]
    pub otlp_endpoint: Option<String>,
    #[builder(default = DEFAULT_SERVICE_NAME.to_string(), setter(into))]
    pub service_name: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Keeps the span exporter alive. Pending spans are flushed on drop.
#[must_use = "dropping the guard shuts span export down"]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are exported over OTLP in addition to being logged.
    pub fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(err) = provider.force_flush() {
                tracing::warn!(error = %err, "failed to flush pending spans");
            }
            if let Err(err) = provider.shutdown() {
                tracing::warn!(error = %err, "failed to shut the span exporter down");
            }
        }
    }
}

/// Installs the global subscriber.
///
/// Fails if the log level is not a valid filter, if the exporter cannot be
/// built or if a global subscriber is already set.
pub fn init(settings: &TelemetrySettings) -> Result<TelemetryGuard, TelemetryError> {
    let filter = EnvFilter::try_new(&settings.log_level)?;

    let fmt_layer = match settings.log_format {
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    let tracer_provider = settings
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| init_tracer(endpoint, &settings.service_name))
        .transpose()?;

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(settings.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(TelemetryGuard { tracer_provider })
}

fn init_tracer(endpoint: &str, service_name: &str) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpJson)
        .with_endpoint(endpoint)
        .build()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();

    opentelemetry::global::set_tracer_provider(provider.clone());
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = TelemetrySettings::default();

        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.log_format, LogFormat::Compact);
        assert_eq!(settings.otlp_endpoint, None);
        assert_eq!(settings.service_name, "warren");
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn log_format_display_matches_parse() {
        for format in [LogFormat::Json, LogFormat::Pretty, LogFormat::Compact] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let settings = TelemetrySettings::builder().log_level("warren=loud").build();

        assert!(matches!(init(&settings), Err(TelemetryError::Filter(_))));
    }

    #[test]
    fn guard_without_endpoint_does_not_export() {
        let guard = TelemetryGuard {
            tracer_provider: None,
        };

        assert!(!guard.is_exporting());
        drop(guard);
    }
}
