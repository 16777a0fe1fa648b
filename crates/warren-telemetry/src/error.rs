use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("unknown log format: {0}")]
    UnknownFormat(String),
    #[error("cannot build span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),
    #[error("cannot install global subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}
