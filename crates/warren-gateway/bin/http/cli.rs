use clap::{Parser, ValueEnum};
use jiff::SignedDuration;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use warren_gateway::RouterOptions;
use warren_slugs::{SlugsSettings, DEFAULT_MIN_LENGTH};
use warren_storage::redis::DEFAULT_INSTANCE_INDEX_KEY;
use warren_telemetry::{LogFormat, TelemetrySettings, DEFAULT_LOG_LEVEL, DEFAULT_SERVICE_NAME};

pub const LISTEN_ADDR_ENV: &str = "WARREN_LISTEN_ADDR";
pub const SLUGS_SALT_ENV: &str = "WARREN_SLUGS_SALT";
pub const SLUGS_MIN_LENGTH_ENV: &str = "WARREN_SLUGS_MIN_LENGTH";
pub const STORAGE_BACKEND_ENV: &str = "WARREN_STORAGE_BACKEND";
pub const REDIS_URL_ENV: &str = "WARREN_REDIS_URL";
pub const REDIS_INSTANCE_INDEX_KEY_ENV: &str = "WARREN_REDIS_INSTANCE_INDEX_KEY";
pub const REDIS_KEY_PREFIX_ENV: &str = "WARREN_REDIS_KEY_PREFIX";
pub const PUBLIC_BASE_URL_ENV: &str = "WARREN_PUBLIC_BASE_URL";
pub const TRACE_STORAGE_ENV: &str = "WARREN_TRACE_STORAGE";
pub const LOG_REQUESTS_ENV: &str = "WARREN_LOG_REQUESTS";
pub const LOG_ELAPSED_TIME_ENV: &str = "WARREN_LOG_ELAPSED_TIME";
pub const LOG_LEVEL_ENV: &str = "WARREN_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "WARREN_LOG_FORMAT";
pub const OTLP_ENDPOINT_ENV: &str = "WARREN_OTLP_ENDPOINT";
pub const SERVICE_NAME_ENV: &str = "WARREN_SERVICE_NAME";
pub const SHUTDOWN_TIMEOUT_ENV: &str = "WARREN_SHUTDOWN_TIMEOUT";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SHUTDOWN_TIMEOUT: &str = "3s";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Pretty,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

#[derive(Parser)]
#[command(name = "warren", version, about = "Warren URL shortener")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Secret salt of the slug encoder. Every instance of a fleet must share it.
    #[arg(long, env = SLUGS_SALT_ENV, hide_env_values = true)]
    pub slugs_salt: String,

    #[arg(long, env = SLUGS_MIN_LENGTH_ENV, default_value_t = DEFAULT_MIN_LENGTH)]
    pub slugs_min_length: usize,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("storage", "redis"))]
    pub redis_url: Option<String>,

    #[arg(
        long,
        env = REDIS_INSTANCE_INDEX_KEY_ENV,
        default_value = DEFAULT_INSTANCE_INDEX_KEY
    )]
    pub redis_instance_index_key: String,

    #[arg(long, env = REDIS_KEY_PREFIX_ENV, default_value = "")]
    pub redis_key_prefix: String,

    /// Base URL used to build `short_url` in create responses.
    #[arg(long, env = PUBLIC_BASE_URL_ENV)]
    pub public_base_url: Option<String>,

    /// Wrap the storage backend in tracing spans.
    #[arg(long, env = TRACE_STORAGE_ENV, default_value_t = false)]
    pub trace_storage: bool,

    /// Log every request body at trace level.
    #[arg(long, env = LOG_REQUESTS_ENV, default_value_t = false)]
    pub log_requests: bool,

    /// Log the handling time of every request at trace level.
    #[arg(long, env = LOG_ELAPSED_TIME_ENV, default_value_t = false)]
    pub log_elapsed_time: bool,

    #[arg(long, env = LOG_LEVEL_ENV, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Compact)]
    pub log_format: LogFormatArg,

    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,

    #[arg(long, env = SERVICE_NAME_ENV, default_value = DEFAULT_SERVICE_NAME)]
    pub service_name: String,

    /// How long in-flight requests may take to finish after a shutdown signal.
    #[arg(long, env = SHUTDOWN_TIMEOUT_ENV, default_value = DEFAULT_SHUTDOWN_TIMEOUT)]
    pub shutdown_timeout: SignedDuration,
}

impl CLI {
    pub fn slugs_settings(&self) -> SlugsSettings {
        SlugsSettings::builder()
            .salt(self.slugs_salt.clone())
            .min_length(self.slugs_min_length)
            .build()
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            log_requests: self.log_requests,
            log_elapsed_time: self.log_elapsed_time,
        }
    }

    pub fn telemetry_settings(&self) -> TelemetrySettings {
        TelemetrySettings {
            log_level: self.log_level.clone(),
            log_format: self.log_format.into(),
            otlp_endpoint: self.otlp_endpoint.clone(),
            service_name: self.service_name.clone(),
        }
    }
}
