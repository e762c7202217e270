use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Debug, Default, Args)]
pub struct Config {
    #[command(flatten)]
    pub api: ApiConfig,

    #[command(flatten)]
    pub storage: StorageConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ApiConfig {
    /// Base URL of the Projello backend
    #[arg(long, env = "PROJELLO_API_URL", default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Per-request timeout in seconds (0 keeps the transport default)
    #[arg(long, env = "PROJELLO_REQUEST_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { api_url: "http://localhost:8080".to_string(), request_timeout_secs: 30 }
    }
}

#[derive(Clone, Debug, Args)]
pub struct StorageConfig {
    /// File holding tokens, profile, notification cache and preferences
    #[arg(long, env = "PROJELLO_STATE_FILE", default_value = ".projello/state.json", global = true)]
    pub state_file: PathBuf,

    /// Keep session state in memory only (nothing survives the process)
    #[arg(long, env = "PROJELLO_IN_MEMORY", default_value_t = false, global = true)]
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { state_file: PathBuf::from(".projello/state.json"), in_memory: false }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Default, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "PROJELLO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// OTLP gRPC endpoint for traces and metrics (disabled when unset)
    #[arg(long, env = "PROJELLO_OTLP_ENDPOINT", global = true)]
    pub otlp_endpoint: Option<String>,
}
