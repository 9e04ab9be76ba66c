use std::collections::HashMap;

use serde::Deserialize;
use url::Url;

/// Logging and trace export settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name attached to every log line and span
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Log line format; defaults by environment
    #[serde(default)]
    pub log_format: Option<LogFormat>,
    /// Log filter directive, e.g. `info,tether_rest=debug`
    #[serde(default)]
    pub log_filter: Option<String>,
    /// Additional resource attributes for exported spans
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
    /// OTLP span exporter; spans stay local when absent
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
    /// Sampling settings for exported spans
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_format: None,
            log_filter: None,
            resource_attributes: HashMap::new(),
            exporter: None,
            tracing: None,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable
    Pretty,
    /// One JSON object per line
    Json,
}

/// OTLP exporter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// OTLP endpoint URL
    pub endpoint: Url,
    /// Export protocol
    #[serde(default)]
    pub protocol: ExportProtocol,
}

/// OTLP export protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportProtocol {
    /// gRPC (default)
    #[default]
    Grpc,
    /// HTTP/protobuf
    HttpProto,
}

/// Span sampling
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracingConfig {
    /// Sampling rate (0.0 to 1.0)
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
    /// Follow the parent span's sampling decision
    #[serde(default = "default_true")]
    pub parent_based: bool,
}

fn default_service_name() -> String {
    "tether".to_owned()
}

#[allow(clippy::missing_const_for_fn)]
fn default_sampling_rate() -> f64 {
    1.0
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}
