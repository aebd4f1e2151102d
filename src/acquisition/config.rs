//! Monitor configuration.
//!
//! Everything has a default except the detector host, which must come
//! from either the config file or the command line.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::FetchMode;

/// Connection settings for the detector's HTTP interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Detector host name or IP address.
    pub host: String,
    /// HTTP port of the detector API.
    pub port: u16,
    /// API version segment used in every route.
    pub api_version: String,
    /// Optional prefix inserted before the module segment.
    pub url_prefix: String,
    /// `user:password` for HTTP basic authentication.
    pub credentials: Option<String>,
    /// Request timeout in milliseconds (0 disables the timeout).
    pub timeout_ms: u64,
    /// Which monitor image to request on each poll.
    pub fetch_mode: FetchMode,
    /// Switch the monitor interface on at startup.
    pub enable_monitor: bool,
    /// Name used in log lines. Empty means `EIGER_<host>_<port>`.
    pub name: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 80,
            api_version: "1.8.0".to_string(),
            url_prefix: String::new(),
            credentials: None,
            timeout_ms: 0,
            fetch_mode: FetchMode::Latest,
            enable_monitor: false,
            name: String::new(),
        }
    }
}

impl DetectorConfig {
    /// Creates a configuration for the given host with default settings.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Name used to identify this detector in logs.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("EIGER_{}_{}", self.host, self.port)
        } else {
            self.name.clone()
        }
    }

    /// Request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort("detector"));
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::InvalidApiVersion);
        }
        Ok(())
    }
}

/// Where beam geometry comes from at publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    /// Read the attributes from the detector's configuration API.
    Detector,
    /// Use the fixed values from this file.
    Static,
}

/// Metadata provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Provider selection.
    pub source: MetadataSource,
    /// Beam center X in pixels (static source only).
    pub beam_center_x: f64,
    /// Beam center Y in pixels (static source only).
    pub beam_center_y: f64,
    /// Detector distance in meters (static source only).
    pub detector_distance: f64,
    /// Incident energy in eV (static source only).
    pub incident_energy: f64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            source: MetadataSource::Detector,
            beam_center_x: 0.0,
            beam_center_y: 0.0,
            detector_distance: 0.0,
            incident_energy: 0.0,
        }
    }
}

/// Publication paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Header + pixel image file read by the viewer.
    pub image_path: PathBuf,
    /// Plain-text beam center side-file.
    pub beam_center_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("/tmp/eiger_monitor"),
            beam_center_path: PathBuf::from("/tmp/.adxv_beam_center"),
        }
    }
}

/// Viewer socket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Host the viewer listens on.
    pub host: String,
    /// Viewer command port.
    pub port: u16,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8100,
            connect_timeout_ms: 1000,
        }
    }
}

/// Poll cadence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Sleep between cycles in milliseconds (0 polls back to back).
    pub interval_ms: u64,
}

/// Metrics exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
    /// Consecutive failed cycles before `/health` answers 503.
    pub unhealthy_after: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: 0,
            unhealthy_after: crate::metrics::DEFAULT_UNHEALTHY_AFTER,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("detector host is not set")]
    MissingHost,
    #[error("invalid {0} port")]
    InvalidPort(&'static str),
    #[error("API version must not be empty")]
    InvalidApiVersion,
    #[error("output path for {0} must not be empty")]
    EmptyPath(&'static str),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    ///
    /// The detector host may still be empty afterwards; call
    /// [`FileConfig::validate`] once command-line overrides are applied.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        if self.viewer.port == 0 {
            return Err(ConfigError::InvalidPort("viewer"));
        }
        if self.output.image_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("image"));
        }
        if self.output.beam_center_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("beam center"));
        }
        Ok(())
    }
}
