//! Detector transport and configuration.
//!
//! This module talks to the detector's HTTP interface: it fetches
//! encoded monitor frames, writes monitor settings, and holds the file
//! configuration for the whole monitor. The encoded bytes are handed on
//! untouched; decoding happens in [`crate::decode`].

mod client;
mod config;
mod content;
mod http;

pub use client::{FetchMode, FrameSource, MonitorClient, MonitorImage};
pub use config::{
    ConfigError, DetectorConfig, FileConfig, MetadataConfig, MetadataSource, MetricsConfig,
    OutputConfig, PollConfig, ViewerConfig,
};
pub use content::ContentType;
pub use http::{DetectorApi, TransportError};

#[cfg(test)]
pub(crate) use http::test_server;
