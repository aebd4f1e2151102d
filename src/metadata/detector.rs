//! Attribute reads from the detector's configuration API.

use serde::Deserialize;

use super::provider::{Attribute, MetadataError, MetadataProvider};
use crate::acquisition::{ContentType, DetectorApi};

/// Configuration parameter as returned by `detector/api/<version>/config/<key>`.
#[derive(Debug, Deserialize)]
struct ConfigValue {
    value: serde_json::Value,
}

/// Reads beam geometry from the detector itself.
///
/// Shares the transport handle with the frame client.
#[derive(Debug, Clone)]
pub struct DetectorMetadata {
    api: DetectorApi,
}

impl DetectorMetadata {
    pub fn new(api: DetectorApi) -> Self {
        Self { api }
    }
}

fn parse_value(attribute: Attribute, body: &[u8]) -> Result<f64, MetadataError> {
    let malformed = |reason: String| MetadataError::Malformed { attribute, reason };

    let parsed: ConfigValue =
        serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;
    match parsed.value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| malformed(format!("{n} is not representable as f64"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| malformed(format!("{s:?}: {e}"))),
        other => Err(malformed(format!("unexpected value {other}"))),
    }
}

impl MetadataProvider for DetectorMetadata {
    fn read_attribute(&mut self, attribute: Attribute) -> Result<f64, MetadataError> {
        let url = self.api.url("detector", "config", attribute.config_key());
        let body = self
            .api
            .get(&url, ContentType::Json)
            .map_err(|source| MetadataError::Read { attribute, source })?;
        let value = parse_value(attribute, &body)?;

        tracing::trace!(%attribute, value, "Read attribute");
        Ok(value)
    }
}
