//! Monitor interface client.
//!
//! The [`FrameSource`] trait is what the poll loop consumes, so tests can
//! script frames without a detector on the network.

use serde::{Deserialize, Serialize};

use super::content::ContentType;
use super::http::{DetectorApi, TransportError};

/// Which monitor image the poll loop asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// The most recently acquired frame, possibly seen before.
    #[default]
    Latest,
    /// Block server-side until a new frame is available.
    Next,
}

impl std::str::FromStr for FetchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latest" => Ok(FetchMode::Latest),
            "next" => Ok(FetchMode::Next),
            other => Err(format!("unknown fetch mode `{other}` (expected latest or next)")),
        }
    }
}

/// Image selector for `monitor/api/<version>/images/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorImage {
    /// The oldest buffered image.
    Oldest,
    /// The next image, blocking until it arrives.
    Next,
    /// The most recent image.
    Latest,
    /// A specific image of a specific series.
    Id { series: u32, image: u32 },
}

impl MonitorImage {
    /// Route parameter appended after `images/`.
    pub fn parameter(&self) -> String {
        match self {
            MonitorImage::Oldest => String::new(),
            MonitorImage::Next => "next".to_string(),
            MonitorImage::Latest => "monitor".to_string(),
            MonitorImage::Id { series, image } => format!("{series}/{image}"),
        }
    }
}

impl std::str::FromStr for MonitorImage {
    type Err = TransportError;

    /// Accepts `""`, `"next"`, `"monitor"` or `"<series>/<image>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(MonitorImage::Oldest),
            "next" => Ok(MonitorImage::Next),
            "monitor" => Ok(MonitorImage::Latest),
            other => {
                let invalid = || TransportError::InvalidSelector(other.to_string());
                let (series, image) = other.split_once('/').ok_or_else(invalid)?;
                Ok(MonitorImage::Id {
                    series: series.parse().map_err(|_| invalid())?,
                    image: image.parse().map_err(|_| invalid())?,
                })
            }
        }
    }
}

impl From<FetchMode> for MonitorImage {
    fn from(mode: FetchMode) -> Self {
        match mode {
            FetchMode::Latest => MonitorImage::Latest,
            FetchMode::Next => MonitorImage::Next,
        }
    }
}

/// Source of encoded frames.
///
/// An empty vector means the detector had no image to hand out.
pub trait FrameSource {
    /// Fetches the most recent encoded frame.
    fn fetch_latest(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Fetches the next encoded frame, blocking until one is available.
    fn fetch_next(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Dispatches on the configured fetch mode.
    fn fetch(&mut self, mode: FetchMode) -> Result<Vec<u8>, TransportError> {
        match mode {
            FetchMode::Latest => self.fetch_latest(),
            FetchMode::Next => self.fetch_next(),
        }
    }
}

/// HTTP client for the detector's monitor interface.
#[derive(Debug, Clone)]
pub struct MonitorClient {
    api: DetectorApi,
}

impl MonitorClient {
    pub fn new(api: DetectorApi) -> Self {
        Self { api }
    }

    /// Fetches one monitor image as TIFF bytes.
    pub fn fetch_image(&self, image: MonitorImage) -> Result<Vec<u8>, TransportError> {
        let url = self.api.url("monitor", "images", &image.parameter());
        self.api.get(&url, ContentType::Tiff)
    }

    /// Sets a monitor configuration parameter.
    ///
    /// The value is wrapped as `{"value": ...}`, which is the body shape
    /// the detector API expects for configuration writes.
    pub fn set_config(&self, key: &str, value: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.api.url("monitor", "config", key);
        tracing::info!(url = %url, "Setting monitor config");
        let body = serde_json::json!({ "value": value }).to_string();
        self.api.put(&url, body.as_bytes(), Some(ContentType::Json))
    }

    /// Switches the monitor interface on.
    pub fn enable_monitor(&self) -> Result<(), TransportError> {
        self.set_config("mode", "enabled").map(|_| ())
    }
}

impl FrameSource for MonitorClient {
    fn fetch_latest(&mut self) -> Result<Vec<u8>, TransportError> {
        self.fetch_image(MonitorImage::Latest)
    }

    fn fetch_next(&mut self) -> Result<Vec<u8>, TransportError> {
        self.fetch_image(MonitorImage::Next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::http::test_server;
    use crate::acquisition::DetectorConfig;

    fn client_for(port: u16) -> MonitorClient {
        let mut config = DetectorConfig::with_host("127.0.0.1");
        config.port = port;
        MonitorClient::new(DetectorApi::new(&config).unwrap())
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("".parse::<MonitorImage>().unwrap(), MonitorImage::Oldest);
        assert_eq!("next".parse::<MonitorImage>().unwrap(), MonitorImage::Next);
        assert_eq!(
            "monitor".parse::<MonitorImage>().unwrap(),
            MonitorImage::Latest
        );
        assert_eq!(
            "3/17".parse::<MonitorImage>().unwrap(),
            MonitorImage::Id {
                series: 3,
                image: 17
            }
        );
    }

    #[test]
    fn test_invalid_selector_rejected() {
        for bad in ["latest", "3/", "a/b", "3-17"] {
            assert!(matches!(
                bad.parse::<MonitorImage>(),
                Err(TransportError::InvalidSelector(_))
            ));
        }
    }

    #[test]
    fn test_selector_parameter_round_trip() {
        let id = MonitorImage::Id {
            series: 2,
            image: 9,
        };
        assert_eq!(id.parameter().parse::<MonitorImage>().unwrap(), id);
    }

    #[test]
    fn test_fetch_mode_routes() {
        let (port, server) =
            test_server::serve(vec![(200, b"a".to_vec()), (200, b"b".to_vec())]);
        let mut client = client_for(port);

        assert_eq!(client.fetch(FetchMode::Latest).unwrap(), b"a");
        assert_eq!(client.fetch(FetchMode::Next).unwrap(), b"b");

        let captured = server.join().unwrap();
        assert!(captured[0].request_line.contains("/monitor/api/1.8.0/images/monitor "));
        assert!(captured[1].request_line.contains("/monitor/api/1.8.0/images/next "));
    }

    #[test]
    fn test_enable_monitor_sends_json_value() {
        let (port, server) = test_server::serve(vec![(200, Vec::new())]);
        let client = client_for(port);

        client.enable_monitor().unwrap();

        let captured = server.join().unwrap();
        assert!(captured[0]
            .request_line
            .starts_with("PUT /monitor/api/1.8.0/config/mode "));
        assert_eq!(
            captured[0].header("content-type"),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(captured[0].body, br#"{"value":"enabled"}"#);
    }

    #[test]
    fn test_fetch_mode_from_str() {
        assert_eq!("Next".parse::<FetchMode>().unwrap(), FetchMode::Next);
        assert!("oldest".parse::<FetchMode>().is_err());
    }
}
