//! Blocking HTTP transport for the detector API.
//!
//! One [`ureq::Agent`] is created per detector and cloned into every
//! component that talks to it, so all requests share a connection pool.
//! Requests are only ever issued from the poll loop, one at a time.

use std::io::Read;

use base64::Engine as _;
use thiserror::Error;

use super::config::DetectorConfig;
use super::content::ContentType;

/// Upper bound on a single response body.
const MAX_BODY_BYTES: u64 = 512 * 1024 * 1024;

/// Errors raised while talking to the detector.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to initialize transport: {0}")]
    Init(String),
    #[error("failed to connect to host: {0}")]
    Connect(String),
    #[error("request to {url} failed with HTTP status {status}")]
    Status { status: u16, url: String },
    #[error("failed to read response body: {0}")]
    Read(#[from] std::io::Error),
    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: u64 },
    #[error("invalid parameter: {0}")]
    InvalidSelector(String),
}

/// Route builder and request executor for one detector.
#[derive(Clone)]
pub struct DetectorApi {
    agent: ureq::Agent,
    root: String,
    url_prefix: String,
    version: String,
    authorization: Option<String>,
}

impl DetectorApi {
    /// Builds the transport from the detector configuration.
    pub fn new(config: &DetectorConfig) -> Result<Self, TransportError> {
        if config.host.trim().is_empty() {
            return Err(TransportError::Init("detector host is empty".to_string()));
        }

        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let authorization = config.credentials.as_deref().map(|user| {
            format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD.encode(user)
            )
        });

        Ok(Self {
            agent: builder.build(),
            root: format!("http://{}:{}", config.host, config.port),
            url_prefix: config.url_prefix.clone(),
            version: config.api_version.clone(),
            authorization,
        })
    }

    /// Full URL of `<prefix><module>/api/<version>/<task>/[parameter]`.
    pub fn url(&self, module: &str, task: &str, parameter: &str) -> String {
        format!(
            "{}/{}{}/api/{}/{}/{}",
            self.root, self.url_prefix, module, self.version, task, parameter
        )
    }

    /// Issues a GET and returns the response body.
    ///
    /// A success status with no body yields an empty vector.
    pub fn get(&self, url: &str, accept: ContentType) -> Result<Vec<u8>, TransportError> {
        tracing::trace!(url, accept = %accept, "GET");
        let request = self.authorize(self.agent.get(url)).set("Accept", accept.mime());
        Self::read_body(url, request.call())
    }

    /// Issues a PUT with a negotiated content type and returns the body.
    pub fn put(
        &self,
        url: &str,
        body: &[u8],
        declared: Option<ContentType>,
    ) -> Result<Vec<u8>, TransportError> {
        let content_type = ContentType::negotiate(body, declared);
        tracing::debug!(url, content_type = %content_type, bytes = body.len(), "PUT");
        let request = self
            .authorize(self.agent.put(url))
            .set("Content-Type", content_type.mime());
        Self::read_body(url, request.send_bytes(body))
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.authorization {
            Some(value) => request.set("Authorization", value),
            None => request,
        }
    }

    fn read_body(
        url: &str,
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<Vec<u8>, TransportError> {
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(TransportError::Status {
                    status,
                    url: url.to_string(),
                })
            }
            Err(ureq::Error::Transport(e)) => return Err(TransportError::Connect(e.to_string())),
        };

        read_limited(response.into_reader(), MAX_BODY_BYTES)
    }
}

/// Reads `reader` to the end, failing once more than `limit` bytes arrive.
fn read_limited<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    if body.len() as u64 > limit {
        return Err(TransportError::BodyTooLarge { limit });
    }
    Ok(body)
}

impl std::fmt::Debug for DetectorApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorApi")
            .field("root", &self.root)
            .field("version", &self.version)
            .field("authenticated", &self.authorization.is_some())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn api_for(port: u16) -> DetectorApi {
        let mut config = DetectorConfig::with_host("127.0.0.1");
        config.port = port;
        DetectorApi::new(&config).unwrap()
    }

    #[test]
    fn test_body_at_limit_is_read() {
        let body = read_limited(&[7u8; 16][..], 16).unwrap();
        assert_eq!(body.len(), 16);
    }

    #[test]
    fn test_body_over_limit_rejected() {
        assert!(matches!(
            read_limited(&[7u8; 17][..], 16),
            Err(TransportError::BodyTooLarge { limit: 16 })
        ));
    }

    #[test]
    fn test_url_layout() {
        let mut config = DetectorConfig::with_host("10.0.0.5");
        config.url_prefix = "eiger/".to_string();
        let api = DetectorApi::new(&config).unwrap();

        assert_eq!(
            api.url("monitor", "images", "monitor"),
            "http://10.0.0.5:80/eiger/monitor/api/1.8.0/images/monitor"
        );
        assert_eq!(
            api.url("monitor", "images", ""),
            "http://10.0.0.5:80/eiger/monitor/api/1.8.0/images/"
        );
    }

    #[test]
    fn test_empty_host_rejected() {
        let config = DetectorConfig::default();
        assert!(matches!(
            DetectorApi::new(&config),
            Err(TransportError::Init(_))
        ));
    }

    #[test]
    fn test_get_returns_body_and_sends_accept() {
        let (port, server) = test_server::serve(vec![(200, b"payload".to_vec())]);
        let api = api_for(port);

        let body = api
            .get(&api.url("monitor", "images", "monitor"), ContentType::Tiff)
            .unwrap();
        assert_eq!(body, b"payload");

        let captured = server.join().unwrap();
        assert_eq!(
            captured[0].request_line,
            "GET /monitor/api/1.8.0/images/monitor HTTP/1.1"
        );
        assert_eq!(captured[0].header("accept"), Some("application/tiff"));
    }

    #[test]
    fn test_no_content_is_empty_body() {
        let (port, server) = test_server::serve(vec![(204, Vec::new())]);
        let api = api_for(port);

        let body = api
            .get(&api.url("monitor", "images", "monitor"), ContentType::Tiff)
            .unwrap();
        assert!(body.is_empty());
        server.join().unwrap();
    }

    #[test]
    fn test_error_status_is_transport_error() {
        let (port, server) = test_server::serve(vec![(503, b"busy".to_vec())]);
        let api = api_for(port);

        let result = api.get(&api.url("monitor", "images", "next"), ContentType::Tiff);
        assert!(matches!(
            result,
            Err(TransportError::Status { status: 503, .. })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_put_negotiates_content_type_and_auth() {
        let (port, server) = test_server::serve(vec![(200, b"[]".to_vec())]);
        let mut config = DetectorConfig::with_host("127.0.0.1");
        config.port = port;
        config.credentials = Some("user:secret".to_string());
        let api = DetectorApi::new(&config).unwrap();

        api.put(&api.url("monitor", "config", "mode"), b"II*\x00data", None)
            .unwrap();

        let captured = server.join().unwrap();
        assert!(captured[0].request_line.starts_with("PUT "));
        assert_eq!(captured[0].header("content-type"), Some("application/tiff"));
        assert_eq!(
            captured[0].header("authorization"),
            Some("Basic dXNlcjpzZWNyZXQ=")
        );
        assert_eq!(captured[0].body, b"II*\x00data");
    }

    #[test]
    fn test_connection_refused_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let api = api_for(port);

        assert!(matches!(
            api.get(&api.url("monitor", "images", ""), ContentType::Tiff),
            Err(TransportError::Connect(_))
        ));
    }
}
