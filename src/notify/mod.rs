//! Viewer notification.
//!
//! After each publish the viewer is told to reload the image through a
//! one-line command on its local control socket. Notification is best
//! effort: a failure is reported but the published file stays.

use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::acquisition::ViewerConfig;

/// Errors raised while notifying the viewer.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid viewer address {0}")]
    Address(String),
    #[error("failed to connect to viewer at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("failed to send notification to viewer: {0}")]
    Send(std::io::Error),
}

/// Something that can be told to reload an image.
pub trait ViewerNotifier {
    /// Asks the viewer to load the image at `path`.
    fn notify(&mut self, path: &Path) -> Result<(), NotifyError>;
}

/// Command line understood by the viewer's control socket.
pub fn load_command(path: &Path) -> String {
    format!("load_image {}\n", path.display())
}

/// Notifies a viewer over a fresh TCP connection per command.
#[derive(Debug, Clone)]
pub struct SocketNotifier {
    addr: SocketAddr,
    connect_timeout: Duration,
}

impl SocketNotifier {
    pub fn new(addr: SocketAddr, connect_timeout: Duration) -> Self {
        Self {
            addr,
            connect_timeout,
        }
    }

    /// Resolves the viewer address from configuration.
    pub fn from_config(config: &ViewerConfig) -> Result<Self, NotifyError> {
        let target = format!("{}:{}", config.host, config.port);
        let addr = target
            .to_socket_addrs()
            .map_err(|_| NotifyError::Address(target.clone()))?
            .next()
            .ok_or(NotifyError::Address(target))?;
        Ok(Self::new(
            addr,
            Duration::from_millis(config.connect_timeout_ms.max(1)),
        ))
    }

    /// Address commands are sent to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl ViewerNotifier for SocketNotifier {
    fn notify(&mut self, path: &Path) -> Result<(), NotifyError> {
        let mut stream = TcpStream::connect_timeout(&self.addr, self.connect_timeout).map_err(
            |source| NotifyError::Connect {
                addr: self.addr,
                source,
            },
        )?;

        stream
            .write_all(load_command(path).as_bytes())
            .map_err(NotifyError::Send)?;
        stream.flush().map_err(NotifyError::Send)?;
        // The viewer may already have closed its end.
        let _ = stream.shutdown(Shutdown::Both);

        tracing::debug!(addr = %self.addr, path = %path.display(), "Viewer notified");
        Ok(())
    }
}
