//! Detector Monitor Library
//!
//! Polls a detector's monitor interface for the latest image, detects
//! whether it changed since the previous poll, and republishes changed
//! frames as a fixed-layout image file with a geometry header for a live
//! viewer.
//!
//! # Architecture
//!
//! The system follows an explicit data flow, one cycle at a time:
//!
//! ```text
//! acquisition → decode → detection → publish → notify
//!                                       ↑
//!                                   metadata
//! ```
//!
//! [`pipeline::PollLoop`] drives the cycle and owns the only mutable state,
//! the last published frame.
//!
//! # Example
//!
//! ```no_run
//! use detector_monitor::{
//!     acquisition::{DetectorApi, DetectorConfig, MonitorClient},
//!     metadata::DetectorMetadata,
//!     notify::SocketNotifier,
//!     pipeline::PollLoop,
//!     publish::Publisher,
//! };
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//!
//! let config = DetectorConfig::with_host("10.0.0.5");
//! let api = DetectorApi::new(&config).unwrap();
//!
//! let mut poll = PollLoop::new(
//!     config.display_name(),
//!     MonitorClient::new(api.clone()),
//!     DetectorMetadata::new(api),
//!     SocketNotifier::new("127.0.0.1:8100".parse().unwrap(), Duration::from_secs(1)),
//!     Publisher::new("/tmp/eiger_monitor", "/tmp/.adxv_beam_center"),
//! );
//!
//! let shutdown = AtomicBool::new(false);
//! poll.run(&shutdown, |_| {});
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod acquisition;
pub mod decode;
pub mod detection;
pub mod metadata;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod publish;

// Re-export commonly used types at crate root
pub use acquisition::{DetectorApi, FetchMode, FileConfig, FrameSource, MonitorClient};
pub use decode::{decode_frame, DecodeError, Frame};
pub use detection::{is_changed, PreviousFrame};
pub use metadata::{AcquisitionMetadata, DetectorMetadata, MetadataProvider, StaticMetadata};
pub use notify::{SocketNotifier, ViewerNotifier};
pub use pipeline::{CycleOutcome, PipelineError, PollLoop};
pub use publish::{synthesize_header, HeaderFields, Publisher};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
