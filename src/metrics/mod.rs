//! Prometheus metrics exporter for the poll loop.
//!
//! # Metrics Exposed
//!
//! - `detector_monitor_polls_total` - Poll cycles started
//! - `detector_monitor_empty_polls_total` - Cycles with no image available
//! - `detector_monitor_frames_unchanged_total` - Duplicate frames skipped
//! - `detector_monitor_frames_published_total` - Frames published
//! - `detector_monitor_notifications_failed_total` - Failed viewer notifications
//! - `detector_monitor_errors_total{kind}` - Failed cycles by error kind
//! - `detector_monitor_frame_width` / `detector_monitor_frame_height` - Last published dimensions
//!
//! [`MonitorState`] also derives a health report from the pushed snapshots.
//! The HTTP endpoints (`/metrics`, `/health`) are only built with the
//! `metrics` feature.
//!
//! # Example
//!
//! ```no_run
//! use detector_monitor::metrics::{MetricsRegistry, MetricsSnapshot, MonitorState};
//! use detector_monitor::pipeline::PollStats;
//!
//! let state = MonitorState::new("EIGER_10.0.0.5_80", MetricsRegistry::new().unwrap());
//! state.update(MetricsSnapshot::from_stats(&PollStats::default()));
//! println!("{:?}", state.health().status);
//! println!("{}", state.encode().unwrap());
//! ```

mod collector;
mod health;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
pub use health::{HealthReport, HealthStatus, MonitorState, DEFAULT_UNHEALTHY_AFTER};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, ServerError};
