//! Loop health derived from the snapshots the poll loop pushes.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::{MetricsError, MetricsRegistry, MetricsSnapshot};

/// Failed cycles in a row after which the monitor reports itself failing.
pub const DEFAULT_UNHEALTHY_AFTER: u64 = 10;

/// Coarse state of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No cycle has completed yet.
    Starting,
    /// The last cycles succeeded, or fewer than the threshold failed.
    Ok,
    /// Too many cycles in a row failed.
    Failing,
}

/// What `/health` reports for one detector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Detector name used in logs.
    pub detector: String,
    pub status: HealthStatus,
    pub polls: u64,
    pub published: u64,
    /// Failed cycles since the last successful one.
    pub consecutive_errors: u64,
    /// `[width, height]` of the last published frame.
    pub last_frame: Option<[u32; 2]>,
}

/// Metrics registry plus the latest snapshot, shared between the poll
/// loop and whoever reports on it.
pub struct MonitorState {
    detector: String,
    unhealthy_after: u64,
    registry: MetricsRegistry,
    latest: Mutex<Option<MetricsSnapshot>>,
}

impl MonitorState {
    /// Creates state for one detector.
    pub fn new(detector: impl Into<String>, registry: MetricsRegistry) -> Self {
        Self {
            detector: detector.into(),
            unhealthy_after: DEFAULT_UNHEALTHY_AFTER,
            registry,
            latest: Mutex::new(None),
        }
    }

    /// Reports failing once `cycles` consecutive cycles have failed.
    pub fn with_unhealthy_after(mut self, cycles: u64) -> Self {
        self.unhealthy_after = cycles.max(1);
        self
    }

    /// Records the loop counters after a cycle.
    pub fn update(&self, snapshot: MetricsSnapshot) {
        self.registry.update(&snapshot);
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    /// Current health of the loop.
    pub fn health(&self) -> HealthReport {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        match latest.as_ref() {
            None => HealthReport {
                detector: self.detector.clone(),
                status: HealthStatus::Starting,
                polls: 0,
                published: 0,
                consecutive_errors: 0,
                last_frame: None,
            },
            Some(snapshot) => HealthReport {
                detector: self.detector.clone(),
                status: if snapshot.consecutive_errors >= self.unhealthy_after {
                    HealthStatus::Failing
                } else {
                    HealthStatus::Ok
                },
                polls: snapshot.polls,
                published: snapshot.published,
                consecutive_errors: snapshot.consecutive_errors,
                last_frame: snapshot.frame_width.zip(snapshot.frame_height).map(|(w, h)| [w, h]),
            },
        }
    }

    /// Prometheus text exposition of the registry.
    pub fn encode(&self) -> Result<String, MetricsError> {
        self.registry.encode()
    }
}
