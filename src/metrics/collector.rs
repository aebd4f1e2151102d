//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

use crate::pipeline::{PipelineError, PollStats};

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of poll loop state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Poll cycles started.
    pub polls: u64,
    /// Cycles with no image available.
    pub empty_polls: u64,
    /// Cycles whose image was already published.
    pub unchanged: u64,
    /// Frames published.
    pub published: u64,
    /// Failed viewer notifications.
    pub notify_failures: u64,
    /// Failed cycles by error kind.
    pub errors: Vec<(&'static str, u64)>,
    /// Width of the last published frame.
    pub frame_width: Option<u32>,
    /// Height of the last published frame.
    pub frame_height: Option<u32>,
    /// Failed cycles since the last successful one.
    pub consecutive_errors: u64,
}

/// Prometheus metrics registry for the monitor.
pub struct MetricsRegistry {
    registry: Registry,

    polls_total: IntCounter,
    empty_polls_total: IntCounter,
    unchanged_total: IntCounter,
    published_total: IntCounter,
    notify_failures_total: IntCounter,
    errors_total: IntCounterVec,

    frame_width: IntGauge,
    frame_height: IntGauge,
}

/// Advances a counter to `target`; counters never move backwards.
fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all monitor metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let polls_total = IntCounter::new(
            "detector_monitor_polls_total",
            "Total number of poll cycles",
        )?;
        let empty_polls_total = IntCounter::new(
            "detector_monitor_empty_polls_total",
            "Poll cycles where the detector had no image",
        )?;
        let unchanged_total = IntCounter::new(
            "detector_monitor_frames_unchanged_total",
            "Poll cycles whose image matched the last published one",
        )?;
        let published_total = IntCounter::new(
            "detector_monitor_frames_published_total",
            "Frames written to the publication path",
        )?;
        let notify_failures_total = IntCounter::new(
            "detector_monitor_notifications_failed_total",
            "Viewer notifications that failed after a publish",
        )?;
        let errors_total = IntCounterVec::new(
            Opts::new(
                "detector_monitor_errors_total",
                "Failed poll cycles by error kind",
            ),
            &["kind"],
        )?;
        let frame_width = IntGauge::new(
            "detector_monitor_frame_width",
            "Width of the last published frame in pixels",
        )?;
        let frame_height = IntGauge::new(
            "detector_monitor_frame_height",
            "Height of the last published frame in pixels",
        )?;

        registry.register(Box::new(polls_total.clone()))?;
        registry.register(Box::new(empty_polls_total.clone()))?;
        registry.register(Box::new(unchanged_total.clone()))?;
        registry.register(Box::new(published_total.clone()))?;
        registry.register(Box::new(notify_failures_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(frame_width.clone()))?;
        registry.register(Box::new(frame_height.clone()))?;

        // Make every error series visible from the start.
        for kind in PipelineError::KINDS {
            errors_total.with_label_values(&[kind]);
        }

        Ok(Self {
            registry,
            polls_total,
            empty_polls_total,
            unchanged_total,
            published_total,
            notify_failures_total,
            errors_total,
            frame_width,
            frame_height,
        })
    }

    /// Updates all metrics from a snapshot of loop state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        advance(&self.polls_total, snapshot.polls);
        advance(&self.empty_polls_total, snapshot.empty_polls);
        advance(&self.unchanged_total, snapshot.unchanged);
        advance(&self.published_total, snapshot.published);
        advance(&self.notify_failures_total, snapshot.notify_failures);

        for (kind, count) in &snapshot.errors {
            advance(&self.errors_total.with_label_values(&[*kind]), *count);
        }

        if let Some(width) = snapshot.frame_width {
            self.frame_width.set(i64::from(width));
        }
        if let Some(height) = snapshot.frame_height {
            self.frame_height.set(i64::from(height));
        }
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from the poll loop counters.
    pub fn from_stats(stats: &PollStats) -> Self {
        Self {
            polls: stats.polls,
            empty_polls: stats.empty_polls,
            unchanged: stats.unchanged,
            published: stats.published,
            notify_failures: stats.notify_failures,
            errors: stats.errors.iter().map(|(k, v)| (*k, *v)).collect(),
            frame_width: stats.last_dimensions.map(|(w, _)| w),
            frame_height: stats.last_dimensions.map(|(_, h)| h),
            consecutive_errors: stats.consecutive_errors,
        }
    }
}
