//! The poll-diff-convert-publish loop.
//!
//! Each cycle runs to completion before the next one starts:
//!
//! ```text
//! Idle → Fetching → Decoding → Comparing ─┬─ Unchanged ─────────────→ Idle
//!                                         └─ Publishing → Notifying → Idle
//! ```
//!
//! A failure in any stage ends the cycle and leaves the previous frame
//! untouched, except for notification, which happens after the publish is
//! already committed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use super::{PipelineError, PollStats, Stage};
use crate::acquisition::{FetchMode, FrameSource};
use crate::decode::decode_frame;
use crate::detection::PreviousFrame;
use crate::metadata::MetadataProvider;
use crate::notify::{NotifyError, ViewerNotifier};
use crate::publish::{synthesize_header, HeaderFields, Publisher};

/// Result of one successful cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The detector had no image.
    NoData,
    /// The image matched the last published one.
    Unchanged,
    /// A new image was published. The viewer notification may have failed.
    Published {
        width: u32,
        height: u32,
        notify_error: Option<NotifyError>,
    },
}

/// Polls one detector and republishes changed frames.
pub struct PollLoop<S, M, N> {
    name: String,
    mode: FetchMode,
    interval: Duration,
    source: S,
    metadata: M,
    notifier: N,
    publisher: Publisher,
    previous: PreviousFrame,
    stats: PollStats,
}

impl<S, M, N> PollLoop<S, M, N>
where
    S: FrameSource,
    M: MetadataProvider,
    N: ViewerNotifier,
{
    /// Creates a loop with an empty previous frame.
    pub fn new(
        name: impl Into<String>,
        source: S,
        metadata: M,
        notifier: N,
        publisher: Publisher,
    ) -> Self {
        Self {
            name: name.into(),
            mode: FetchMode::Latest,
            interval: Duration::ZERO,
            source,
            metadata,
            notifier,
            publisher,
            previous: PreviousFrame::new(),
            stats: PollStats::default(),
        }
    }

    /// Selects which monitor image each cycle fetches.
    pub fn with_fetch_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sleeps for `interval` between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Detector name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Counters since startup.
    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    /// Last published frame.
    pub fn previous(&self) -> &PreviousFrame {
        &self.previous
    }

    /// The frame source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The viewer notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Runs one full cycle and records its outcome.
    pub fn poll_once(&mut self) -> Result<CycleOutcome, PipelineError> {
        let result = self.cycle();
        self.stats.record(&result);
        result
    }

    fn cycle(&mut self) -> Result<CycleOutcome, PipelineError> {
        let encoded = self.source.fetch(self.mode)?;
        if encoded.is_empty() {
            return Ok(CycleOutcome::NoData);
        }

        let frame = decode_frame(&encoded)?;
        drop(encoded);

        if !self.previous.is_changed(&frame) {
            return Ok(CycleOutcome::Unchanged);
        }

        let metadata = self.metadata.sample()?;
        let header = synthesize_header(&HeaderFields::new(&frame, &metadata)?)?;
        self.publisher.publish(&header, &frame, &metadata)?;

        let (width, height) = (frame.width(), frame.height());
        debug!(
            detector = %self.name,
            width,
            height,
            beam_center_x = metadata.beam_center_x,
            beam_center_y = metadata.beam_center_y,
            "Frame published"
        );
        self.previous.replace(frame);

        let notify_error = self.notifier.notify(self.publisher.image_path()).err();
        Ok(CycleOutcome::Published {
            width,
            height,
            notify_error,
        })
    }

    /// Polls until `shutdown` is set, calling `on_cycle` after every cycle.
    ///
    /// Every error is logged and the loop moves on to the next cycle.
    pub fn run<F>(&mut self, shutdown: &AtomicBool, mut on_cycle: F)
    where
        F: FnMut(&PollStats),
    {
        info!(detector = %self.name, mode = ?self.mode, "Monitor polling started");

        while !shutdown.load(Ordering::SeqCst) {
            match self.poll_once() {
                Ok(CycleOutcome::NoData) => trace!(detector = %self.name, "No image available"),
                Ok(CycleOutcome::Unchanged) => trace!(detector = %self.name, "Image unchanged"),
                Ok(CycleOutcome::Published {
                    width,
                    height,
                    notify_error,
                }) => {
                    info!(
                        detector = %self.name,
                        path = %self.publisher.image_path().display(),
                        width,
                        height,
                        "Image received and saved"
                    );
                    if let Some(e) = notify_error {
                        warn!(
                            detector = %self.name,
                            stage = %Stage::Notifying,
                            error = %e,
                            "Viewer notification failed"
                        );
                    }
                }
                Err(e) => warn!(
                    detector = %self.name,
                    stage = %e.stage(),
                    kind = e.kind(),
                    error = %e,
                    "Poll cycle failed"
                ),
            }

            on_cycle(&self.stats);

            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
        }

        info!(
            detector = %self.name,
            polls = self.stats.polls,
            published = self.stats.published,
            errors = self.stats.total_errors(),
            "Monitor polling stopped"
        );
    }
}
