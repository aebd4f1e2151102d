//! Running counters for the poll loop.

use std::collections::BTreeMap;

use super::{CycleOutcome, PipelineError};

/// Counters accumulated since startup.
#[derive(Debug, Clone, Default)]
pub struct PollStats {
    /// Poll cycles started.
    pub polls: u64,
    /// Cycles where the detector returned no data.
    pub empty_polls: u64,
    /// Cycles whose frame matched the last published one.
    pub unchanged: u64,
    /// Frames published.
    pub published: u64,
    /// Publishes whose viewer notification failed.
    pub notify_failures: u64,
    /// Failed cycles by error kind.
    pub errors: BTreeMap<&'static str, u64>,
    /// Dimensions of the last published frame.
    pub last_dimensions: Option<(u32, u32)>,
    /// Failed cycles since the last successful one.
    pub consecutive_errors: u64,
}

impl PollStats {
    /// Records the result of one cycle.
    pub fn record(&mut self, result: &Result<CycleOutcome, PipelineError>) {
        self.polls += 1;
        if result.is_ok() {
            self.consecutive_errors = 0;
        }
        match result {
            Ok(CycleOutcome::NoData) => self.empty_polls += 1,
            Ok(CycleOutcome::Unchanged) => self.unchanged += 1,
            Ok(CycleOutcome::Published {
                width,
                height,
                notify_error,
            }) => {
                self.published += 1;
                self.last_dimensions = Some((*width, *height));
                if notify_error.is_some() {
                    self.notify_failures += 1;
                }
            }
            Err(e) => {
                *self.errors.entry(e.kind()).or_insert(0) += 1;
                self.consecutive_errors += 1;
            }
        }
    }

    /// Total failed cycles across all kinds.
    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }

    /// Failed cycles of one kind.
    pub fn errors_of(&self, kind: &str) -> u64 {
        self.errors.get(kind).copied().unwrap_or(0)
    }
}
