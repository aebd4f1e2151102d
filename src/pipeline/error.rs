//! Failure taxonomy of a poll cycle.

use thiserror::Error;

use crate::acquisition::TransportError;
use crate::decode::DecodeError;
use crate::metadata::MetadataError;
use crate::notify::NotifyError;
use crate::publish::{HeaderOverflowError, PublishError};

/// Stages of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Decoding,
    Comparing,
    Publishing,
    Notifying,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Decoding => "decoding",
            Stage::Comparing => "comparing",
            Stage::Publishing => "publishing",
            Stage::Notifying => "notifying",
        };
        f.write_str(name)
    }
}

/// Any failure that ends a poll cycle early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    HeaderOverflow(#[from] HeaderOverflowError),
    #[error(transparent)]
    Io(#[from] PublishError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl PipelineError {
    /// All error kinds, as reported by [`PipelineError::kind`].
    pub const KINDS: [&'static str; 6] =
        ["transport", "decode", "metadata", "header_overflow", "io", "notify"];

    /// Stage the cycle was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Transport(_) => Stage::Fetching,
            PipelineError::Decode(_) => Stage::Decoding,
            PipelineError::Metadata(_)
            | PipelineError::HeaderOverflow(_)
            | PipelineError::Io(_) => Stage::Publishing,
            PipelineError::Notify(_) => Stage::Notifying,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Transport(_) => "transport",
            PipelineError::Decode(_) => "decode",
            PipelineError::Metadata(_) => "metadata",
            PipelineError::HeaderOverflow(_) => "header_overflow",
            PipelineError::Io(_) => "io",
            PipelineError::Notify(_) => "notify",
        }
    }
}
