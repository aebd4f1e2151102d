//! Last published frame.

use super::is_changed;
use crate::decode::Frame;

/// The frame most recently published.
///
/// Empty at startup, so the first decoded frame is always published.
/// Only the poll loop holds one, and it is replaced only after a publish
/// succeeds.
#[derive(Debug, Default)]
pub struct PreviousFrame {
    frame: Option<Frame>,
}

impl PreviousFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `current` differs from the last published frame.
    ///
    /// A change of shape counts as a change even when the sample count
    /// is the same.
    pub fn is_changed(&self, current: &Frame) -> bool {
        match &self.frame {
            None => true,
            Some(previous) => {
                previous.width() != current.width()
                    || previous.height() != current.height()
                    || is_changed(previous.pixels(), current.pixels())
            }
        }
    }

    /// Records `frame` as the last published frame.
    pub fn replace(&mut self, frame: Frame) {
        self.frame = Some(frame);
    }

    /// Returns the last published frame, if any.
    pub fn get(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Returns true if nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.frame.is_none()
    }
}
