//! Poll loop orchestration.
//!
//! Wires fetch → decode → compare → publish → notify for a single
//! detector. Cycles are strictly sequential and the previous frame is
//! owned by the loop, so no locking is involved.

mod error;
mod poll;
mod stats;

pub use error::{PipelineError, Stage};
pub use poll::{CycleOutcome, PollLoop};
pub use stats::PollStats;
