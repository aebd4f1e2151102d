//! Header synthesis and file publication.
//!
//! A published image is a 512-byte text header followed immediately by
//! the raw little-endian pixel buffer. It is regenerated in full on every
//! publish, together with a one-line beam center side-file.

mod header;
mod writer;

pub use header::{synthesize_header, Header, HeaderFields, HeaderOverflowError, HEADER_BYTES};
pub use writer::{PublishError, Publisher};
