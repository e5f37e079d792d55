//! Streamgate-Media: HLS manifest generation and segment synthesis.
//!
//! Everything here is a pure function over `(asset, quality, token)`. The
//! builders produce immutable text artifacts and carry no mutable state, so
//! they can be tested without a server.

pub mod hls;
pub mod segment;

pub use hls::{segment_count, ManifestBuilder};
pub use segment::{segment_payload, SEGMENT_PAYLOAD_LEN};
