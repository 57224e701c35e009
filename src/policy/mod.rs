//! The five cache-replacement/admission policies and the trait they share.

pub mod gdsf;
pub mod lfu;
pub mod s3_gdsf;
pub mod s3fifo;
pub mod s3fifo_attn;

pub use gdsf::{Gdsf, GdsfConfig};
pub use lfu::{Lfu, LfuConfig, LfuTyped};
pub use s3_gdsf::{S3Gdsf, S3GdsfConfig};
pub use s3fifo::{S3Fifo, S3FifoConfig};
pub use s3fifo_attn::{S3FifoAttn, S3FifoAttnConfig};

/// A diagnostic, ordering-free snapshot of a policy's resident keys.
///
/// Shape differs by family: S3-FIFO-style policies expose their two
/// segments separately, frequency/priority policies expose a flat set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidentSnapshot {
    /// S3-FIFO family: small-queue keys, then main-queue keys.
    Segmented { small: Vec<u64>, main: Vec<u64> },
    /// LFU and GDSF families: a flat, unordered resident set.
    Flat(Vec<u64>),
}

/// Shared contract implemented by every policy variant.
pub trait Policy {
    /// Process one access to `key`. `request_prefix_ids` is the full
    /// ordered list of identifiers for the request this access belongs to
    /// (used by the position-aware policies); `request_type` is opaque
    /// except to [`LfuTyped`]. Returns `true` for a hit, `false` for a miss.
    fn access(&mut self, key: u64, request_prefix_ids: &[u64], request_type: i32) -> bool;

    /// Snapshot the currently resident keys for inspection/testing.
    fn current_keys(&self) -> ResidentSnapshot;
}

/// First index of `key` in `ids`, or `None` if absent or `ids` is empty.
///
/// Shared by the GDSF-family position bonuses, which both need "how early
/// does this key appear in the current request".
pub(crate) fn first_index(ids: &[u64], key: u64) -> Option<usize> {
    ids.iter().position(|&id| id == key)
}
