//! Cache-replacement and admission policies for an LLM prefix-block
//! (KV-cache) admission layer.
//!
//! An upstream serving stack computes, per request, an ordered list of
//! prefix-block hash identifiers naming reusable pieces of attention state.
//! This crate implements the policies that decide which identifiers stay
//! resident in a capacity-bounded cache: [`policy::S3Fifo`],
//! [`policy::S3FifoAttn`], [`policy::Lfu`]/[`policy::LfuTyped`],
//! [`policy::Gdsf`], and [`policy::S3Gdsf`]. Every policy implements the
//! shared [`policy::Policy`] trait and is driven by a single
//! `access(key, request_prefix_ids, request_type)` call per identifier.
//!
//! Trace parsing, CLI/YAML configuration loading, and charting are
//! deliberately out of scope -- this crate is the replacement/admission
//! engine only, consumed by whatever harness owns the trace and the
//! [`store::ResidentStore`].

pub mod error;
pub mod ghost;
pub mod policy;
pub mod priority;
pub mod store;

pub use error::{PolicyError, PolicyResult};
pub use policy::{Policy, ResidentSnapshot};
pub use store::{BlockStore, ResidentStore};

/// Emits a `tracing::trace!` event when the `logging` feature is enabled,
/// and compiles to nothing otherwise. Used around real evictions, admission
/// rejections, and clock advances -- observational only, never control
/// flow.
#[cfg(feature = "logging")]
macro_rules! policy_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) };
}
#[cfg(not(feature = "logging"))]
macro_rules! policy_trace {
    ($($arg:tt)*) => {};
}
pub(crate) use policy_trace;
