//! Streaming adapter over a `ChainModel`.
//!
//! - `ChainStream`: the reader-facing `std::io::Read` implementation
//! - `StreamConfig`: chunk size, refill cadence, hand-off mode, timeouts
//! - the producer thread and its channels (internal)

/// Reader side: declared length, chunk replay, lifecycle.
pub mod chain_stream;

/// Stream configuration.
pub mod config;

/// Producer thread generating chunks on request or ahead of time.
///
/// Not exposed.
mod worker;
