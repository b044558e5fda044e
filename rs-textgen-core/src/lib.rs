//! Markov-chain synthetic text generation library.
//!
//! This crate provides the pieces needed to manufacture large amounts of
//! plausible-looking text cheaply:
//! - A first-order word-level Markov chain (`ChainModel`)
//! - Corpus sources supplying the seed text (`CorpusSource`)
//! - A background-thread byte stream over the chain (`ChainStream`)
//!
//! Tokenization and file helpers are kept internal.

/// Library error type and `Result` alias.
pub mod error;

/// Word-level Markov chain: training and random walks.
///
/// Exposes the model, its tokens and the generation parameters.
pub mod model;

/// Providers of raw seed text (memory, files, HTTP).
pub mod corpus;

/// Streaming adapter exposing a chain as a `std::io::Read` source.
///
/// Generation runs on a dedicated worker thread; chunks are handed over
/// to the reader through channels.
pub mod stream;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use corpus::{CorpusSource, FileCorpus, MemoryCorpus};
#[cfg(feature = "http")]
pub use corpus::HttpCorpus;
pub use error::{Result, TextGenError};
pub use model::chain_model::ChainModel;
pub use model::generation_input::{StartWord, StopCriterion};
pub use stream::chain_stream::{ChainStream, StopHandle, StreamState};
pub use stream::config::{HandoffMode, StreamConfig};
