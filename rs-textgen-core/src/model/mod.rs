//! Top-level module for the word-level Markov chain.
//!
//! This module provides:
//! - Tokens and key normalization (`Token`)
//! - Per-key successor lists (`State`)
//! - The trained chain and its transition table (`ChainModel`)
//! - Generation parameters (`StartWord`, `StopCriterion`)
//! - The random walk producing text (`generator`)

/// Trained word-level Markov chain.
///
/// Handles training from seed text, key inspection, and owns the
/// immutable transition table.
pub mod chain_model;

/// Random walk over a `ChainModel`.
///
/// Tracks the generation cursor (sentence state, counts, stalls)
/// and formats the emitted words.
pub mod generator;

/// Generation parameters: where the walk starts and when it stops.
pub mod generation_input;

/// Successor list of a single key.
///
/// Not exposed.
mod state;

/// Tokens, boundary sentinel and key normalization.
pub mod token;
