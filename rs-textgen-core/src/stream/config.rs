use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TextGenError};

/// How the worker paces chunk production against the reader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandoffMode {
	/// Generate a chunk only when the reader asks for one.
	///
	/// The reader waits for the whole generation of every fresh chunk.
	#[default]
	OnDemand,
	/// Generate the next chunk while the reader drains the current one,
	/// then wait for the reader to take it.
	LookAhead,
}

/// Configuration of a `ChainStream`.
///
/// Every field has a default, so a partial JSON object is enough:
/// `{"chunk_chars": 4096, "mode": "look-ahead"}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
	/// Minimum number of characters per generated chunk.
	pub chunk_chars: usize,

	/// Number of passes over a chunk before a fresh one is requested.
	///
	/// `1` requests a new chunk every time the current one is exhausted;
	/// higher values replay the chunk to amortize generation cost.
	pub refill_every: usize,

	/// Chunk pacing, see `HandoffMode`.
	pub mode: HandoffMode,

	/// Upper bound on the wait for the worker when closing.
	///
	/// `None` waits forever. On timeout the worker is abandoned.
	#[serde(with = "optional_millis")]
	pub close_timeout: Option<Duration>,
}

impl Default for StreamConfig {
	fn default() -> Self {
		Self {
			chunk_chars: 64 * 1024,
			refill_every: 4,
			mode: HandoffMode::OnDemand,
			close_timeout: Some(Duration::from_secs(10)),
		}
	}
}

impl StreamConfig {
	/// Checks that every value is usable.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `chunk_chars` or `refill_every` is zero.
	pub fn validate(&self) -> Result<()> {
		if self.chunk_chars == 0 {
			return Err(TextGenError::InvalidConfig("chunk_chars must be >= 1".to_owned()));
		}
		if self.refill_every == 0 {
			return Err(TextGenError::InvalidConfig("refill_every must be >= 1".to_owned()));
		}
		Ok(())
	}
}

/// `Option<Duration>` as an optional number of milliseconds.
mod optional_millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer};

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
	}
}
