use std::io;

use thiserror::Error;

/// Errors produced by corpus fetching, model construction and streaming.
///
/// Training itself never fails: an empty corpus yields a degenerate model
/// (see `ChainModel::is_degenerate`). Lookup misses during a walk are not
/// errors either, they only shorten the output.
#[derive(Debug, Error)]
pub enum TextGenError {
	/// A corpus could not be read from disk.
	#[error("failed to fetch corpus '{identifier}': {source}")]
	Fetch {
		identifier: String,
		#[source]
		source: io::Error,
	},

	/// A corpus could not be downloaded.
	#[cfg(feature = "http")]
	#[error("failed to download corpus '{identifier}': {source}")]
	Download {
		identifier: String,
		#[source]
		source: reqwest::Error,
	},

	/// The source has no corpus under this identifier.
	#[error("unknown corpus '{0}'")]
	UnknownCorpus(String),

	/// The model holds no word at all and cannot feed a stream.
	#[error("model is degenerate: it was trained on text without any word")]
	DegenerateModel,

	/// The stream was closed, by its owner or through a stop handle.
	#[error("stream is closed")]
	StreamClosed,

	/// The worker thread went away without being asked to.
	#[error("text worker exited unexpectedly")]
	WorkerGone,

	/// The declared length cannot go below what has already been read.
	#[error("cannot set length to {requested} bytes: {delivered} bytes already delivered")]
	LengthBelowPosition { requested: u64, delivered: u64 },

	/// A configuration value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error(transparent)]
	Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TextGenError>;

impl From<TextGenError> for io::Error {
	fn from(err: TextGenError) -> Self {
		match err {
			TextGenError::Io(inner) => inner,
			TextGenError::StreamClosed | TextGenError::WorkerGone => {
				io::Error::new(io::ErrorKind::BrokenPipe, err)
			}
			TextGenError::LengthBelowPosition { .. } | TextGenError::InvalidConfig(_) => {
				io::Error::new(io::ErrorKind::InvalidInput, err)
			}
			other => io::Error::other(other),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn closed_stream_maps_to_broken_pipe() {
		let err: io::Error = TextGenError::StreamClosed.into();
		assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
		assert_eq!(err.to_string(), "stream is closed");
	}

	#[test]
	fn io_errors_are_unwrapped() {
		let err: io::Error = TextGenError::Io(io::Error::new(io::ErrorKind::NotFound, "gone")).into();
		assert_eq!(err.kind(), io::ErrorKind::NotFound);
	}

	#[test]
	fn length_error_mentions_both_sizes() {
		let err = TextGenError::LengthBelowPosition { requested: 10, delivered: 30 };
		assert_eq!(err.to_string(), "cannot set length to 10 bytes: 30 bytes already delivered");
	}
}
