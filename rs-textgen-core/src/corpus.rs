//! Providers of seed text for `ChainModel`.
//!
//! A corpus source is an opaque string provider: given an identifier it
//! returns the whole text, or an error that aborts model construction.
//! Nothing is retried here; callers wanting retries wrap the source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Result, TextGenError};
use crate::io;

/// Supplies the raw seed text for a given identifier.
pub trait CorpusSource {
	/// Returns the full text for `identifier`.
	///
	/// # Errors
	/// Returns an error if the text cannot be obtained.
	fn fetch(&self, identifier: &str) -> Result<String>;
}

/// In-memory corpus, mostly useful for tests and embedded samples.
#[derive(Clone, Debug, Default)]
pub struct MemoryCorpus {
	texts: HashMap<String, String>,
}

impl MemoryCorpus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds (or replaces) a text under `identifier`.
	pub fn with(mut self, identifier: &str, text: &str) -> Self {
		self.texts.insert(identifier.to_owned(), text.to_owned());
		self
	}
}

impl CorpusSource for MemoryCorpus {
	fn fetch(&self, identifier: &str) -> Result<String> {
		self.texts
			.get(identifier)
			.cloned()
			.ok_or_else(|| TextGenError::UnknownCorpus(identifier.to_owned()))
	}
}

/// Corpus stored as `<identifier>.txt` files under a root directory.
///
/// An identifier that already carries an extension, or that names an
/// existing file, is used as a file name as-is.
#[derive(Clone, Debug)]
pub struct FileCorpus {
	root: PathBuf,
}

impl FileCorpus {
	/// Creates a corpus rooted at `root`. `"."` means the current directory.
	pub fn new<P: AsRef<Path>>(root: P) -> Self {
		Self {
			root: io::normalize_folder(root.as_ref()),
		}
	}

	/// Identifiers of the `.txt` files directly under the root, sorted.
	///
	/// # Errors
	/// Returns an error if the root cannot be listed.
	pub fn identifiers(&self) -> Result<Vec<String>> {
		Ok(io::list_stems(&self.root, "txt")?)
	}

	fn path_of(&self, identifier: &str) -> PathBuf {
		let path = self.root.join(identifier);
		if path.extension().is_some() || path.is_file() {
			path
		} else {
			path.with_extension("txt")
		}
	}
}

impl CorpusSource for FileCorpus {
	fn fetch(&self, identifier: &str) -> Result<String> {
		let path = self.path_of(identifier);
		debug!("Reading corpus {}", path.display());
		io::read_text(&path).map_err(|source| TextGenError::Fetch {
			identifier: identifier.to_owned(),
			source,
		})
	}
}

/// Corpus downloaded over HTTP(S): `<base_url><identifier>`.
///
/// Uses a blocking client; model construction is synchronous anyway.
#[cfg(feature = "http")]
#[derive(Debug)]
pub struct HttpCorpus {
	base_url: String,
	client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpCorpus {
	/// Creates a source fetching from `base_url` (for example
	/// `https://www.gutenberg.org/files/`).
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.to_owned(),
			client: reqwest::blocking::Client::new(),
		}
	}
}

#[cfg(feature = "http")]
impl CorpusSource for HttpCorpus {
	fn fetch(&self, identifier: &str) -> Result<String> {
		let url = format!("{}{}", self.base_url, identifier);
		debug!("Downloading corpus {url}");
		let download = |source: reqwest::Error| TextGenError::Download {
			identifier: identifier.to_owned(),
			source,
		};
		self.client
			.get(&url)
			.send()
			.and_then(|response| response.error_for_status())
			.and_then(|response| response.text())
			.map_err(download)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn memory_corpus_returns_text() {
		let corpus = MemoryCorpus::new().with("a", "alpha").with("b", "beta");
		assert_eq!(corpus.fetch("b").unwrap(), "beta");
	}

	#[test]
	fn memory_corpus_unknown_identifier() {
		let err = MemoryCorpus::new().fetch("nope").unwrap_err();
		assert!(matches!(err, TextGenError::UnknownCorpus(id) if id == "nope"));
	}

	#[test]
	fn file_corpus_appends_txt() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("moby.txt"), "Call me Ishmael.").unwrap();
		fs::write(dir.path().join("notes.md"), "# notes").unwrap();

		let corpus = FileCorpus::new(dir.path());
		assert_eq!(corpus.fetch("moby").unwrap(), "Call me Ishmael.");
		assert_eq!(corpus.fetch("notes.md").unwrap(), "# notes");
		assert_eq!(corpus.identifiers().unwrap(), vec!["moby".to_owned()]);
	}

	#[test]
	fn file_corpus_reads_extensionless_file() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("README"), "plain words").unwrap();

		let corpus = FileCorpus::new(dir.path());
		assert_eq!(corpus.fetch("README").unwrap(), "plain words");
		assert!(matches!(corpus.fetch("NOTES"), Err(TextGenError::Fetch { .. })));
	}

	#[test]
	fn file_corpus_missing_file_is_fetch_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = FileCorpus::new(dir.path()).fetch("absent").unwrap_err();
		match err {
			TextGenError::Fetch { identifier, source } => {
				assert_eq!(identifier, "absent");
				assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
			}
			other => panic!("unexpected error: {other}"),
		}
	}
}
