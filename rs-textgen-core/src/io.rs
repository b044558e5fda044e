use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a whole text file into a `String`.
///
/// Line splitting is left to the tokenizer, which handles `\n` and `\r\n`.
pub(crate) fn read_text<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents)
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_folder(input: &Path) -> PathBuf {
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Lists the stems of all files with a given extension in a directory.
///
/// `data/moby.txt` is reported as `moby`. Results are sorted.
pub(crate) fn list_stems<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut stems = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(stem) = path.file_stem() {
				stems.push(stem.to_string_lossy().to_string());
			}
		}
	}

	stems.sort();
	Ok(stems)
}
