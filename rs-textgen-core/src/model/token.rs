use std::fmt;

/// Punctuation stripped from the end of a word when building its key.
const KEY_PUNCTUATION: [char; 5] = ['.', ',', ';', '?', '!'];

/// Punctuation that closes a sentence.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '?', '!'];

/// A unit of the chain: either a literal word or the boundary sentinel.
///
/// The same type is used for table keys and for successors. Keys are always
/// normalized (see `Token::key_of`), successors keep the literal word with its
/// casing and punctuation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
	/// Line or sentence break.
	Boundary,
	/// A word, as found in the corpus (successor) or normalized (key).
	Word(String),
}

impl Token {
	/// Literal successor token for a corpus word.
	pub fn word(literal: &str) -> Self {
		Token::Word(literal.to_owned())
	}

	/// Normalized key for a word: lowercased, trailing sentence punctuation
	/// stripped.
	///
	/// A word made only of punctuation (`"..."`) normalizes to the boundary.
	pub fn key_of(word: &str) -> Self {
		let key = word.to_lowercase();
		let key = key.trim_end_matches(KEY_PUNCTUATION);
		if key.is_empty() {
			Token::Boundary
		} else {
			Token::Word(key.to_owned())
		}
	}

	/// Normalized key of this token.
	pub fn key(&self) -> Self {
		match self {
			Token::Boundary => Token::Boundary,
			Token::Word(w) => Token::key_of(w),
		}
	}

	pub fn is_boundary(&self) -> bool {
		matches!(self, Token::Boundary)
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::Boundary => f.write_str("<boundary>"),
			Token::Word(w) => f.write_str(w),
		}
	}
}

/// Returns `true` if the word ends with `.`, `?` or `!`.
pub(crate) fn ends_sentence(word: &str) -> bool {
	word.ends_with(SENTENCE_TERMINATORS)
}

/// Uppercases the first character of a word.
///
/// UTF-8 safe: `"élan"` becomes `"Élan"`.
pub(crate) fn capitalize(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_is_lowercase_without_trailing_punctuation() {
		assert_eq!(Token::key_of("Hello,"), Token::word("hello"));
		assert_eq!(Token::key_of("WHY?!"), Token::word("why"));
		assert_eq!(Token::key_of("e.g."), Token::word("e.g"));
		assert_eq!(Token::key_of("don't;"), Token::word("don't"));
	}

	#[test]
	fn punctuation_only_word_is_boundary() {
		assert_eq!(Token::key_of("..."), Token::Boundary);
		assert_eq!(Token::word("?!").key(), Token::Boundary);
	}

	#[test]
	fn sentence_terminators() {
		assert!(ends_sentence("end."));
		assert!(ends_sentence("really?"));
		assert!(ends_sentence("stop!"));
		assert!(!ends_sentence("pause,"));
		assert!(!ends_sentence("semi;"));
	}

	#[test]
	fn capitalizes_first_char_only() {
		assert_eq!(capitalize("élan"), "Élan");
		assert_eq!(capitalize("mIxed"), "MIxed");
		assert_eq!(capitalize(""), "");
	}
}
