use serde::Deserialize;

/// Strategy used to select the first word of a generated passage.
///
/// # Variants
/// - `Random`: pick a key uniformly from the distinct keys of the model.
///   The boundary key is part of the draw.
/// - `Custom(String)`: start from the given word. If the word never occurred
///   in the corpus the walk stalls and returns an empty passage; use
///   `ChainModel::contains_word` to check beforehand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StartWord {
	#[default]
	Random,
	Custom(String),
}

impl StartWord {
	pub fn custom(word: &str) -> Self {
		StartWord::Custom(word.to_owned())
	}
}

/// Metric and minimum length of a generated passage.
///
/// The walk keeps going past the limit until the current sentence is
/// closed, so the output is usually a little longer than requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCriterion {
	/// Minimum number of emitted words.
	Words(usize),
	/// Minimum number of emitted characters (not bytes).
	Chars(usize),
}

impl StopCriterion {
	/// Returns `true` once `words` or `chars` reaches the limit.
	pub fn is_met(&self, words: usize, chars: usize) -> bool {
		match *self {
			StopCriterion::Words(limit) => words >= limit,
			StopCriterion::Chars(limit) => chars >= limit,
		}
	}
}
