use std::collections::HashMap;

use log::debug;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::generation_input::{StartWord, StopCriterion};
use super::state::State;
use super::token::{Token, ends_sentence};
use crate::corpus::CorpusSource;
use crate::error::Result;

/// Consecutive silent steps after which a walk gives up.
pub const DEFAULT_STALL_LIMIT: usize = 1024;

/// Represents a first-order, word-level Markov chain.
///
/// The `ChainModel` maps every normalized word of the corpus (plus the
/// boundary sentinel) to the list of literal tokens that followed it,
/// and generates text by walking that table at random.
///
/// # Responsibilities
/// - Build the transition table from a seed text, line by line
/// - Expose the table for inspection (keys, successors)
/// - Generate passages of a minimum length (see `generator`)
///
/// # Invariants
/// - The boundary sentinel is always a key
/// - Every successor, once normalized, is a key
/// - The table is never modified after training
#[derive(Clone, Debug)]
pub struct ChainModel {
	/// Mapping from a normalized key to its state
	states: HashMap<Token, State>,

	/// Keys in first-seen order, for reproducible random starts
	keys: Vec<Token>,

	/// Number of words seen during training
	word_count: usize,

	/// Consecutive steps without output before a walk ends
	stall_limit: usize,
}

impl ChainModel {
	/// Trains a model from a seed text.
	///
	/// # Behavior
	/// - Splits the text in lines, then each line on runs of whitespace.
	/// - An empty (or blank) line produces a boundary.
	/// - Each word is appended, literal, to the state of the previous key;
	///   the previous key then becomes the word's normalized key.
	/// - A word ending a sentence (`.`, `?`, `!`) is followed by a boundary.
	/// - At the end of input the last key is closed with a boundary.
	///
	/// # Notes
	/// - Never fails. An empty text gives a degenerate model whose only key
	///   is the boundary, mapping to itself (see `is_degenerate`).
	pub fn train(seed_text: &str) -> Self {
		let mut model = Self {
			states: HashMap::new(),
			keys: Vec::new(),
			word_count: 0,
			stall_limit: DEFAULT_STALL_LIMIT,
		};
		model.state_mut(Token::Boundary);

		let mut prev = Token::Boundary;
		for line in seed_text.lines() {
			let mut words = line.split_whitespace().peekable();
			if words.peek().is_none() {
				model.add_transition(&prev, Token::Boundary);
				prev = Token::Boundary;
				continue;
			}

			for word in words {
				model.add_transition(&prev, Token::word(word));
				model.word_count += 1;
				prev = Token::key_of(word);

				if ends_sentence(word) {
					model.add_transition(&prev, Token::Boundary);
					prev = Token::Boundary;
				}
			}
		}

		// Close the last sentence. A boundary that already leads somewhere
		// needs nothing more; an empty one must map to itself.
		if !prev.is_boundary() || model.successors(&Token::Boundary).is_empty() {
			model.add_transition(&prev, Token::Boundary);
		}

		debug!(
			"Trained chain: {} words, {} keys{}",
			model.word_count,
			model.keys.len(),
			if model.is_degenerate() { " (degenerate)" } else { "" }
		);
		model
	}

	/// Fetches a corpus and trains a model from it.
	///
	/// # Errors
	/// Propagates the source's fetch error; nothing is retried.
	pub fn from_source<S: CorpusSource + ?Sized>(source: &S, identifier: &str) -> Result<Self> {
		let text = source.fetch(identifier)?;
		Ok(Self::train(&text))
	}

	/// Sets the number of consecutive silent steps after which a walk ends.
	///
	/// A silent step is a lookup miss, or a boundary that appends nothing
	/// taken from a key without any word successor. `0` is raised to `1`.
	pub fn with_stall_limit(mut self, stall_limit: usize) -> Self {
		self.stall_limit = stall_limit.max(1);
		self
	}

	pub fn stall_limit(&self) -> usize {
		self.stall_limit
	}

	fn state_mut(&mut self, key: Token) -> &mut State {
		if !self.states.contains_key(&key) {
			self.keys.push(key.clone());
		}
		self.states.entry(key).or_insert_with(State::new)
	}

	fn add_transition(&mut self, prev: &Token, next: Token) {
		self.state_mut(prev.clone()).add_successor(next);
	}

	/// Returns a key chosen uniformly among the distinct keys.
	///
	/// Never `None` on a trained model: the boundary is always a key.
	pub fn random_key<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Token> {
		self.keys.choose(rng)
	}

	/// Successors recorded for a key, in corpus order.
	///
	/// The key is used as given; build it with `Token::key_of` for words.
	pub fn successors(&self, key: &Token) -> &[Token] {
		self.states.get(key).map(State::successors).unwrap_or_default()
	}

	pub(crate) fn state(&self, key: &Token) -> Option<&State> {
		self.states.get(key)
	}

	/// Returns `true` if the word (in any casing, with or without trailing
	/// punctuation) was seen during training.
	pub fn contains_word(&self, word: &str) -> bool {
		match Token::key_of(word) {
			Token::Boundary => false,
			key => self.states.contains_key(&key),
		}
	}

	/// Distinct keys in first-seen order. The first one is the boundary.
	pub fn keys(&self) -> &[Token] {
		&self.keys
	}

	/// Number of distinct keys, boundary included.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Always `false`: the boundary is a key of every model.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}

	/// Number of words read during training.
	pub fn word_count(&self) -> usize {
		self.word_count
	}

	/// Returns `true` if training saw no word at all.
	///
	/// A degenerate model only ever produces empty passages.
	pub fn is_degenerate(&self) -> bool {
		self.word_count == 0
	}

	/// Generates a passage of at least `min_chars` characters, then finishes
	/// the current sentence.
	pub fn generate_by_chars<R: Rng + ?Sized>(&self, start: &StartWord, min_chars: usize, rng: &mut R) -> String {
		self.generate(start, StopCriterion::Chars(min_chars), rng)
	}

	/// Generates a passage of at least `min_words` words, then finishes the
	/// current sentence.
	pub fn generate_by_words<R: Rng + ?Sized>(&self, start: &StartWord, min_words: usize, rng: &mut R) -> String {
		self.generate(start, StopCriterion::Words(min_words), rng)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::corpus::MemoryCorpus;

	fn w(s: &str) -> Token {
		Token::word(s)
	}

	#[test]
	fn worked_example_table() {
		let model = ChainModel::train("a b a c. a b a c.");
		assert_eq!(model.successors(&Token::Boundary), &[w("a"), w("a")]);
		assert_eq!(model.successors(&w("a")), &[w("b"), w("c."), w("b"), w("c.")]);
		assert_eq!(model.successors(&w("b")), &[w("a"), w("a")]);
		assert_eq!(model.successors(&w("c")), &[Token::Boundary, Token::Boundary]);
		assert_eq!(model.keys(), &[Token::Boundary, w("a"), w("b"), w("c")]);
		assert_eq!(model.word_count(), 8);
	}

	#[test]
	fn empty_text_is_degenerate() {
		let model = ChainModel::train("");
		assert!(model.is_degenerate());
		assert_eq!(model.len(), 1);
		assert_eq!(model.successors(&Token::Boundary), &[Token::Boundary]);
	}

	#[test]
	fn blank_lines_are_boundaries() {
		let model = ChainModel::train("one two\n\n   \nthree");
		assert_eq!(model.successors(&w("two")), &[Token::Boundary]);
		assert_eq!(model.successors(&Token::Boundary), &[w("one"), Token::Boundary, w("three")]);
		assert_eq!(model.successors(&w("three")), &[Token::Boundary]);
		assert!(!model.is_degenerate());
	}

	#[test]
	fn lines_without_punctuation_run_on() {
		let model = ChainModel::train("the cat\r\nsat down");
		assert_eq!(model.successors(&w("cat")), &[w("sat")]);
	}

	#[test]
	fn keys_are_normalized_and_successors_literal() {
		let model = ChainModel::train("Hello, World! hello there.");
		assert_eq!(model.successors(&w("hello")), &[w("World!"), w("there.")]);
		assert_eq!(model.successors(&w("world")), &[Token::Boundary]);
		assert!(model.contains_word("HELLO"));
		assert!(model.contains_word("world!"));
		assert!(!model.contains_word("moon"));
		assert!(!model.contains_word("..."));
	}

	#[test]
	fn every_successor_is_a_key() {
		let texts = [
			"",
			"single",
			"a b a c. a b a c.",
			"Is it? It is! Maybe, maybe not; who knows...\n\nNext paragraph here",
			"trailing blank\n\n\n",
			"... ?! ,",
		];
		for text in texts {
			let model = ChainModel::train(text);
			for key in model.keys() {
				for next in model.successors(key) {
					assert!(
						model.state(&next.key()).is_some(),
						"{next} has no state in model of {text:?}"
					);
				}
			}
		}
	}

	#[test]
	fn trained_from_source() {
		let corpus = MemoryCorpus::new().with("tiny", "a b a c.");
		let model = ChainModel::from_source(&corpus, "tiny").unwrap();
		assert_eq!(model.word_count(), 4);
		assert!(ChainModel::from_source(&corpus, "missing").is_err());
	}

	#[test]
	fn stall_limit_is_at_least_one() {
		let model = ChainModel::train("a.").with_stall_limit(0);
		assert_eq!(model.stall_limit(), 1);
	}
}
