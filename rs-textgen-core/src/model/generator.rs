use log::trace;
use rand::Rng;

use super::chain_model::ChainModel;
use super::generation_input::{StartWord, StopCriterion};
use super::token::{Token, capitalize, ends_sentence};

/// Line break emitted when the walk crosses a boundary.
const LINE_BREAK: &str = "\n";

/// Paragraph break emitted after every second sentence.
const PARAGRAPH_BREAK: &str = "\n\n";

/// State of a single walk. Lives for the duration of one `generate` call.
struct Cursor {
	output: String,
	/// Consecutive boundaries crossed; `>= 1` means the last sentence is closed.
	boundaries: usize,
	/// Sentences closed since the last line or paragraph break.
	sentences: usize,
	words: usize,
	chars: usize,
	/// Consecutive silent steps that cannot lead to a word.
	stalled: usize,
}

impl Cursor {
	fn new() -> Self {
		Self {
			output: String::new(),
			boundaries: 0,
			sentences: 0,
			words: 0,
			chars: 0,
			stalled: 0,
		}
	}

	fn push_str(&mut self, s: &str) {
		self.output.push_str(s);
		self.chars += s.chars().count();
	}

	fn at_sentence_start(&self) -> bool {
		self.output.is_empty() || self.boundaries > 0
	}

	/// Appends a word, capitalized at a sentence start, space-separated
	/// unless it follows a line break.
	fn push_word(&mut self, word: &str) {
		let capitalized = self.at_sentence_start();
		if !self.output.is_empty() && !self.output.ends_with('\n') {
			self.push_str(" ");
		}
		if capitalized {
			self.push_str(&capitalize(word));
		} else {
			self.push_str(word);
		}
		self.words += 1;
		self.stalled = 0;

		if ends_sentence(word) {
			self.boundaries = 1;
			self.sentences += 1;
			if self.sentences % 2 == 0 {
				self.push_str(PARAGRAPH_BREAK);
				self.sentences = 0;
			}
		} else {
			self.boundaries = 0;
		}
	}

	/// Crosses a boundary. Only the first of a run emits a line break.
	///
	/// Returns `true` if something was appended.
	fn push_boundary(&mut self) -> bool {
		let emitted = self.boundaries == 0 && !self.output.is_empty();
		if emitted {
			self.push_str(LINE_BREAK);
			self.sentences = 0;
			self.stalled = 0;
		}
		self.boundaries += 1;
		emitted
	}

	fn is_done(&self, criterion: StopCriterion) -> bool {
		criterion.is_met(self.words, self.chars) && self.boundaries >= 1
	}
}

impl ChainModel {
	/// Generates a passage by walking the chain.
	///
	/// # Parameters
	/// - `start`: first word, or a random key.
	/// - `criterion`: minimum number of words or characters.
	/// - `rng`: random source; a seeded one makes the output reproducible.
	///
	/// # Behavior
	/// - A word start is emitted first, capitalized. A boundary start emits
	///   nothing.
	/// - The walk continues while the limit is unmet or the current sentence
	///   is still open, so a started sentence is always finished.
	/// - A key missing from the table stalls the walk: nothing is appended.
	///   So does a silent boundary taken from a key with no word successor.
	///   After `stall_limit` consecutive stalls the walk ends with what it
	///   has. Repeated boundaries on a key that can still reach a word never
	///   count, so a model with words always reaches the limit.
	///
	/// # Returns
	/// The generated passage. It is empty for a degenerate model or an
	/// unknown start word.
	pub fn generate<R: Rng + ?Sized>(&self, start: &StartWord, criterion: StopCriterion, rng: &mut R) -> String {
		let mut cursor = Cursor::new();

		let mut key = match start {
			StartWord::Random => self.random_key(rng).cloned().unwrap_or(Token::Boundary),
			StartWord::Custom(word) => Token::key_of(word),
		};

		match (&key, start) {
			(Token::Boundary, _) => cursor.boundaries = 1,
			(Token::Word(_), StartWord::Custom(word)) if self.state(&key).is_some() => cursor.push_word(word),
			(Token::Word(normalized), StartWord::Random) => cursor.push_word(normalized),
			_ => trace!("Start word {key} is not in the model"),
		}

		while !cursor.is_done(criterion) {
			if cursor.stalled >= self.stall_limit() {
				trace!("Walk stalled on {key} after {} words", cursor.words);
				break;
			}

			let Some(state) = self.state(&key) else {
				cursor.stalled += 1;
				continue;
			};
			let Some(next) = state.predict(rng) else {
				cursor.stalled += 1;
				continue;
			};

			match next {
				Token::Boundary => {
					if !cursor.push_boundary() && !state.leads_to_word() {
						cursor.stalled += 1;
					}
				}
				Token::Word(word) => cursor.push_word(word),
			}
			key = next.key();
		}

		cursor.output
	}
}
