use rand::Rng;
use rand::seq::IndexedRandom;

use super::token::Token;

/// Everything observed after one key of the chain.
///
/// A `State` stores every token that followed a normalized key in the
/// corpus, in corpus order. The key itself is the map entry owning it.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by how many times they appear in `successors`.
///
/// ## Invariants
/// - Duplicates are kept: repetition is the frequency
/// - `word_successors` counts the word entries of `successors`
#[derive(Clone, Debug, Default)]
pub struct State {
	/// Observed successors, literal, duplicates preserved.
	/// Example: `a` => [b, c., b, c.]
	successors: Vec<Token>,
	word_successors: usize,
}

impl State {
	/// Creates a new state with no successor.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `next` after this key.
	pub fn add_successor(&mut self, next: Token) {
		if !next.is_boundary() {
			self.word_successors += 1;
		}
		self.successors.push(next);
	}

	/// Picks the next token uniformly among the recorded occurrences.
	///
	/// Returns `None` if the state has no successor.
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Token> {
		self.successors.choose(rng)
	}

	/// Returns `true` if at least one successor is a word, i.e. a walk
	/// leaving this key can eventually append something.
	pub fn leads_to_word(&self) -> bool {
		self.word_successors > 0
	}

	pub fn successors(&self) -> &[Token] {
		&self.successors
	}
}
