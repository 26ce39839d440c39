use std::collections::BTreeMap;

use rand::Rng;

use super::tokenizer::Token;

/// Continuations observed after one context.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during learning
/// - Pick the next token using weighted random sampling
/// - Merge with the state of the same context from another partial model
///
/// ## Invariants
/// - Each transition count is strictly positive
/// - `total` is the sum of all transition counts
/// - Transitions iterate in token order, so sampling with a seeded RNG is
///   reproducible
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Outgoing transitions indexed by the next token.
	/// Example: { "cat" => 2, "dog" => 1 }
	transitions: BTreeMap<Token, u64>,
	total: u64,
}

impl State {
	/// Records one occurrence of `next`.
	pub(crate) fn add_transition(&mut self, next: &Token) {
		match self.transitions.get_mut(next) {
			Some(occurrence) => *occurrence += 1,
			None => {
				self.transitions.insert(next.clone(), 1);
			}
		}
		self.total += 1;
	}

	/// Picks a continuation with probability proportional to its count.
	///
	/// Draws `r` in `0..total` and walks the transitions in order,
	/// subtracting counts until `r` falls into a bucket.
	///
	/// Returns `None` if the state has no transitions.
	pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Token> {
		if self.total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..self.total);
		for (next, occurrence) in &self.transitions {
			if r < *occurrence {
				return Some(next);
			}
			r -= occurrence;
		}

		// Unreachable while `total` matches the transitions.
		self.transitions.keys().next_back()
	}

	/// Count recorded for `next`, `None` if it never followed this context.
	pub fn weight(&self, next: &Token) -> Option<u64> {
		self.transitions.get(next).copied()
	}

	/// Number of times the context was observed.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Number of distinct continuations.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Continuations and their counts, in token order.
	pub fn iter(&self) -> impl Iterator<Item = (&Token, u64)> {
		self.transitions.iter().map(|(token, occurrence)| (token, *occurrence))
	}

	/// Sums the counts of `other` into this state.
	///
	/// Used to combine partial models learnt in parallel.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (next, occurrence) in &other.transitions {
			*self.transitions.entry(next.clone()).or_insert(0) += *occurrence;
		}
		self.total += other.total;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn state(items: &[(&str, u64)]) -> State {
		let mut state = State::default();
		for (word, count) in items {
			for _ in 0..*count {
				state.add_transition(&Token::word(word));
			}
		}
		state
	}

	#[test]
	fn counts_and_total() {
		let state = state(&[("cat", 2), ("dog", 1)]);
		assert_eq!(state.weight(&Token::word("cat")), Some(2));
		assert_eq!(state.weight(&Token::word("dog")), Some(1));
		assert_eq!(state.weight(&Token::word("cow")), None);
		assert_eq!(state.total(), 3);
		assert_eq!(state.len(), 2);
	}

	#[test]
	fn empty_state_predicts_nothing() {
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(State::default().predict(&mut rng), None);
	}

	#[test]
	fn single_transition_is_always_chosen() {
		let state = state(&[("only", 5)]);
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..50 {
			assert_eq!(state.predict(&mut rng), Some(&Token::word("only")));
		}
	}

	#[test]
	fn sampling_follows_weights() {
		let state = state(&[("heavy", 9), ("light", 1)]);
		let mut rng = StdRng::seed_from_u64(42);
		let heavy = (0..10_000)
			.filter(|_| state.predict(&mut rng) == Some(&Token::word("heavy")))
			.count();
		assert!((8_500..9_500).contains(&heavy), "heavy picked {heavy} times");
	}

	#[test]
	fn merge_sums_counts() {
		let mut left = state(&[("a", 1), ("b", 2)]);
		left.merge(&state(&[("b", 3), ("c", 1)]));
		assert_eq!(left, state(&[("a", 1), ("b", 5), ("c", 1)]));
		assert_eq!(left.total(), 7);
	}
}
