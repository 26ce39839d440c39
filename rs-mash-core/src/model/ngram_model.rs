use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use log::debug;
use rand::Rng;
use rand::seq::IteratorRandom;

use super::state::State;
use super::tokenizer::Token;
use crate::config::defaults::MIN_NGRAM_LENGTH;
use crate::error::{MashError, Result};

/// Window of `n - 1` consecutive tokens, the lookup key of the model.
pub type NGramContext = Vec<Token>;

/// Below this many windows the model is built on the calling thread.
const PARALLEL_MIN_WINDOWS: usize = 20_000;

/// Represents an n-gram model over a token stream.
///
/// The `NGramModel` stores one [`State`] per context of length `n-1` and
/// lets the sampler pick a continuation for any known context.
///
/// # Responsibilities
/// - Count every `(context, next token)` window of a token stream
/// - Expose the known contexts and their continuation distributions
/// - Merge with another n-gram model of the same order `n`
///
/// # Invariants
/// - `n` is always >= 2
/// - Each context in `states` has exactly `n-1` tokens
/// - Every state has at least one transition, all counts >= 1
/// - Contexts are kept ordered, so two builds over the same tokens are equal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NGramModel {
	/// The order of the model (number of tokens in the n-gram)
	n: usize,

	/// Mapping from a context (length n-1) to its continuations
	states: BTreeMap<NGramContext, State>,
}

impl NGramModel {
	/// Builds the model of order `n` from a token stream.
	///
	/// Slides a window of `n` tokens with stride 1: the first `n-1` tokens
	/// are the context, the last one is counted as its continuation.
	/// Long streams are split across worker threads and merged.
	///
	/// # Errors
	/// - `InvalidConfiguration` if `n < 2`
	/// - `InsufficientData` if there are fewer than `n` tokens
	pub fn build(tokens: &[Token], n: usize) -> Result<Self> {
		Self::check(tokens, n)?;

		let windows = tokens.len() - n + 1;
		let cpus = num_cpus::get();
		let model = if windows >= PARALLEL_MIN_WINDOWS && cpus > 1 {
			Self::build_in_chunks(tokens, n, cpus)?
		} else {
			let mut model = Self::empty(n);
			model.add_windows(tokens);
			model
		};

		debug!("built {}-gram model: {} tokens, {} contexts", n, tokens.len(), model.context_count());
		Ok(model)
	}

	/// Builds partial models over `chunks` overlapping slices on scoped
	/// threads and merges them.
	///
	/// Each window belongs to exactly one chunk, so the result equals the
	/// sequential build.
	pub(crate) fn build_in_chunks(tokens: &[Token], n: usize, chunks: usize) -> Result<Self> {
		Self::check(tokens, n)?;

		let windows = tokens.len() - n + 1;
		let chunk_size = windows.div_ceil(chunks.max(1));

		let (tx, rx) = mpsc::channel();
		let model = thread::scope(|scope| {
			for start in (0..windows).step_by(chunk_size) {
				let end = (start + chunk_size).min(windows);
				// Windows start..end need tokens up to end + n - 1
				let slice = &tokens[start..end + n - 1];
				let tx = tx.clone();

				scope.spawn(move || {
					let mut partial_model = NGramModel::empty(n);
					partial_model.add_windows(slice);
					// The receiver outlives every sender
					let _ = tx.send(partial_model);
				});
			}
			drop(tx);

			let mut final_model = NGramModel::empty(n);
			for partial_model in rx.iter() {
				final_model.merge_states(&partial_model);
			}
			final_model
		});

		Ok(model)
	}

	fn check(tokens: &[Token], n: usize) -> Result<()> {
		if n < MIN_NGRAM_LENGTH {
			return Err(MashError::invalid(format!("n must be >= {MIN_NGRAM_LENGTH}, got {n}")));
		}
		if tokens.len() < n {
			return Err(MashError::InsufficientData { tokens: tokens.len(), n });
		}
		Ok(())
	}

	pub(crate) fn empty(n: usize) -> Self {
		Self { n, states: BTreeMap::new() }
	}

	/// Counts every window of `tokens`.
	fn add_windows(&mut self, tokens: &[Token]) {
		for window in tokens.windows(self.n) {
			let (context, next) = window.split_at(self.n - 1);
			let next = &next[0];
			match self.states.get_mut(context) {
				Some(state) => state.add_transition(next),
				None => {
					let mut state = State::default();
					state.add_transition(next);
					self.states.insert(context.to_vec(), state);
				}
			}
		}
	}

	/// The order `n` of the model.
	pub fn n(&self) -> usize {
		self.n
	}

	/// Number of distinct contexts.
	pub fn context_count(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Every known context, in order.
	pub fn contexts(&self) -> impl Iterator<Item = &[Token]> {
		self.states.keys().map(Vec::as_slice)
	}

	/// Continuations of `context`.
	///
	/// `None` means the context never occurred. A returned state is never
	/// empty.
	pub fn continuations(&self, context: &[Token]) -> Option<&State> {
		self.states.get(context)
	}

	/// Picks a context uniformly at random.
	///
	/// Returns `None` if the model has no contexts.
	pub fn random_context<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&[Token]> {
		self.contexts().choose(rng)
	}

	/// Merges another n-gram model into this one.
	///
	/// Occurrence counts of matching contexts and continuations are summed.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if the model orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.n != other.n {
			return Err(MashError::invalid(format!("n mismatch: {} and {}", self.n, other.n)));
		}
		self.merge_states(other);
		Ok(())
	}

	fn merge_states(&mut self, other: &Self) {
		for (context, state) in &other.states {
			if let Some(existing) = self.states.get_mut(context) {
				existing.merge(state);
			} else {
				self.states.insert(context.clone(), state.clone());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(text: &str) -> Vec<Token> {
		text.split_whitespace().map(Token::word).collect()
	}

	#[test]
	fn counts_windows() {
		let model = NGramModel::build(&words("a b a b a c"), 2).unwrap();
		let a = model.continuations(&[Token::word("a")]).unwrap();
		assert_eq!(a.weight(&Token::word("b")), Some(2));
		assert_eq!(a.weight(&Token::word("c")), Some(1));
		assert_eq!(a.total(), 3);
		assert_eq!(model.context_count(), 2);
	}

	#[test]
	fn trigram_contexts_have_two_tokens() {
		let model = NGramModel::build(&words("x y z x y w"), 3).unwrap();
		assert!(model.contexts().all(|context| context.len() == 2));
		let xy = model.continuations(&words("x y")).unwrap();
		assert_eq!(xy.total(), 2);
		assert_eq!(model.continuations(&words("y w")), None);
	}

	#[test]
	fn unknown_context_has_no_continuation() {
		let model = NGramModel::build(&words("a b"), 2).unwrap();
		assert!(model.continuations(&[Token::word("b")]).is_none());
		assert!(model.continuations(&[Token::word("zzz")]).is_none());
	}

	#[test]
	fn too_few_tokens() {
		assert_eq!(
			NGramModel::build(&words("one two three"), 5),
			Err(MashError::InsufficientData { tokens: 3, n: 5 })
		);
		assert!(NGramModel::build(&words("one two three"), 3).is_ok());
	}

	#[test]
	fn n_below_two_is_invalid() {
		assert!(matches!(
			NGramModel::build(&words("a b c"), 1),
			Err(MashError::InvalidConfiguration { .. })
		));
	}

	#[test]
	fn chunked_build_matches_sequential() {
		let tokens: Vec<Token> = (0..5_000).map(|i| Token::Word(format!("w{}", (i * 7) % 13))).collect();
		for n in 2..=4 {
			let sequential = NGramModel::build(&tokens, n).unwrap();
			for chunks in [1, 3, 8, 64] {
				assert_eq!(NGramModel::build_in_chunks(&tokens, n, chunks).unwrap(), sequential);
			}
		}
	}

	#[test]
	fn chunked_build_with_more_chunks_than_windows() {
		let tokens = words("a b c d");
		let sequential = NGramModel::build(&tokens, 3).unwrap();
		assert_eq!(NGramModel::build_in_chunks(&tokens, 3, 16).unwrap(), sequential);
	}

	#[test]
	fn merge_sums_and_checks_order() {
		let mut left = NGramModel::build(&words("a b a"), 2).unwrap();
		let right = NGramModel::build(&words("a b c"), 2).unwrap();
		left.merge(&right).unwrap();
		assert_eq!(left.continuations(&[Token::word("a")]).unwrap().weight(&Token::word("b")), Some(2));
		assert_eq!(left.continuations(&[Token::word("b")]).unwrap().total(), 2);

		let trigram = NGramModel::build(&words("a b c"), 3).unwrap();
		assert!(left.merge(&trigram).is_err());
	}
}
