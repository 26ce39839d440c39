use std::fmt;

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::ngram_model::NGramModel;
use super::tokenizer::{Token, detokenize};
use crate::error::{MashError, Result};

/// Tokens produced by one walk over a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSentence {
	tokens: Vec<Token>,
}

impl GeneratedSentence {
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

impl fmt::Display for GeneratedSentence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&detokenize(&self.tokens))
	}
}

/// Weighted random walk over an [`NGramModel`].
///
/// The walk starts from a context picked uniformly among all known
/// contexts, then repeatedly samples a continuation of its trailing `n-1`
/// tokens. A trailing context with no continuation is a dead end: the walk
/// re-seeds from a fresh random context and keeps going.
#[derive(Debug, Clone)]
pub struct Sampler {
	rng: StdRng,
}

impl Sampler {
	/// Sampler seeded from the thread RNG. Output differs run to run.
	pub fn new() -> Self {
		Self { rng: StdRng::from_rng(&mut rand::rng()) }
	}

	/// Sampler with a fixed seed, for reproducible output.
	pub fn seeded(seed: u64) -> Self {
		Self { rng: StdRng::seed_from_u64(seed) }
	}

	pub fn from_seed(seed: Option<u64>) -> Self {
		seed.map_or_else(Self::new, Self::seeded)
	}

	/// Generates exactly `target_token_count` tokens.
	///
	/// A start or re-seed context longer than the remaining budget is cut
	/// short, so the count is exact even when it is below `n-1`.
	///
	/// # Errors
	/// - `EmptyModel` if the model has no contexts
	/// - `InvalidConfiguration` if `target_token_count` is 0
	pub fn generate(&mut self, model: &NGramModel, target_token_count: usize) -> Result<GeneratedSentence> {
		if model.is_empty() {
			return Err(MashError::EmptyModel);
		}
		if target_token_count == 0 {
			return Err(MashError::invalid("target token count must be >= 1"));
		}

		let context_len = model.n() - 1;
		let mut tokens = Vec::new();
		let mut reseeds = 0usize;
		self.seed_walk(model, &mut tokens, target_token_count)?;

		while tokens.len() < target_token_count {
			let context = &tokens[tokens.len() - context_len..];
			let next = model
				.continuations(context)
				.and_then(|state| state.predict(&mut self.rng))
				.cloned();

			match next {
				Some(token) => tokens.push(token),
				None => {
					// Dead end
					reseeds += 1;
					self.seed_walk(model, &mut tokens, target_token_count)?;
				}
			}
		}

		debug!("generated {} tokens with {} re-seeds", tokens.len(), reseeds);
		Ok(GeneratedSentence { tokens })
	}

	/// Appends a random context, cut to the remaining budget.
	fn seed_walk(&mut self, model: &NGramModel, tokens: &mut Vec<Token>, target: usize) -> Result<()> {
		let context = model.random_context(&mut self.rng).ok_or(MashError::EmptyModel)?;
		let remaining = target - tokens.len();
		tokens.extend(context.iter().take(remaining).cloned());
		Ok(())
	}
}

impl Default for Sampler {
	fn default() -> Self {
		Self::new()
	}
}
