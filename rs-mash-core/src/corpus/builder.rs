use std::sync::Arc;

use log::debug;

use super::Corpus;
use super::cache::SourceCache;
use crate::config::{CorpusConfig, validate_max_units};
use crate::error::Result;
use crate::source::{SourceKey, TextSource};

/// Builds corpora from two sources through a shared [`SourceCache`].
pub struct CorpusBuilder<S> {
	cache: Arc<SourceCache<S>>,
	default_max_units: usize,
}

impl<S> Clone for CorpusBuilder<S> {
	fn clone(&self) -> Self {
		Self { cache: Arc::clone(&self.cache), default_max_units: self.default_max_units }
	}
}

impl<S: TextSource> CorpusBuilder<S> {
	/// # Errors
	/// Returns `InvalidConfiguration` if `config` is invalid.
	pub fn new(cache: Arc<SourceCache<S>>, config: &CorpusConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { cache, default_max_units: config.max_units })
	}

	pub fn cache(&self) -> &Arc<SourceCache<S>> {
		&self.cache
	}

	/// Fetches both sources concurrently and appends the second to the first.
	///
	/// `max_units` falls back to the configured default (10 unless changed).
	///
	/// # Errors
	/// - The first fetch failure, unchanged. No partial corpus is built.
	/// - `EmptyCorpus` if both sources returned nothing.
	/// - `InvalidConfiguration` if `max_units` is 0.
	pub async fn build(&self, key1: &SourceKey, key2: &SourceKey, max_units: Option<usize>) -> Result<Corpus> {
		let max_units = max_units.unwrap_or(self.default_max_units);
		validate_max_units(max_units)?;

		let (first, second) =
			futures::try_join!(self.cache.get_units(key1, max_units), self.cache.get_units(key2, max_units))?;

		debug!("corpus for {key1} + {key2}: {} + {} units", first.len(), second.len());
		Corpus::concat(&first, &second)
	}
}
