use std::sync::Arc;

use super::ngram_model::NGramModel;
use super::sampler::{GeneratedSentence, Sampler};
use super::tokenizer::tokenize;
use crate::config::{CorpusConfig, GenerationConfig};
use crate::corpus::Corpus;
use crate::corpus::builder::CorpusBuilder;
use crate::corpus::cache::SourceCache;
use crate::error::Result;
use crate::source::{SourceKey, TextSource, TextUnit};

/// High-level entry point: builds corpora from a cached text source.
///
/// # Responsibilities
/// - Own the process-wide [`SourceCache`] (one per `Generator`)
/// - Merge two sources into a [`Corpus`]
/// - Pass uncached fetches and key checks through to the source
///
/// Sentence generation itself is request-scoped, see [`get_random_sentence`].
pub struct Generator<S> {
	builder: CorpusBuilder<S>,
}

impl<S> Clone for Generator<S> {
	fn clone(&self) -> Self {
		Self { builder: self.builder.clone() }
	}
}

impl<S: TextSource> Generator<S> {
	/// Creates a generator with a fresh cache over `source`.
	///
	/// # Errors
	/// Returns `InvalidConfiguration` if `config` is invalid.
	pub fn new(source: S, config: &CorpusConfig) -> Result<Self> {
		let cache = SourceCache::new(source).with_fetch_timeout(config.fetch_timeout());
		Self::with_cache(Arc::new(cache), config)
	}

	/// Creates a generator over an existing cache.
	pub fn with_cache(cache: Arc<SourceCache<S>>, config: &CorpusConfig) -> Result<Self> {
		Ok(Self { builder: CorpusBuilder::new(cache, config)? })
	}

	pub fn cache(&self) -> &SourceCache<S> {
		self.builder.cache()
	}

	/// Corpus of `key1` followed by `key2`, through the cache.
	///
	/// `max_units` defaults to the configured value.
	pub async fn get_corpus(&self, key1: &SourceKey, key2: &SourceKey, max_units: Option<usize>) -> Result<Corpus> {
		self.builder.build(key1, key2, max_units).await
	}

	/// Fetches units straight from the source, bypassing the cache.
	pub async fn fetch_units(&self, key: &SourceKey, count: usize) -> Result<Vec<TextUnit>> {
		self.cache().source().fetch_units(key, count).await
	}

	/// Checks that the source knows `key`.
	pub async fn verify(&self, key: &SourceKey) -> Result<()> {
		self.cache().source().verify(key).await
	}
}

/// Tokenizes `corpus`, builds its model and samples `word_count` tokens.
///
/// # Errors
/// - `InvalidConfiguration` if `config` is invalid or `word_count` is 0
/// - `EmptyCorpus`, `InsufficientData` or `EmptyModel` if the corpus is too
///   small for `config.ngram_length`
pub fn generate_sentence(corpus: &Corpus, config: &GenerationConfig, word_count: usize) -> Result<GeneratedSentence> {
	config.validate()?;
	let tokens = tokenize(corpus, config.strip_punctuation)?;
	let model = NGramModel::build(&tokens, config.ngram_length)?;
	Sampler::from_seed(config.seed).generate(&model, word_count)
}

/// [`generate_sentence`] rendered as text.
pub fn get_random_sentence(corpus: &Corpus, config: &GenerationConfig, word_count: usize) -> Result<String> {
	generate_sentence(corpus, config, word_count).map(|sentence| sentence.to_string())
}
