use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MashError, Result};

/// Default values for every recognized option.
pub mod defaults {
	/// Window size N of the n-gram model.
	pub const DEFAULT_NGRAM_LENGTH: usize = 3;
	pub const MIN_NGRAM_LENGTH: usize = 2;
	pub const DEFAULT_STRIP_PUNCTUATION: bool = true;
	/// Units fetched per source when the caller does not say.
	pub const DEFAULT_MAX_UNITS: usize = 10;
	pub const DEFAULT_SOURCE_DIR: &str = "./data";
	pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
}

/// Options of a single sentence generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
	/// Window size N. Larger values give more coherent but less novel output,
	/// and need more source tokens.
	pub ngram_length: usize,
	/// Drop punctuation instead of modelling it as tokens.
	pub strip_punctuation: bool,
	/// Fixed RNG seed for reproducible output. `None` draws a fresh seed.
	pub seed: Option<u64>,
}

impl Default for GenerationConfig {
	fn default() -> Self {
		Self {
			ngram_length: defaults::DEFAULT_NGRAM_LENGTH,
			strip_punctuation: defaults::DEFAULT_STRIP_PUNCTUATION,
			seed: None,
		}
	}
}

impl GenerationConfig {
	pub fn validate(&self) -> Result<()> {
		if self.ngram_length < defaults::MIN_NGRAM_LENGTH {
			return Err(MashError::invalid(format!(
				"ngram_length must be >= {}, got {}",
				defaults::MIN_NGRAM_LENGTH,
				self.ngram_length
			)));
		}
		Ok(())
	}
}

/// Options of corpus construction and source fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
	/// Units requested per source when a call does not specify a count.
	pub max_units: usize,
	/// Per-fetch timeout. An expired fetch counts as a failed one.
	pub fetch_timeout_secs: Option<u64>,
}

impl Default for CorpusConfig {
	fn default() -> Self {
		Self { max_units: defaults::DEFAULT_MAX_UNITS, fetch_timeout_secs: None }
	}
}

impl CorpusConfig {
	pub fn validate(&self) -> Result<()> {
		validate_max_units(self.max_units)?;
		if self.fetch_timeout_secs == Some(0) {
			return Err(MashError::invalid("fetch_timeout_secs must be >= 1"));
		}
		Ok(())
	}

	pub fn fetch_timeout(&self) -> Option<Duration> {
		self.fetch_timeout_secs.map(Duration::from_secs)
	}
}

pub(crate) fn validate_max_units(max_units: usize) -> Result<()> {
	if max_units == 0 {
		return Err(MashError::invalid("max_units must be >= 1"));
	}
	Ok(())
}

/// Which text source backs the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
	/// A directory of `<key>.txt` files, one unit per line.
	File {
		#[serde(default = "default_source_dir")]
		dir: PathBuf,
	},
	/// A JSON endpoint answering `GET {base_url}/{key}?count=N`.
	Http {
		base_url: String,
		#[serde(default = "default_http_timeout")]
		timeout_secs: u64,
	},
}

impl Default for SourceConfig {
	fn default() -> Self {
		Self::File { dir: default_source_dir() }
	}
}

impl SourceConfig {
	pub fn validate(&self) -> Result<()> {
		match self {
			Self::File { dir } if dir.as_os_str().is_empty() => {
				Err(MashError::invalid("source dir must not be empty"))
			}
			Self::Http { base_url, .. } if !base_url.starts_with("http://") && !base_url.starts_with("https://") => {
				Err(MashError::invalid(format!("base_url must be an http(s) URL, got {base_url:?}")))
			}
			Self::Http { timeout_secs: 0, .. } => Err(MashError::invalid("timeout_secs must be >= 1")),
			_ => Ok(()),
		}
	}
}

fn default_source_dir() -> PathBuf {
	PathBuf::from(defaults::DEFAULT_SOURCE_DIR)
}

fn default_http_timeout() -> u64 {
	defaults::DEFAULT_HTTP_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid() {
		assert!(GenerationConfig::default().validate().is_ok());
		assert!(CorpusConfig::default().validate().is_ok());
		assert!(SourceConfig::default().validate().is_ok());
		assert_eq!(GenerationConfig::default().ngram_length, 3);
		assert_eq!(CorpusConfig::default().max_units, 10);
	}

	#[test]
	fn ngram_length_below_two_is_rejected() {
		let config = GenerationConfig { ngram_length: 1, ..Default::default() };
		assert!(matches!(config.validate(), Err(MashError::InvalidConfiguration { .. })));
	}

	#[test]
	fn zero_units_and_zero_timeout_are_rejected() {
		let config = CorpusConfig { max_units: 0, ..Default::default() };
		assert!(config.validate().is_err());
		let config = CorpusConfig { fetch_timeout_secs: Some(0), ..Default::default() };
		assert!(config.validate().is_err());
	}

	#[test]
	fn http_source_needs_url() {
		let config = SourceConfig::Http { base_url: "localhost:8080".into(), timeout_secs: 5 };
		assert!(config.validate().is_err());
		let config = SourceConfig::Http { base_url: "http://localhost:8080".into(), timeout_secs: 5 };
		assert!(config.validate().is_ok());
	}
}
