//! Text sources feeding the corpus.
//!
//! A source answers "give me up to N text units for this key". The core only
//! depends on the [`TextSource`] trait; [`FileSource`] and [`HttpSource`] are
//! the two implementations shipped with the crate.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::config::SourceConfig;
use crate::error::{MashError, Result};

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

/// One piece of raw text (a post, a line, a message).
pub type TextUnit = String;

/// Identifier of a text source, usually a handle.
///
/// Surrounding whitespace and one leading `@` are dropped, so `"@alice"`
/// and `"alice"` name the same source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceKey(String);

impl SourceKey {
	pub fn new(raw: &str) -> Result<Self> {
		let trimmed = raw.trim();
		let name = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();
		if name.is_empty() {
			return Err(MashError::invalid(format!("empty source key {raw:?}")));
		}
		Ok(Self(name.to_owned()))
	}

	/// The key without its `@` prefix.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SourceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "@{}", self.0)
	}
}

impl TryFrom<String> for SourceKey {
	type Error = MashError;

	fn try_from(value: String) -> Result<Self> {
		Self::new(&value)
	}
}

impl From<SourceKey> for String {
	fn from(key: SourceKey) -> Self {
		key.0
	}
}

/// Asynchronous, fallible supplier of text units.
///
/// Implementations report a missing key as [`MashError::SourceNotFound`] and
/// every other failure as [`MashError::SourceUnavailable`]. Retrying is up to
/// the implementation; callers propagate failures unchanged.
pub trait TextSource: Send + Sync + 'static {
	/// Fetches up to `count` units for `key`, in source order.
	fn fetch_units(&self, key: &SourceKey, count: usize) -> impl Future<Output = Result<Vec<TextUnit>>> + Send;

	/// Succeeds if the source knows `key`.
	fn verify(&self, key: &SourceKey) -> impl Future<Output = Result<()>> + Send {
		async move { self.fetch_units(key, 1).await.map(|_| ()) }
	}
}

/// The source selected by a [`SourceConfig`].
#[derive(Debug, Clone)]
pub enum ConfiguredSource {
	File(FileSource),
	Http(HttpSource),
}

impl ConfiguredSource {
	pub fn from_config(config: &SourceConfig) -> Result<Self> {
		config.validate()?;
		match config {
			SourceConfig::File { dir } => Ok(Self::File(FileSource::new(dir))),
			SourceConfig::Http { base_url, timeout_secs } => {
				Ok(Self::Http(HttpSource::new(base_url, std::time::Duration::from_secs(*timeout_secs))?))
			}
		}
	}

	/// Keys this source can list up front. Only file sources can.
	pub fn available_keys(&self) -> Option<Result<Vec<String>>> {
		match self {
			Self::File(source) => Some(source.available_keys()),
			Self::Http(_) => None,
		}
	}
}

impl TextSource for ConfiguredSource {
	async fn fetch_units(&self, key: &SourceKey, count: usize) -> Result<Vec<TextUnit>> {
		match self {
			Self::File(source) => source.fetch_units(key, count).await,
			Self::Http(source) => source.fetch_units(key, count).await,
		}
	}

	async fn verify(&self, key: &SourceKey) -> Result<()> {
		match self {
			Self::File(source) => source.verify(key).await,
			Self::Http(source) => source.verify(key).await,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_are_normalized() {
		let a = SourceKey::new("@alice").unwrap();
		let b = SourceKey::new("  alice ").unwrap();
		assert_eq!(a, b);
		assert_eq!(a.as_str(), "alice");
		assert_eq!(a.to_string(), "@alice");
	}

	#[test]
	fn case_is_kept() {
		assert_ne!(SourceKey::new("Alice").unwrap(), SourceKey::new("alice").unwrap());
	}

	#[test]
	fn empty_keys_are_rejected() {
		assert!(SourceKey::new("").is_err());
		assert!(SourceKey::new(" @ ").is_err());
	}

	#[test]
	fn configured_file_source() {
		let source = ConfiguredSource::from_config(&SourceConfig::default()).unwrap();
		assert!(matches!(source, ConfiguredSource::File(_)));
	}
}
