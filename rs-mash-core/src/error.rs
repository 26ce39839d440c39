/// Errors raised by the corpus and generation pipeline.
///
/// The enum is `Clone` because a single fetch failure is shared by every
/// caller waiting on the same in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MashError {
	#[error("source {key} is unavailable: {reason}")]
	SourceUnavailable { key: String, reason: String },

	#[error("source {key} does not exist")]
	SourceNotFound { key: String },

	#[error("corpus is empty")]
	EmptyCorpus,

	#[error("not enough data: {tokens} tokens, need at least {n}")]
	InsufficientData { tokens: usize, n: usize },

	#[error("model has no contexts")]
	EmptyModel,

	#[error("invalid configuration: {reason}")]
	InvalidConfiguration { reason: String },
}

impl MashError {
	pub(crate) fn invalid(reason: impl Into<String>) -> Self {
		Self::InvalidConfiguration { reason: reason.into() }
	}

	pub(crate) fn unavailable(key: impl ToString, reason: impl ToString) -> Self {
		Self::SourceUnavailable { key: key.to_string(), reason: reason.to_string() }
	}

	/// True for the failures that mean the corpus is too small or empty
	/// for the requested configuration.
	pub fn is_data_error(&self) -> bool {
		matches!(self, Self::EmptyCorpus | Self::InsufficientData { .. } | Self::EmptyModel)
	}
}

pub type Result<T> = std::result::Result<T, MashError>;
