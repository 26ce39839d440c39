//! Corpus aggregation: the per-source cache and the two-source builder.

use serde::Serialize;

use crate::error::{MashError, Result};
use crate::source::TextUnit;

/// Single-flight, memoizing cache of fetched units.
pub mod cache;

/// Merges two cached sources into one [`Corpus`].
pub mod builder;

/// Ordered text units of two sources: all units of the first, then all
/// units of the second.
///
/// # Invariants
/// - Never empty
/// - Immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Corpus {
	data: Vec<TextUnit>,
}

impl Corpus {
	/// Wraps units into a corpus.
	///
	/// # Errors
	/// Returns `EmptyCorpus` if `data` is empty.
	pub fn new(data: Vec<TextUnit>) -> Result<Self> {
		if data.is_empty() {
			return Err(MashError::EmptyCorpus);
		}
		Ok(Self { data })
	}

	/// Appends `second` after `first`, keeping each side's order.
	pub(crate) fn concat(first: &[TextUnit], second: &[TextUnit]) -> Result<Self> {
		let mut data = Vec::with_capacity(first.len() + second.len());
		data.extend_from_slice(first);
		data.extend_from_slice(second);
		Self::new(data)
	}

	pub fn data(&self) -> &[TextUnit] {
		&self.data
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Joins the units with `separator`, e.g. `"</br>"` for an HTML listing.
	pub fn join(&self, separator: &str) -> String {
		self.data.join(separator)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn units(items: &[&str]) -> Vec<TextUnit> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn empty_corpus_is_rejected() {
		assert_eq!(Corpus::new(Vec::new()), Err(MashError::EmptyCorpus));
		assert_eq!(Corpus::concat(&[], &[]), Err(MashError::EmptyCorpus));
	}

	#[test]
	fn concat_keeps_source_order() {
		let corpus = Corpus::concat(&units(&["a1", "a2"]), &units(&["b1"])).unwrap();
		assert_eq!(corpus.data(), units(&["a1", "a2", "b1"]).as_slice());
		assert_eq!(corpus.join("</br>"), "a1</br>a2</br>b1");
	}

	#[test]
	fn one_empty_side_is_fine() {
		let corpus = Corpus::concat(&[], &units(&["b1"])).unwrap();
		assert_eq!(corpus.len(), 1);
	}
}
