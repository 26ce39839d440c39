use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::{MashError, Result};

/// Side a punctuation mark was glued to in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attach {
	/// Trailing mark, as in `"end."`.
	Previous,
	/// Leading mark, as in `"(aside"`.
	Next,
	/// A mark standing between spaces, as in `"a - b"`.
	Alone,
}

/// Unit of the token stream.
///
/// Identity is exact: `"The"` and `"the"` are different words, and a comma
/// glued to a word differs from a free-standing one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Token {
	Word(String),
	Punct { text: String, attach: Attach },
	/// Hard separator between two text units. Never produced by text itself.
	Boundary,
}

impl Token {
	pub fn word(text: &str) -> Self {
		Self::Word(text.to_owned())
	}

	/// Source text of the token. Empty for [`Token::Boundary`].
	pub fn text(&self) -> &str {
		match self {
			Self::Word(text) | Self::Punct { text, .. } => text,
			Self::Boundary => "",
		}
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.text())
	}
}

/// Marks peeled off the ends of words. `@` and `#` stay part of the word
/// so handles and tags survive.
fn is_punctuation(c: char) -> bool {
	(c.is_ascii_punctuation() && c != '@' && c != '#')
		|| matches!(c, '“' | '”' | '‘' | '’' | '…' | '–' | '—' | '«' | '»' | '¡' | '¿')
}

/// Splits one whitespace-delimited word into tokens.
fn push_word(word: &str, strip_punctuation: bool, tokens: &mut Vec<Token>) {
	let core_start = word.find(|c: char| !is_punctuation(c));
	let Some(core_start) = core_start else {
		// Punctuation only
		if !strip_punctuation {
			tokens.push(Token::Punct { text: word.to_owned(), attach: Attach::Alone });
		}
		return;
	};
	// A non-punctuation char exists, so rfind succeeds.
	let core_end = word
		.rfind(|c: char| !is_punctuation(c))
		.map(|i| i + word[i..].chars().next().map_or(1, char::len_utf8))
		.unwrap_or(word.len());

	let (leading, rest) = word.split_at(core_start);
	let (core, trailing) = rest.split_at(core_end - core_start);

	if !strip_punctuation && !leading.is_empty() {
		tokens.push(Token::Punct { text: leading.to_owned(), attach: Attach::Next });
	}
	tokens.push(Token::word(core));
	if !strip_punctuation && !trailing.is_empty() {
		tokens.push(Token::Punct { text: trailing.to_owned(), attach: Attach::Previous });
	}
}

/// Tokenizes the units of `corpus`.
///
/// Words are split on whitespace. Punctuation at the ends of words is
/// dropped when `strip_punctuation` is set, or kept as its own token
/// otherwise. Inner punctuation (`don't`, `3.5`) stays in the word. Case is
/// preserved. Consecutive units are separated by one [`Token::Boundary`].
///
/// # Errors
/// Returns `EmptyCorpus` if no unit yields a token (all blank, or only
/// punctuation while stripping).
pub fn tokenize(corpus: &Corpus, strip_punctuation: bool) -> Result<Vec<Token>> {
	let mut tokens = Vec::new();
	let mut unit_tokens = Vec::new();

	for unit in corpus.data() {
		unit_tokens.clear();
		for word in unit.split_whitespace() {
			push_word(word, strip_punctuation, &mut unit_tokens);
		}
		if unit_tokens.is_empty() {
			continue;
		}
		if !tokens.is_empty() {
			tokens.push(Token::Boundary);
		}
		tokens.append(&mut unit_tokens);
	}

	if tokens.is_empty() {
		return Err(MashError::EmptyCorpus);
	}
	Ok(tokens)
}

/// Joins tokens back into text.
///
/// Tokens are separated by single spaces, except that attached punctuation
/// sits against its word. A boundary always leaves a space.
pub fn detokenize(tokens: &[Token]) -> String {
	let mut out = String::new();
	let mut space = false;
	let mut boundary = false;

	for token in tokens {
		match token {
			Token::Boundary => {
				boundary = true;
				continue;
			}
			Token::Punct { attach: Attach::Previous, .. } if !boundary => {}
			_ => {
				if (space || boundary) && !out.is_empty() {
					out.push(' ');
				}
			}
		}
		out.push_str(token.text());
		space = !matches!(token, Token::Punct { attach: Attach::Next, .. });
		boundary = false;
	}

	out
}
