//! Sentence generation over a corpus.
//!
//! This module provides the word-level n-gram pipeline, including:
//! - Tokenization of a corpus (`tokenize`, `Token`)
//! - Fixed-order n-gram models (`NGramModel`)
//! - Internal continuation counts (`State`)
//! - Weighted random walks (`Sampler`)
//! - A high-level interface (`Generator`, `get_random_sentence`)

/// High-level interface: cached corpora and one-call sentence generation.
pub mod generator;

/// Fixed-order n-gram model (`n >= 2`).
///
/// Handles window counting, context lookup and model merging.
pub mod ngram_model;

/// Weighted random walk producing a fixed number of tokens.
pub mod sampler;

/// Continuation counts of one context.
///
/// Tracks outgoing transitions and supports weighted random sampling.
pub mod state;

/// Splits corpus units into tokens and joins tokens back into text.
pub mod tokenizer;
