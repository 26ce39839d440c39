//! Blends text from two sources and generates sentences in their style.
//!
//! This crate provides:
//! - Text sources (a directory of text files, a JSON endpoint)
//! - A single-flight, memoizing cache of fetched units
//! - A two-source corpus builder
//! - A word-level n-gram model with weighted random generation
//!
//! Typical use:
//! ```no_run
//! # async fn run() -> rs_mash_core::Result<()> {
//! use rs_mash_core::config::{CorpusConfig, GenerationConfig};
//! use rs_mash_core::model::generator::{Generator, get_random_sentence};
//! use rs_mash_core::source::{FileSource, SourceKey};
//!
//! let generator = Generator::new(FileSource::new("./data"), &CorpusConfig::default())?;
//! let corpus = generator
//! 	.get_corpus(&SourceKey::new("@alice")?, &SourceKey::new("@bob")?, None)
//! 	.await?;
//! println!("{}", get_random_sentence(&corpus, &GenerationConfig::default(), 20)?);
//! # Ok(())
//! # }
//! ```

/// Recognized options and their defaults.
pub mod config;

/// Corpus aggregation: cache and builder.
pub mod corpus;

/// Error type shared by the whole crate.
pub mod error;

/// Tokenizer, n-gram model, sampler and the high-level generator.
pub mod model;

/// Text source trait and its implementations.
pub mod source;

/// I/O utilities (line reading, directory listing).
///
/// Not exposed
pub(crate) mod io;

pub use error::{MashError, Result};
