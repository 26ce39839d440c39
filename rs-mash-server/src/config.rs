use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use rs_mash_core::config::{CorpusConfig, GenerationConfig, SourceConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "RS_MASH_CONFIG";
/// File read from the working directory when the variable is not set.
pub const DEFAULT_CONFIG_FILE: &str = "rs-mash.toml";

/// Defaults of the `/api/mash` route.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MashConfig {
	/// Units fetched per source for a mash.
	pub max_units: usize,
	/// Tokens per generated sentence.
	pub word_count: usize,
	/// Largest `word_count` a request may ask for.
	pub max_word_count: usize,
	pub generation: GenerationConfig,
}

impl Default for MashConfig {
	fn default() -> Self {
		Self { max_units: 3200, word_count: 50, max_word_count: 1000, generation: GenerationConfig::default() }
	}
}

/// Server configuration, read from TOML.
///
/// ```toml
/// port = 5000
///
/// [source]
/// kind = "file"
/// dir = "./data"
///
/// [corpus]
/// max_units = 10
/// fetch_timeout_secs = 10
///
/// [mash]
/// word_count = 50
/// max_word_count = 1000
/// generation = { ngram_length = 3, strip_punctuation = true }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	pub source: SourceConfig,
	pub corpus: CorpusConfig,
	pub mash: MashConfig,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			source: SourceConfig::default(),
			corpus: CorpusConfig::default(),
			mash: MashConfig::default(),
		}
	}
}

impl ServerConfig {
	/// Loads the file named by `RS_MASH_CONFIG`, else `rs-mash.toml` if
	/// present, else the defaults.
	pub fn load() -> io::Result<Self> {
		let path = match env::var_os(CONFIG_ENV) {
			Some(path) => Some(PathBuf::from(path)),
			None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.is_file()),
		};
		match path {
			Some(path) => Self::from_file(&path),
			None => Ok(Self::default()),
		}
	}

	pub fn from_file(path: &Path) -> io::Result<Self> {
		let contents = fs::read_to_string(path)?;
		Self::parse(&contents)
			.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{}: {e}", path.display())))
	}

	fn parse(contents: &str) -> Result<Self, String> {
		let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), String> {
		self.source.validate().map_err(|e| e.to_string())?;
		self.corpus.validate().map_err(|e| e.to_string())?;
		self.mash.generation.validate().map_err(|e| e.to_string())?;
		if self.mash.max_units == 0 || self.mash.word_count == 0 {
			return Err("mash.max_units and mash.word_count must be >= 1".to_owned());
		}
		if self.mash.word_count > self.mash.max_word_count {
			return Err("mash.word_count must be <= mash.max_word_count".to_owned());
		}
		Ok(())
	}
}
