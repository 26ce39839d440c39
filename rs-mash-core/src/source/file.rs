use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use super::{SourceKey, TextSource, TextUnit};
use crate::error::{MashError, Result};
use crate::io::{get_filename, list_files, normalize_folder, read_lines};

const EXTENSION: &str = "txt";

/// Text source backed by a directory of `<key>.txt` files.
///
/// Each non-blank line of a file is one unit. A fetch of `count` units
/// returns the first `count` lines.
#[derive(Debug, Clone)]
pub struct FileSource {
	dir: PathBuf,
}

impl FileSource {
	/// Creates a source reading from `dir`. `"."` resolves to the working directory.
	pub fn new<P: AsRef<Path>>(dir: P) -> Self {
		Self { dir: normalize_folder(dir) }
	}

	/// Lists the keys of every `.txt` file in the directory, sorted.
	pub fn available_keys(&self) -> Result<Vec<String>> {
		let files = list_files(&self.dir, EXTENSION).map_err(|e| MashError::unavailable(self.dir.display(), e))?;
		Ok(files.iter().filter_map(|file| get_filename(file).ok()).collect())
	}

	fn path_for(&self, key: &SourceKey) -> Result<PathBuf> {
		let name = key.as_str();
		// Keys map to file names, never to paths.
		if name.contains(['/', '\\']) || name.starts_with('.') {
			return Err(MashError::SourceNotFound { key: key.to_string() });
		}
		Ok(self.dir.join(format!("{name}.{EXTENSION}")))
	}
}

impl TextSource for FileSource {
	async fn fetch_units(&self, key: &SourceKey, count: usize) -> Result<Vec<TextUnit>> {
		let path = self.path_for(key)?;
		debug!("reading {count} units for {key} from {}", path.display());

		let read = tokio::task::spawn_blocking(move || read_lines(path, count))
			.await
			.map_err(|e| MashError::unavailable(key, e))?;

		read.map_err(|e| match e.kind() {
			io::ErrorKind::NotFound => MashError::SourceNotFound { key: key.to_string() },
			_ => MashError::unavailable(key, e),
		})
	}

	async fn verify(&self, key: &SourceKey) -> Result<()> {
		let path = self.path_for(key)?;
		match tokio::fs::metadata(&path).await {
			Ok(meta) if meta.is_file() => Ok(()),
			Ok(_) => Err(MashError::SourceNotFound { key: key.to_string() }),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Err(MashError::SourceNotFound { key: key.to_string() }),
			Err(e) => Err(MashError::unavailable(key, e)),
		}
	}
}
