//! Reading manifest files from disk, or from somewhere else entirely.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

/// Why a file could not be read.
#[derive(Debug)]
pub enum FileError {
	NotFound,
	Other(std::io::Error),
}

impl fmt::Display for FileError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			FileError::NotFound => write!(f, "no such file or directory"),
			FileError::Other(e) => write!(f, "{}", e),
		}
	}
}

impl std::error::Error for FileError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			FileError::Other(e) => Some(e),
			FileError::NotFound => None,
		}
	}
}

/// The capability to read a file's bytes by path.
///
/// The parser goes through this for the top-level manifest and for every
/// `include` and `subninja`, so implementations must be usable from
/// recursive include contexts.
pub trait FileReader {
	fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileError>;
}

/// A [`FileReader`] for the real filesystem.
pub struct DiskFileReader;

impl FileReader for DiskFileReader {
	fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileError> {
		let mut bytes = Vec::new();
		File::open(path)
			.and_then(|f| BufReader::with_capacity(0x10000, f).read_to_end(&mut bytes))
			.map_err(|e| match e.kind() {
				ErrorKind::NotFound => FileError::NotFound,
				_ => FileError::Other(e),
			})?;
		Ok(bytes)
	}
}
