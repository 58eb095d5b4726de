//! Errors at a specific place in a file.

use raw_string::{RawStr, RawString};
use std::error::Error;
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

/// A place in a file: where something went wrong.
///
/// All fields are optional, in case they are not known.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Location<'a> {
	pub file: Option<&'a Path>,
	pub line: Option<NonZeroU32>,
	pub column: Option<u32>,
}

impl Location<'static> {
	/// A [`Location`] with no location information.
	pub const UNKNOWN: Self = Location {
		file: None,
		line: None,
		column: None,
	};
}

/// An error which happened at a specific place in some file.
///
/// Use [`at`][AddLocationToError::at] on an [`Error`], or
/// [`err_at`][AddLocationToResult::err_at] on a [`Result`] to make one.
#[derive(Debug)]
pub struct ErrorWithLocation<T> {
	pub file: Option<PathBuf>,
	pub line: Option<NonZeroU32>,
	pub column: Option<u32>,
	/// The source line the error points into, for the `^ near here` snippet.
	pub context: Option<RawString>,
	pub error: T,
}

impl<'a> Location<'a> {
	/// Create an error carrying this location.
	pub fn error<E>(&self, error: E) -> ErrorWithLocation<E> {
		ErrorWithLocation {
			file: self.file.map(Path::to_path_buf),
			line: self.line,
			column: self.column,
			context: None,
			error,
		}
	}
}

impl<A> ErrorWithLocation<A> {
	/// Convert one error type to another, while keeping the location
	/// information.
	pub fn convert<B: From<A>>(self) -> ErrorWithLocation<B> {
		ErrorWithLocation {
			file: self.file,
			line: self.line,
			column: self.column,
			context: self.context,
			error: From::from(self.error),
		}
	}

	/// Get the location at which the error occurred.
	pub fn location(&self) -> Location {
		Location {
			file: self.file.as_ref().map(PathBuf::as_path),
			line: self.line,
			column: self.column,
		}
	}
}

/// Extension trait: Adds [`err_at()`][Self::err_at] to [`Result`].
pub trait AddLocationToResult {
	type WithLocation;
	/// Add location information to the error.
	fn err_at(self, location: Location) -> Self::WithLocation;
}

/// Extension trait: Adds [`at()`][Self::at] to any [`Error`].
pub trait AddLocationToError {
	type WithLocation;
	/// Add location information to the error.
	fn at(self, location: Location) -> Self::WithLocation;
}

impl<T, E> AddLocationToResult for Result<T, E> {
	type WithLocation = Result<T, ErrorWithLocation<E>>;
	fn err_at(self, location: Location) -> Self::WithLocation {
		self.map_err(|e| location.error(e))
	}
}

impl<E: Error> AddLocationToError for E {
	type WithLocation = ErrorWithLocation<E>;
	fn at(self, location: Location) -> Self::WithLocation {
		location.error(self)
	}
}

impl<'a> fmt::Display for Location<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		if let Some(file) = self.file {
			write!(f, "{}", file.display())?;
		}
		if let Some(line) = self.line {
			write!(f, ":{}", line)?;
		}
		if let Some(column) = self.column {
			write!(f, ":{}", column)?;
		}
		Ok(())
	}
}

/// How much of the offending line the snippet shows.
const TRUNCATE_COLUMN: usize = 72;

impl<T: fmt::Display> fmt::Display for ErrorWithLocation<T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		if self.location() != Location::UNKNOWN {
			write!(f, "{}: ", self.location())?;
		}
		write!(f, "{}", self.error)?;
		if let (Some(context), Some(column)) = (&self.context, self.column) {
			let column = column as usize - 1;
			if column < TRUNCATE_COLUMN {
				let mut line: &RawStr = context;
				let truncated = line.len() > TRUNCATE_COLUMN;
				if truncated {
					line = &line[..TRUNCATE_COLUMN];
				}
				write!(f, "\n{}{}", line, if truncated { "..." } else { "" })?;
				write!(f, "\n{:width$}^ near here", "", width = column)?;
			}
		}
		Ok(())
	}
}

impl<T: fmt::Display + fmt::Debug> Error for ErrorWithLocation<T> {}

impl<T: Error + Send + Sync + 'static> From<ErrorWithLocation<T>> for std::io::Error {
	fn from(src: ErrorWithLocation<T>) -> std::io::Error {
		std::io::Error::new(std::io::ErrorKind::Other, src)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn display() {
		let err = ErrorWithLocation {
			file: Some(PathBuf::from("build.ninja")),
			line: NonZeroU32::new(3),
			column: Some(5),
			context: Some(RawString::from("cxx = g++".to_string())),
			error: "oops",
		};
		assert_eq!(
			err.to_string(),
			"build.ninja:3:5: oops\ncxx = g++\n    ^ near here"
		);
	}

	#[test]
	fn display_without_location() {
		let err = Location::UNKNOWN.error("oops");
		assert_eq!(err.to_string(), "oops");
	}
}
