//! Errors that can occur while loading and parsing manifests.

use super::canonicalize::PathError;
use super::lexer::Token;
use super::reader::FileError;
use crate::error::ErrorWithLocation;
use raw_string::RawString;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// A failure inside the lexer, described the way the lexer saw it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LexError {
	/// A byte no token can start with.
	UnexpectedByte,
	Tabs,
	BadEscape,
	UnexpectedEof,
}

impl fmt::Display for LexError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"{}",
			match self {
				LexError::UnexpectedByte => "lexing error",
				LexError::Tabs => "tabs are not allowed, use spaces",
				LexError::BadEscape => "bad $-escape (literal $ must be written as $$)",
				LexError::UnexpectedEof => "unexpected EOF",
			}
		)
	}
}

impl Error for LexError {}

/// Anything that can go wrong while loading a manifest.
#[derive(Debug)]
pub enum LoadError {
	Lex(LexError),
	UnexpectedToken { expected: Token, got: Token },
	ExpectedEquals { got: Token },
	/// A token no statement can start with.
	Unexpected(Token),
	ExpectedPoolName,
	ExpectedRuleName,
	ExpectedVarName,
	ExpectedPath,
	ExpectedTargetName,
	ExpectedBuildCommandName,
	DuplicatePool(String),
	DuplicateRule(String),
	DuplicateEdgeOutput(RawString),
	UnknownRule(String),
	UnknownPool(RawString),
	UnknownTarget(RawString),
	/// A variable which is not recognized in this (`pool` or `rule`) body.
	UnexpectedVariable(String),
	InvalidPoolDepth,
	ExpectedDepth,
	ExpectedCommand,
	RspfileMismatch,
	MultipleOutputsWithDeps,
	Path(PathError),
	EndWithoutFor,
	MissingEndFor,
	InvalidUtf8,
	/// Lexing the expansion of a `$(name)` macro failed.
	MacroExpansion { name: String, error: LexError },
	/// A problem while trying to open or read a file.
	Io {
		file_name: PathBuf,
		error: FileError,
	},
	/// An error inside an included file, wrapped with the location of the
	/// `include` or `subninja` statement.
	Include(Box<ErrorWithLocation<LoadError>>),
}

impl fmt::Display for LoadError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::LoadError::*;
		match self {
			Lex(e) => write!(f, "{}", e),
			UnexpectedToken { expected, got } => write!(
				f,
				"expected {}, got {}{}",
				expected.name(),
				got.name(),
				expected.error_hint()
			),
			ExpectedEquals { got } => write!(f, "expected '=' or '+=', got {}", got.name()),
			Unexpected(token) => write!(f, "unexpected {}", token.name()),
			ExpectedPoolName => write!(f, "expected pool name"),
			ExpectedRuleName => write!(f, "expected rule name"),
			ExpectedVarName => write!(f, "expected variable name"),
			ExpectedPath => write!(f, "expected path"),
			ExpectedTargetName => write!(f, "expected target name"),
			ExpectedBuildCommandName => write!(f, "expected build command name"),
			DuplicatePool(name) => write!(f, "duplicate pool '{}'", name),
			DuplicateRule(name) => write!(f, "duplicate rule '{}'", name),
			DuplicateEdgeOutput(path) => {
				write!(f, "multiple rules generate {} [-w dupbuild=err]", path)
			}
			UnknownRule(name) => write!(f, "unknown build rule '{}'", name),
			UnknownPool(name) => write!(f, "unknown pool name '{}'", name),
			UnknownTarget(name) => write!(f, "unknown target '{}'", name),
			UnexpectedVariable(name) => write!(f, "unexpected variable '{}'", name),
			InvalidPoolDepth => write!(f, "invalid pool depth"),
			ExpectedDepth => write!(f, "expected 'depth =' line"),
			ExpectedCommand => write!(f, "expected 'command =' line"),
			RspfileMismatch => write!(
				f,
				"rspfile and rspfile_content need to be both specified"
			),
			MultipleOutputsWithDeps => write!(
				f,
				"multiple outputs aren't supported with the deps binding"
			),
			Path(e) => write!(f, "{}", e),
			EndWithoutFor => write!(f, "'end for' without 'for'"),
			MissingEndFor => write!(f, "'end for' expected"),
			InvalidUtf8 => write!(f, "invalid UTF-8 in path"),
			MacroExpansion { name, error } => {
				write!(f, "error expanding $({}): {}", name, error)
			}
			Io { file_name, error } => {
				write!(f, "loading '{}': {}", file_name.display(), error)
			}
			Include(inner) => write!(f, "{}", inner),
		}
	}
}

impl Error for LoadError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			LoadError::Io { error, .. } => Some(error),
			LoadError::Include(inner) => Some(&**inner),
			_ => None,
		}
	}
}

impl From<LexError> for LoadError {
	fn from(src: LexError) -> LoadError {
		LoadError::Lex(src)
	}
}

impl From<PathError> for LoadError {
	fn from(src: PathError) -> LoadError {
		LoadError::Path(src)
	}
}

impl From<ErrorWithLocation<LexError>> for ErrorWithLocation<LoadError> {
	fn from(src: ErrorWithLocation<LexError>) -> Self {
		src.convert()
	}
}

impl From<ErrorWithLocation<PathError>> for ErrorWithLocation<LoadError> {
	fn from(src: ErrorWithLocation<PathError>) -> Self {
		src.convert()
	}
}
