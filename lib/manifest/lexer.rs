//! The manifest tokenizer.
//!
//! A byte-oriented state machine over a NUL-terminated buffer. The sentinel
//! NUL lets the inner loops recognize end-of-input without bounds checks.

use super::error::{LexError, LoadError};
use super::eval::EvalString;
use crate::error::ErrorWithLocation;
use raw_string::{RawStr, RawString};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Token {
	Build,
	Colon,
	Default,
	End,
	Eof,
	Equals,
	Error,
	For,
	Ident,
	In,
	Include,
	Indent,
	Newline,
	Pipe,
	Pipe2,
	PlusEq,
	Pool,
	Rule,
	Subninja,
}

impl Token {
	/// The name used in error messages.
	pub fn name(self) -> &'static str {
		match self {
			Token::Build => "'build'",
			Token::Colon => "':'",
			Token::Default => "'default'",
			Token::End => "'end'",
			Token::Eof => "eof",
			Token::Equals => "'='",
			Token::Error => "lexing error",
			Token::For => "'for'",
			Token::Ident => "identifier",
			Token::In => "'in'",
			Token::Include => "'include'",
			Token::Indent => "indent",
			Token::Newline => "newline",
			Token::Pipe => "'|'",
			Token::Pipe2 => "'||'",
			Token::PlusEq => "'+='",
			Token::Pool => "'pool'",
			Token::Rule => "'rule'",
			Token::Subninja => "'subninja'",
		}
	}

	/// An extra hint appended to "expected X, got Y" messages.
	pub fn error_hint(self) -> &'static str {
		match self {
			Token::Colon => " ($ also escapes ':')",
			_ => "",
		}
	}
}

/// A saved position of the next token, so a `for` loop can rewind to the
/// start of its body.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TokenPos(usize);

/// A synthesized input buffer holding the expansion of a `$(var)` macro.
///
/// Eval-string reads drain the innermost frame before resuming the outer
/// input, so macros can expand to any number of paths, and can nest.
struct MacroFrame {
	name: String,
	input: RawString,
	ofs: usize,
}

pub struct Lexer {
	filename: PathBuf,
	input: RawString,
	/// Start of the next token.
	ofs: usize,
	/// Start of the most recently read token; errors point here.
	last_token: usize,
	last_error: LexError,
	frames: Vec<MacroFrame>,
}

fn is_ident_char(c: u8) -> bool {
	c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || c == b'-'
}

/// `$var` references use a narrower alphabet, without the dot.
fn is_simple_ident_char(c: u8) -> bool {
	c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

/// Keywords are only special when the whole lexeme matches; `builds` or
/// `endfor` are plain identifiers.
fn keyword_or_ident(ident: &[u8]) -> Token {
	match ident {
		b"build" => Token::Build,
		b"default" => Token::Default,
		b"end" => Token::End,
		b"for" => Token::For,
		b"in" => Token::In,
		b"include" => Token::Include,
		b"pool" => Token::Pool,
		b"rule" => Token::Rule,
		b"subninja" => Token::Subninja,
		_ => Token::Ident,
	}
}

impl Lexer {
	pub fn new(filename: &Path, input: RawString) -> Lexer {
		let mut input = input;
		if input.as_bytes().last() != Some(&0) {
			input.push(0);
		}
		Lexer {
			filename: filename.to_path_buf(),
			input,
			ofs: 0,
			last_token: 0,
			last_error: LexError::UnexpectedByte,
			frames: Vec::new(),
		}
	}

	/// Read the next token. Comment and blank lines are skipped; whitespace
	/// after a token is eaten, so spaces only ever show up as [`Token::Indent`]
	/// at the start of a line.
	pub fn read_token(&mut self) -> Token {
		loop {
			self.last_token = self.ofs;
			let b = self.input.as_bytes();
			let token = match b[self.ofs] {
				0 => Token::Eof,
				b'\n' => {
					self.ofs += 1;
					return Token::Newline;
				}
				b'\r' if b[self.ofs + 1] == b'\n' => {
					self.ofs += 2;
					return Token::Newline;
				}
				b' ' => {
					let mut i = self.ofs + 1;
					while b[i] == b' ' {
						i += 1;
					}
					match b[i] {
						b'#' => {
							self.ofs = i;
							self.skip_comment();
							continue;
						}
						b'\n' => {
							self.ofs = i + 1;
							return Token::Newline;
						}
						b'\r' if b[i + 1] == b'\n' => {
							self.ofs = i + 2;
							return Token::Newline;
						}
						_ => {
							self.ofs = i;
							Token::Indent
						}
					}
				}
				b'#' => {
					self.skip_comment();
					continue;
				}
				b'=' => {
					self.ofs += 1;
					Token::Equals
				}
				b':' => {
					self.ofs += 1;
					Token::Colon
				}
				b'|' if b[self.ofs + 1] == b'|' => {
					self.ofs += 2;
					Token::Pipe2
				}
				b'|' => {
					self.ofs += 1;
					Token::Pipe
				}
				b'+' if b[self.ofs + 1] == b'=' => {
					self.ofs += 2;
					Token::PlusEq
				}
				c if is_ident_char(c) => {
					let start = self.ofs;
					let mut i = start;
					while is_ident_char(b[i]) {
						i += 1;
					}
					self.ofs = i;
					keyword_or_ident(&b[start..i])
				}
				c => {
					self.last_error = if c == b'\t' {
						LexError::Tabs
					} else {
						LexError::UnexpectedByte
					};
					Token::Error
				}
			};
			if token != Token::Eof && token != Token::Error {
				self.eat_whitespace();
			}
			return token;
		}
	}

	/// Rewind to the start of the last token. Only one token deep.
	pub fn unread_token(&mut self) {
		self.ofs = self.last_token;
	}

	/// Consume the next token iff it is `expected`.
	pub fn peek_token(&mut self, expected: Token) -> bool {
		let token = self.read_token();
		if token == expected {
			true
		} else {
			self.unread_token();
			false
		}
	}

	/// Read an identifier, or fail without consuming anything. Keywords are
	/// plain identifiers here.
	pub fn read_ident(&mut self) -> Option<String> {
		self.last_token = self.ofs;
		let b = self.input.as_bytes();
		let mut i = self.ofs;
		while is_ident_char(b[i]) {
			i += 1;
		}
		if i == self.ofs {
			return None;
		}
		// Identifier characters are all ASCII.
		let ident = unsafe { std::str::from_utf8_unchecked(&b[self.ofs..i]) }.to_string();
		self.ofs = i;
		self.eat_whitespace();
		Some(ident)
	}

	/// Read a value (up to the end of the line) or a path (up to an
	/// unescaped space, `:`, `|`, or newline; the terminator is left for
	/// [`read_token`][Self::read_token]).
	///
	/// A `$(name)` macro interrupts the read: the name is returned, and the
	/// caller is expected to look it up and call
	/// [`push_macro_frame`][Self::push_macro_frame] before reading further.
	pub fn read_eval_string(
		&mut self,
		eval: &mut EvalString,
		path: bool,
	) -> Result<Option<String>, ErrorWithLocation<LoadError>> {
		while !self.frames.is_empty() {
			let (result, at_end) = {
				let frame = self.frames.last_mut().unwrap();
				let mut last_token = frame.ofs;
				let result =
					read_eval_fragments(&frame.input, &mut frame.ofs, &mut last_token, eval, path);
				let end = frame.input.as_bytes()[frame.ofs];
				(result, end == 0 || (path && (end == b'\n' || end == b'\r')))
			};
			match result {
				Err(error) => {
					let name = self.frames.pop().unwrap().name;
					return Err(self.error(LoadError::MacroExpansion { name, error }));
				}
				Ok(Some(name)) => return Ok(Some(name)),
				Ok(None) => {
					if eval.is_empty() {
						// Nothing left here; resume the enclosing input.
						self.frames.pop();
						continue;
					}
					if at_end {
						self.frames.pop();
					}
					return Ok(None);
				}
			}
		}
		self.last_token = self.ofs;
		match read_eval_fragments(
			&self.input,
			&mut self.ofs,
			&mut self.last_token,
			eval,
			path,
		) {
			Ok(special) => Ok(special),
			Err(error) => Err(self.error(LoadError::Lex(error))),
		}
	}

	/// Queue the value of a `$(var)` macro as an input frame.
	pub fn push_macro_frame(&mut self, name: String, value: RawString) {
		let mut input = value;
		input.push(b'\n');
		input.push(0);
		let mut frame = MacroFrame { name, input, ofs: 0 };
		while frame.input.as_bytes()[frame.ofs] == b' ' {
			frame.ofs += 1;
		}
		self.frames.push(frame);
	}

	/// Remember where the next token starts, so a loop can come back to it.
	pub fn store_token_pos(&self) -> TokenPos {
		TokenPos(self.ofs)
	}

	/// Rewind to a stored position. Any pushed-back token is forgotten.
	pub fn restore_token_pos(&mut self, pos: TokenPos) {
		self.ofs = pos.0;
		self.last_token = pos.0;
	}

	pub fn describe_last_error(&self) -> LexError {
		self.last_error
	}

	/// Build an error pointing at the most recently read token, with the
	/// line and column found by scanning the buffer from the start.
	pub fn error<E>(&self, error: E) -> ErrorWithLocation<E> {
		let b = self.input.as_bytes();
		let mut line = 1u32;
		let mut line_start = 0;
		let mut pos = 0;
		while let Some(n) = memchr::memchr(b'\n', &b[pos..self.last_token]) {
			pos += n + 1;
			line += 1;
			line_start = pos;
		}
		let column = (self.last_token - line_start) as u32 + 1;
		let mut line_end = line_start
			+ memchr::memchr2(b'\n', 0, &b[line_start..]).unwrap_or(b.len() - line_start);
		if line_end > line_start && b[line_end - 1] == b'\r' {
			line_end -= 1;
		}
		ErrorWithLocation {
			file: Some(self.filename.clone()),
			line: NonZeroU32::new(line),
			column: Some(column),
			context: Some(RawStr::from_bytes(&b[line_start..line_end]).to_owned()),
			error,
		}
	}

	fn skip_comment(&mut self) {
		let b = self.input.as_bytes();
		match memchr::memchr2(b'\n', 0, &b[self.ofs..]) {
			Some(n) if b[self.ofs + n] == b'\n' => self.ofs += n + 1,
			Some(n) => self.ofs += n,
			None => self.ofs = b.len() - 1,
		}
	}

	/// Skip spaces and `$`-newline line continuations.
	fn eat_whitespace(&mut self) {
		let b = self.input.as_bytes();
		eat_whitespace_at(b, &mut self.ofs);
	}
}

fn eat_whitespace_at(b: &[u8], ofs: &mut usize) {
	loop {
		match b[*ofs] {
			b' ' => *ofs += 1,
			b'$' if b[*ofs + 1] == b'\n' => *ofs += 2,
			b'$' if b[*ofs + 1] == b'\r' && b[*ofs + 2] == b'\n' => *ofs += 3,
			_ => return,
		}
	}
}

/// The shared eval-string machine, used for both the file input and macro
/// frames. `last_token` tracks the start of the fragment being read, so
/// errors point at the right spot.
fn read_eval_fragments(
	input: &RawStr,
	ofs: &mut usize,
	last_token: &mut usize,
	eval: &mut EvalString,
	path: bool,
) -> Result<Option<String>, LexError> {
	let b = input.as_bytes();
	loop {
		*last_token = *ofs;
		match b[*ofs] {
			// Input without a final newline still terminates a value.
			0 => break,
			b'\n' => {
				if !path {
					*ofs += 1;
				}
				break;
			}
			b'\r' if b[*ofs + 1] == b'\n' => {
				if !path {
					*ofs += 2;
				}
				break;
			}
			b'\r' => return Err(LexError::UnexpectedByte),
			b' ' | b':' | b'|' if path => break,
			b'$' => {
				*ofs += 1;
				match b[*ofs] {
					b'$' => {
						*ofs += 1;
						eval.push_literal(RawStr::from_bytes(b"$"));
					}
					b' ' => {
						*ofs += 1;
						eval.push_literal(RawStr::from_bytes(b" "));
					}
					b':' => {
						*ofs += 1;
						eval.push_literal(RawStr::from_bytes(b":"));
					}
					b'\n' => {
						*ofs += 1;
						while b[*ofs] == b' ' {
							*ofs += 1;
						}
					}
					b'\r' if b[*ofs + 1] == b'\n' => {
						*ofs += 2;
						while b[*ofs] == b' ' {
							*ofs += 1;
						}
					}
					b'{' => {
						*ofs += 1;
						let start = *ofs;
						while is_ident_char(b[*ofs]) {
							*ofs += 1;
						}
						if *ofs == start || b[*ofs] != b'}' {
							return Err(LexError::BadEscape);
						}
						let name = unsafe { std::str::from_utf8_unchecked(&b[start..*ofs]) };
						*ofs += 1;
						eval.push_var(name);
					}
					b'(' => {
						*ofs += 1;
						let start = *ofs;
						while is_ident_char(b[*ofs]) {
							*ofs += 1;
						}
						if *ofs == start || b[*ofs] != b')' {
							return Err(LexError::BadEscape);
						}
						let name = unsafe { std::str::from_utf8_unchecked(&b[start..*ofs]) };
						*ofs += 1;
						return Ok(Some(name.to_string()));
					}
					0 => return Err(LexError::UnexpectedEof),
					c if is_simple_ident_char(c) => {
						let start = *ofs;
						while is_simple_ident_char(b[*ofs]) {
							*ofs += 1;
						}
						let name = unsafe { std::str::from_utf8_unchecked(&b[start..*ofs]) };
						eval.push_var(name);
					}
					_ => return Err(LexError::BadEscape),
				}
			}
			_ => {
				let start = *ofs;
				let mut i = *ofs;
				loop {
					match b[i] {
						0 | b'\n' | b'\r' | b'$' => break,
						b' ' | b':' | b'|' if path => break,
						_ => i += 1,
					}
				}
				eval.push_literal(&input[start..i]);
				*ofs = i;
			}
		}
	}
	if path {
		// Paths eat their trailing whitespace; values end at the newline.
		eat_whitespace_at(b, ofs);
	}
	Ok(None)
}
