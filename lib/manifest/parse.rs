//! The statement parser: turns manifest text into graph state.

use super::canonicalize::canonicalize_path;
use super::error::LoadError;
use super::eval::EvalString;
use super::lexer::{Lexer, Token};
use super::path::to_path;
use super::reader::FileReader;
use super::scope::{Rule, ScopeId, ScopeRef};
use super::version::check_version;
use crate::error::{ErrorWithLocation, Location};
use crate::graph::{ForLoop, Pool, State};
use log::warn;
use raw_string::RawString;
use std::path::Path;
use std::str::from_utf8;

/// What to do when two edges claim the same output path.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DupeEdgeAction {
	Warn,
	Error,
}

type ParseResult<T = ()> = Result<T, ErrorWithLocation<LoadError>>;

/// Parses manifest files.
///
/// One parser handles one file; `include` and `subninja` run a fresh parser
/// against the same state and file reader.
pub struct ManifestParser<'a> {
	state: &'a mut State,
	file_reader: &'a dyn FileReader,
	/// The scope new definitions go into.
	scope: ScopeId,
	lexer: Lexer,
	dupe_edge_action: DupeEdgeAction,
	quiet: bool,
}

impl<'a> ManifestParser<'a> {
	pub fn new(
		state: &'a mut State,
		file_reader: &'a dyn FileReader,
		dupe_edge_action: DupeEdgeAction,
	) -> ManifestParser<'a> {
		let scope = state.scopes.root();
		ManifestParser {
			state,
			file_reader,
			scope,
			lexer: Lexer::new(Path::new(""), RawString::new()),
			dupe_edge_action,
			quiet: false,
		}
	}

	/// Load and parse a file, applying its statements to the state.
	pub fn load(&mut self, filename: &Path) -> ParseResult {
		let mut contents = match self.file_reader.read_file(filename) {
			Ok(contents) => contents,
			Err(error) => {
				return Err(Location::UNKNOWN.error(LoadError::Io {
					file_name: filename.to_path_buf(),
					error,
				}));
			}
		};
		// The lexer wants a NUL at the end of its input, so it can recognize
		// the end without bounds checks.
		contents.push(0);
		self.parse(filename, contents)
	}

	/// Parse a string of input. Used by tests.
	pub fn parse_test(&mut self, input: &str) -> ParseResult {
		self.quiet = true;
		let mut bytes = input.as_bytes().to_vec();
		bytes.push(0);
		self.parse(Path::new("input"), bytes)
	}

	fn parse(&mut self, filename: &Path, input: Vec<u8>) -> ParseResult {
		self.lexer = Lexer::new(filename, RawString::from_bytes(input));

		loop {
			let token = self.lexer.read_token();
			match token {
				Token::Pool => self.parse_pool()?,
				Token::Build => self.parse_edge()?,
				Token::Rule => self.parse_rule()?,
				Token::Default => self.parse_default()?,
				Token::Ident => {
					self.lexer.unread_token();
					let (name, value, pluseq) = self.parse_let()?;
					let value = value.evaluate(&self.scope_ref());
					// Check the required version immediately, so we stop
					// before running into any syntactic surprises.
					if name == "ninja_required_version" {
						check_version(&String::from_utf8_lossy(value.as_bytes()));
					}
					if pluseq {
						let mut combined = self.state.scopes.lookup_variable(self.scope, &name);
						combined.push_str(&value);
						self.state.scopes.add_binding(self.scope, &name, combined);
					} else {
						self.state.scopes.add_binding(self.scope, &name, value);
					}
				}
				Token::Include => self.parse_file_include(false)?,
				Token::Subninja => self.parse_file_include(true)?,
				Token::For => self.parse_for()?,
				Token::End => self.parse_end()?,
				Token::Error => {
					return Err(self
						.lexer
						.error(LoadError::Lex(self.lexer.describe_last_error())));
				}
				Token::Eof => {
					if !self.state.forloops.is_empty() {
						return Err(self.lexer.error(LoadError::MissingEndFor));
					}
					return Ok(());
				}
				Token::Newline => {}
				token => return Err(self.lexer.error(LoadError::Unexpected(token))),
			}
		}
	}

	fn scope_ref(&self) -> ScopeRef {
		ScopeRef {
			arena: &self.state.scopes,
			scope: self.scope,
		}
	}

	fn parse_pool(&mut self) -> ParseResult {
		let name = match self.lexer.read_ident() {
			Some(name) => name,
			None => return Err(self.lexer.error(LoadError::ExpectedPoolName)),
		};
		self.expect_token(Token::Newline)?;

		if self.state.lookup_pool(&name).is_some() {
			return Err(self.lexer.error(LoadError::DuplicatePool(name)));
		}

		let mut depth = None;
		while self.lexer.peek_token(Token::Indent) {
			let (key, value, pluseq) = self.parse_let()?;
			if pluseq {
				return Err(self.lexer.error(LoadError::UnexpectedToken {
					expected: Token::Equals,
					got: Token::PlusEq,
				}));
			}
			if key != "depth" {
				return Err(self.lexer.error(LoadError::UnexpectedVariable(key)));
			}
			let value = value.evaluate(&self.scope_ref());
			depth = Some(
				from_utf8(value.as_bytes())
					.ok()
					.and_then(|s| s.parse::<u32>().ok())
					.ok_or_else(|| self.lexer.error(LoadError::InvalidPoolDepth))?,
			);
		}

		match depth {
			Some(depth) => {
				self.state.add_pool(Pool { name, depth });
				Ok(())
			}
			None => Err(self.lexer.error(LoadError::ExpectedDepth)),
		}
	}

	fn parse_rule(&mut self) -> ParseResult {
		let name = match self.lexer.read_ident() {
			Some(name) => name,
			None => return Err(self.lexer.error(LoadError::ExpectedRuleName)),
		};
		self.expect_token(Token::Newline)?;

		if self
			.state
			.scopes
			.lookup_rule_current_scope(self.scope, &name)
			.is_some()
		{
			return Err(self.lexer.error(LoadError::DuplicateRule(name)));
		}

		let mut rule = Rule::new(name);
		while self.lexer.peek_token(Token::Indent) {
			let (key, value, pluseq) = self.parse_let()?;
			if !Rule::is_reserved_binding(&key) {
				// Rule bodies have no scope of their own.
				return Err(self.lexer.error(LoadError::UnexpectedVariable(key)));
			}
			if pluseq {
				rule.append_binding(&key, value);
			} else {
				rule.add_binding(&key, value);
			}
		}

		let no_rspfile = rule.get_binding("rspfile").map_or(true, EvalString::is_empty);
		let no_content = rule
			.get_binding("rspfile_content")
			.map_or(true, EvalString::is_empty);
		if no_rspfile != no_content {
			return Err(self.lexer.error(LoadError::RspfileMismatch));
		}

		if rule.get_binding("command").map_or(true, EvalString::is_empty) {
			return Err(self.lexer.error(LoadError::ExpectedCommand));
		}

		self.state.scopes.add_rule(self.scope, rule);
		Ok(())
	}

	fn parse_edge(&mut self) -> ParseResult {
		let mut outs = Vec::new();
		{
			let mut out = EvalString::new();
			self.read_path(&mut out)?;
			if out.is_empty() {
				return Err(self.lexer.error(LoadError::ExpectedPath));
			}
			while !out.is_empty() {
				outs.push(out);
				out = EvalString::new();
				self.read_path(&mut out)?;
			}
		}

		// Implicit outputs, counting how many as we go.
		let mut implicit_outs = 0;
		if self.lexer.peek_token(Token::Pipe) {
			loop {
				let mut out = EvalString::new();
				self.read_path(&mut out)?;
				if out.is_empty() {
					break;
				}
				outs.push(out);
				implicit_outs += 1;
			}
		}

		self.expect_token(Token::Colon)?;

		let rule_name = match self.lexer.read_ident() {
			Some(name) => name,
			None => return Err(self.lexer.error(LoadError::ExpectedBuildCommandName)),
		};
		let rule = match self.state.scopes.lookup_rule(self.scope, &rule_name) {
			Some(rule) => rule,
			None => return Err(self.lexer.error(LoadError::UnknownRule(rule_name))),
		};

		let mut ins = Vec::new();
		loop {
			let mut input = EvalString::new();
			self.read_path(&mut input)?;
			if input.is_empty() {
				break;
			}
			ins.push(input);
		}

		// Implicit deps, counting how many as we go.
		let mut implicit = 0;
		if self.lexer.peek_token(Token::Pipe) {
			loop {
				let mut input = EvalString::new();
				self.read_path(&mut input)?;
				if input.is_empty() {
					break;
				}
				ins.push(input);
				implicit += 1;
			}
		}

		// Order-only deps, counting how many as we go.
		let mut order_only = 0;
		if self.lexer.peek_token(Token::Pipe2) {
			loop {
				let mut input = EvalString::new();
				self.read_path(&mut input)?;
				if input.is_empty() {
					break;
				}
				ins.push(input);
				order_only += 1;
			}
		}

		self.expect_token(Token::Newline)?;

		// Bindings on edges are rare, so allocate a scope only when needed.
		let mut has_indent = self.lexer.peek_token(Token::Indent);
		let env = if has_indent {
			self.state.scopes.add_scope(self.scope)
		} else {
			self.scope
		};
		while has_indent {
			let (key, value, pluseq) = self.parse_let()?;
			// The value is expanded against the enclosing scope; only the
			// finished binding lands in the edge scope.
			let value = value.evaluate(&self.scope_ref());
			if pluseq {
				let mut combined = self.state.scopes.lookup_variable(env, &key);
				combined.push_str(&value);
				self.state.scopes.add_binding(env, &key, combined);
			} else {
				self.state.scopes.add_binding(env, &key, value);
			}
			has_indent = self.lexer.peek_token(Token::Indent);
		}

		let edge = self.state.add_edge(rule, env);

		let pool_name = self.state.edge(edge).get_binding(self.state, "pool");
		if !pool_name.is_empty() {
			let pool = from_utf8(pool_name.as_bytes())
				.ok()
				.and_then(|name| self.state.lookup_pool_id(name));
			match pool {
				Some(pool) => self.state.edge_mut(edge).pool = Some(pool),
				None => return Err(self.lexer.error(LoadError::UnknownPool(pool_name))),
			}
		}

		// Evaluate and canonicalize the paths, now that the edge's scope is
		// complete.
		let n_outs = outs.len();
		let mut implicit_outs = implicit_outs;
		for (i, out) in outs.iter().enumerate() {
			let mut path = out.evaluate(&ScopeRef {
				arena: &self.state.scopes,
				scope: env,
			});
			let slash_bits =
				canonicalize_path(&mut path).map_err(|e| self.lexer.error(LoadError::Path(e)))?;
			if !self.state.add_out(edge, path.clone(), slash_bits) {
				match self.dupe_edge_action {
					DupeEdgeAction::Error => {
						return Err(self.lexer.error(LoadError::DuplicateEdgeOutput(path)));
					}
					DupeEdgeAction::Warn => {
						if !self.quiet {
							warn!(
								"multiple rules generate {}; builds involving this target will not be correct [-w dupbuild=warn]",
								path
							);
						}
						if n_outs - i <= implicit_outs {
							implicit_outs -= 1;
						}
					}
				}
			}
		}
		if self.state.edge(edge).outputs.is_empty() {
			// All outputs of the edge are already created by other edges.
			// Don't add this edge; do this check before the inputs are
			// connected to it.
			self.state.pop_edge(edge);
			return Ok(());
		}
		self.state.edge_mut(edge).implicit_outs = implicit_outs;

		for input in &ins {
			let mut path = input.evaluate(&ScopeRef {
				arena: &self.state.scopes,
				scope: env,
			});
			let slash_bits =
				canonicalize_path(&mut path).map_err(|e| self.lexer.error(LoadError::Path(e)))?;
			self.state.add_in(edge, path, slash_bits);
		}
		{
			let edge = self.state.edge_mut(edge);
			edge.implicit_deps = implicit;
			edge.order_only_deps = order_only;
		}

		// The dep log keys on a single output path.
		let deps = self.state.edge(edge).get_binding(self.state, "deps");
		if !deps.is_empty() && self.state.edge(edge).outputs.len() > 1 {
			return Err(self.lexer.error(LoadError::MultipleOutputsWithDeps));
		}

		Ok(())
	}

	fn parse_default(&mut self) -> ParseResult {
		let mut eval = EvalString::new();
		self.read_path(&mut eval)?;
		if eval.is_empty() {
			return Err(self.lexer.error(LoadError::ExpectedTargetName));
		}

		while !eval.is_empty() {
			let mut path = eval.evaluate(&self.scope_ref());
			// The slash bits are unused; this only does a lookup.
			canonicalize_path(&mut path).map_err(|e| self.lexer.error(LoadError::Path(e)))?;
			if !self.state.add_default(&path) {
				return Err(self.lexer.error(LoadError::UnknownTarget(path)));
			}
			eval.clear();
			self.read_path(&mut eval)?;
		}

		self.expect_token(Token::Newline)
	}

	fn parse_for(&mut self) -> ParseResult {
		let var = match self.lexer.read_ident() {
			Some(name) => name,
			None => return Err(self.lexer.error(LoadError::ExpectedVarName)),
		};
		self.expect_token(Token::In)?;

		let mut values = Vec::new();
		loop {
			let mut value = EvalString::new();
			self.read_path(&mut value)?;
			if value.is_empty() {
				if values.is_empty() {
					return Err(self.lexer.error(LoadError::ExpectedPath));
				}
				break;
			}
			values.push(value);
		}

		// Bind the first value, and remember where the body starts so 'end
		// for' can come back for the next one.
		let first = values[0].evaluate(&self.scope_ref());
		self.state.scopes.add_binding(self.scope, &var, first);
		let pos = self.lexer.store_token_pos();
		self.state.forloops.push(ForLoop {
			var,
			values,
			index: 1,
			pos,
		});
		Ok(())
	}

	fn parse_end(&mut self) -> ParseResult {
		// Iteration closes with the two words 'end for'.
		self.expect_token(Token::For)?;
		let (index, len) = match self.state.forloops.last() {
			None => return Err(self.lexer.error(LoadError::EndWithoutFor)),
			Some(forloop) => (forloop.index, forloop.values.len()),
		};
		if index >= len {
			self.state.forloops.pop();
		} else {
			let forloop = self.state.forloops.last().unwrap();
			let pos = forloop.pos;
			let var = forloop.var.clone();
			let value = forloop.values[index].clone();
			// Values are re-evaluated each iteration, in the scope as it is
			// here at the 'end'.
			let value = value.evaluate(&self.scope_ref());
			self.state.scopes.add_binding(self.scope, &var, value);
			self.state.forloops.last_mut().unwrap().index += 1;
			self.lexer.restore_token_pos(pos);
		}
		Ok(())
	}

	fn parse_file_include(&mut self, new_scope: bool) -> ParseResult {
		let mut eval = EvalString::new();
		self.read_path(&mut eval)?;
		let path = eval.evaluate(&self.scope_ref());
		let path = match to_path(&path) {
			Ok(path) => path.to_path_buf(),
			Err(_) => return Err(self.lexer.error(LoadError::InvalidUtf8)),
		};

		// `include` keeps the current scope; `subninja` gets its own child
		// scope, so its bindings don't leak back out.
		let scope = if new_scope {
			self.state.scopes.add_scope(self.scope)
		} else {
			self.scope
		};
		let mut subparser = ManifestParser {
			state: &mut *self.state,
			file_reader: self.file_reader,
			scope,
			lexer: Lexer::new(Path::new(""), RawString::new()),
			dupe_edge_action: self.dupe_edge_action,
			quiet: self.quiet,
		};
		if let Err(err) = subparser.load(&path) {
			return Err(self.lexer.error(LoadError::Include(Box::new(err))));
		}

		self.expect_token(Token::Newline)?;
		Ok(())
	}

	/// Parse `name = value` or `name += value`, leaving the value
	/// unevaluated.
	fn parse_let(&mut self) -> ParseResult<(String, EvalString, bool)> {
		let name = match self.lexer.read_ident() {
			Some(name) => name,
			None => return Err(self.lexer.error(LoadError::ExpectedVarName)),
		};
		let token = self.lexer.read_token();
		let pluseq = token == Token::PlusEq;
		if token != Token::Equals && token != Token::PlusEq {
			return Err(self.lexer.error(LoadError::ExpectedEquals { got: token }));
		}
		let mut value = EvalString::new();
		self.read_eval_string(&mut value, false)?;
		Ok((name, value, pluseq))
	}

	/// Read a path, with `$`-escapes. The result may be empty when a
	/// delimiter is hit; that by itself is not an error.
	fn read_path(&mut self, path: &mut EvalString) -> ParseResult {
		self.read_eval_string(path, true)
	}

	fn read_eval_string(&mut self, eval: &mut EvalString, path: bool) -> ParseResult {
		loop {
			match self.lexer.read_eval_string(eval, path)? {
				Some(name) => {
					// A $(name) macro: queue its expansion, then read on.
					let value = self.state.scopes.lookup_variable(self.scope, &name);
					self.lexer.push_macro_frame(name, value);
					if eval.is_empty() {
						continue;
					}
					return Ok(());
				}
				None => return Ok(()),
			}
		}
	}

	/// Read a token, complaining politely when it is not `expected`.
	fn expect_token(&mut self, expected: Token) -> ParseResult {
		let token = self.lexer.read_token();
		if token != expected {
			return Err(self.lexer.error(LoadError::UnexpectedToken { expected, got: token }));
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::graph::{NodeId, State};
	use crate::manifest::reader::FileError;
	use raw_string::RawStr;
	use std::collections::HashMap;
	use std::path::PathBuf;

	#[derive(Default)]
	struct VirtualFs {
		files: HashMap<PathBuf, Vec<u8>>,
	}

	impl VirtualFs {
		fn add(&mut self, path: &str, contents: &str) {
			self.files
				.insert(PathBuf::from(path), contents.as_bytes().to_vec());
		}
	}

	impl FileReader for VirtualFs {
		fn read_file(&self, path: &Path) -> Result<Vec<u8>, FileError> {
			self.files.get(path).cloned().ok_or(FileError::NotFound)
		}
	}

	fn parse_with(input: &str, fs: &VirtualFs) -> State {
		let mut state = State::new();
		ManifestParser::new(&mut state, fs, DupeEdgeAction::Warn)
			.parse_test(input)
			.unwrap();
		state
	}

	fn parse(input: &str) -> State {
		parse_with(input, &VirtualFs::default())
	}

	fn parse_err_with(input: &str, fs: &VirtualFs) -> String {
		let mut state = State::new();
		ManifestParser::new(&mut state, fs, DupeEdgeAction::Warn)
			.parse_test(input)
			.unwrap_err()
			.to_string()
	}

	fn parse_err(input: &str) -> String {
		parse_err_with(input, &VirtualFs::default())
	}

	fn node_paths(state: &State, nodes: &[NodeId]) -> Vec<String> {
		nodes
			.iter()
			.map(|&n| state.node(n).path().to_string())
			.collect()
	}

	#[test]
	fn empty_input() {
		let state = parse("");
		assert!(state.edges.is_empty());
		assert!(state.defaults().is_empty());
	}

	#[test]
	fn comments_and_blank_lines() {
		parse("# here is a comment\n\n   \n# and another\n");
	}

	#[test]
	fn no_final_newline() {
		let state = parse("x = 3");
		let root = state.scopes.root();
		assert_eq!(state.scopes.lookup_variable(root, "x"), "3");
	}

	#[test]
	fn crlf_line_endings() {
		let state = parse("x = a\r\ny = b\r\n");
		let root = state.scopes.root();
		assert_eq!(state.scopes.lookup_variable(root, "x"), "a");
		assert_eq!(state.scopes.lookup_variable(root, "y"), "b");
	}

	#[test]
	fn rule_and_edge() {
		let state = parse("rule cc\n  command = gcc $in -o $out\nbuild out.o: cc in.c\n");
		assert_eq!(state.edges.len(), 1);
		let edge = &state.edges[0];
		assert_eq!(state.scopes.rule(edge.rule).name, "cc");
		assert_eq!(node_paths(&state, &edge.outputs), vec!["out.o"]);
		assert_eq!(node_paths(&state, &edge.inputs), vec!["in.c"]);
		assert_eq!(edge.implicit_outs, 0);
		assert_eq!(edge.implicit_deps, 0);
		assert_eq!(edge.order_only_deps, 0);
		assert_eq!(edge.get_binding(&state, "command"), "gcc in.c -o out.o");
	}

	#[test]
	fn variables_and_append() {
		let state = parse("x = a\nx += b\ny = $x$x\n");
		let root = state.scopes.root();
		assert_eq!(state.scopes.lookup_variable(root, "x"), "ab");
		assert_eq!(state.scopes.lookup_variable(root, "y"), "abab");
	}

	#[test]
	fn line_continuation() {
		let state = parse("x = hello $\n    world\n");
		let root = state.scopes.root();
		assert_eq!(state.scopes.lookup_variable(root, "x"), "hello world");
	}

	#[test]
	fn pools() {
		let state = parse("d = 4\npool link\n  depth = 2\npool heavy\n  depth = $d\n");
		assert_eq!(state.lookup_pool("link").unwrap().depth, 2);
		assert_eq!(state.lookup_pool("heavy").unwrap().depth, 4);
		// The built-in console pool is always there.
		assert_eq!(state.lookup_pool("console").unwrap().depth, 1);
	}

	#[test]
	fn pool_errors() {
		assert!(parse_err("pool link\n  depth = 2\npool link\n  depth = 1\n")
			.contains("duplicate pool 'link'"));
		assert!(parse_err("pool x\n  depth = -1\n").contains("invalid pool depth"));
		assert!(parse_err("pool x\n  size = 4\n").contains("unexpected variable 'size'"));
		assert!(parse_err("pool x\n").contains("expected 'depth =' line"));
		assert!(parse_err("pool\n").contains("expected pool name"));
	}

	#[test]
	fn edge_pool() {
		let state = parse(
			"pool link\n  depth = 1\nrule ld\n  command = ld\n  pool = link\nbuild out: ld in\n",
		);
		let edge = &state.edges[0];
		assert_eq!(state.pool(edge.pool.unwrap()).name, "link");
		assert!(
			parse_err("rule ld\n  command = ld\n  pool = nope\nbuild out: ld\n")
				.contains("unknown pool name 'nope'")
		);
	}

	#[test]
	fn implicit_and_order_only_deps() {
		let state = parse("rule cc\n  command = c\nbuild out: cc a | b || c\n");
		let edge = &state.edges[0];
		assert_eq!(node_paths(&state, &edge.inputs), vec!["a", "b", "c"]);
		assert_eq!(edge.implicit_deps, 1);
		assert_eq!(edge.order_only_deps, 1);
		assert_eq!(node_paths(&state, edge.explicit_ins()), vec!["a"]);
		assert_eq!(edge.get_binding(&state, "in"), "a");
	}

	#[test]
	fn implicit_outputs() {
		let state = parse("rule cc\n  command = c\nbuild out | extra: cc in\n");
		let edge = &state.edges[0];
		assert_eq!(node_paths(&state, &edge.outputs), vec!["out", "extra"]);
		assert_eq!(edge.implicit_outs, 1);
		assert_eq!(node_paths(&state, edge.explicit_outs()), vec!["out"]);
		// All outputs show up in $out, implicit or not.
		assert_eq!(edge.get_binding(&state, "out"), "out extra");
	}

	#[test]
	fn empty_order_only_list() {
		let state = parse("rule cc\n  command = c\nbuild a: cc x ||\n");
		assert_eq!(state.edges[0].order_only_deps, 0);
	}

	#[test]
	fn missing_newline_after_edge() {
		assert!(parse_err("rule cc\n  command = c\nbuild a: cc x ||")
			.contains("expected newline, got eof"));
	}

	#[test]
	fn garbage_in_edge_bindings() {
		assert!(parse_err("rule cc\n  command = c\nbuild a b: cc x\n  ||\n")
			.contains("expected variable name"));
	}

	#[test]
	fn edge_bindings() {
		let state = parse(
			"x = outer\nrule cc\n  command = c $x $y\nbuild out: cc\n  y = $x inner\n  x = edge\n",
		);
		let edge = &state.edges[0];
		// Binding values are expanded against the enclosing scope, so $x in
		// the y binding still sees the outer definition.
		assert_eq!(edge.get_binding(&state, "command"), "c edge outer inner");
	}

	#[test]
	fn edge_binding_append() {
		let state =
			parse("rule cc\n  command = c $flags\nbuild out: cc\n  flags = -a\n  flags += -b\n");
		assert_eq!(state.edges[0].get_binding(&state, "command"), "c -a-b");
	}

	#[test]
	fn rule_binding_append() {
		let state = parse("rule cc\n  command = a\n  command += b\nbuild out: cc\n");
		assert_eq!(state.edges[0].get_binding(&state, "command"), "ab");
	}

	#[test]
	fn rule_errors() {
		assert!(parse_err("rule cc\n  command = a\nrule cc\n  command = b\n")
			.contains("duplicate rule 'cc'"));
		assert!(parse_err("rule cc\n  commandz = a\n")
			.contains("unexpected variable 'commandz'"));
		assert!(parse_err("rule cc\n  description = d\n").contains("expected 'command =' line"));
		assert!(parse_err("rule cc\n  command = c\n  rspfile = r\n")
			.contains("rspfile and rspfile_content"));
		assert!(parse_err("rule\n").contains("expected rule name"));
		assert!(parse_err("build out: nope\n").contains("unknown build rule 'nope'"));
	}

	#[test]
	fn rspfile_pair_is_accepted() {
		parse("rule cc\n  command = c\n  rspfile = r\n  rspfile_content = $in\n");
	}

	#[test]
	fn phony_is_built_in() {
		let state = parse("build out: phony in\n");
		assert_eq!(state.edges.len(), 1);
		assert!(parse_err("rule phony\n  command = c\n").contains("duplicate rule 'phony'"));
	}

	#[test]
	fn deps_forbids_multiple_outputs() {
		assert!(parse_err("rule cc\n  command = c\n  deps = gcc\nbuild a b: cc\n")
			.contains("multiple outputs"));
		parse("rule cc\n  command = c\n  deps = gcc\nbuild a: cc\n");
	}

	#[test]
	fn dupe_edge_warn_drops_duplicate() {
		let state = parse("rule cc\n  command = c\nbuild out: cc in1\nbuild out: cc in2\n");
		// The second edge has no outputs left, so it is discarded.
		assert_eq!(state.edges.len(), 1);
		assert_eq!(node_paths(&state, &state.edges[0].inputs), vec!["in1"]);
	}

	#[test]
	fn dupe_edge_warn_keeps_remaining_outputs() {
		let state = parse("rule cc\n  command = c\nbuild a b: cc\nbuild b c: cc\n");
		assert_eq!(state.edges.len(), 2);
		assert_eq!(node_paths(&state, &state.edges[1].outputs), vec!["c"]);
	}

	#[test]
	fn dupe_edge_warn_adjusts_implicit_count() {
		let state = parse("rule cc\n  command = c\nbuild a | b: cc\nbuild c | b: cc\n");
		assert_eq!(node_paths(&state, &state.edges[1].outputs), vec!["c"]);
		assert_eq!(state.edges[1].implicit_outs, 0);
	}

	#[test]
	fn dupe_edge_error() {
		let mut state = State::new();
		let fs = VirtualFs::default();
		let err = ManifestParser::new(&mut state, &fs, DupeEdgeAction::Error)
			.parse_test("rule cc\n  command = c\nbuild out: cc\nbuild out: cc\n")
			.unwrap_err();
		assert!(err
			.to_string()
			.contains("multiple rules generate out [-w dupbuild=err]"));
	}

	#[test]
	fn defaults() {
		let state = parse("rule cc\n  command = c\nbuild out: cc in\ndefault out\n");
		assert_eq!(state.defaults().len(), 1);
		assert_eq!(
			state.node(state.defaults()[0]).path().to_string(),
			"out"
		);
	}

	#[test]
	fn default_errors() {
		assert!(parse_err("default\n").contains("expected target name"));
		assert!(parse_err("rule cc\n  command = c\nbuild out: cc in\ndefault in\n")
			.contains("unknown target 'in'"));
	}

	#[test]
	fn paths_are_canonicalized() {
		let state = parse("rule cc\n  command = c\nbuild ./out//x: cc in/../in2\n");
		let edge = &state.edges[0];
		assert_eq!(node_paths(&state, &edge.outputs), vec!["out/x"]);
		assert_eq!(node_paths(&state, &edge.inputs), vec!["in2"]);
	}

	#[test]
	fn escaped_colon_in_path() {
		let state = parse("rule cc\n  command = c\nbuild c$:foo: cc\n");
		assert!(state.node_id(RawStr::from_bytes(b"c:foo")).is_some());
	}

	#[test]
	fn for_loop() {
		let state = parse("rule cc\n  command = c\nfor n in a b c\nbuild $n.o: cc $n.c\nend for\n");
		assert_eq!(state.edges.len(), 3);
		assert_eq!(node_paths(&state, &state.edges[0].outputs), vec!["a.o"]);
		assert_eq!(node_paths(&state, &state.edges[1].outputs), vec!["b.o"]);
		assert_eq!(node_paths(&state, &state.edges[2].outputs), vec!["c.o"]);
		assert_eq!(node_paths(&state, &state.edges[2].inputs), vec!["c.c"]);
		assert!(state.forloops.is_empty());
	}

	#[test]
	fn for_loops_nest() {
		let state = parse(
			"rule cc\n  command = c\nfor a in 1 2\nfor b in x y\nbuild $a$b: cc\nend for\nend for\n",
		);
		let outputs: Vec<String> = state
			.edges
			.iter()
			.flat_map(|e| node_paths(&state, &e.outputs))
			.collect();
		assert_eq!(outputs, vec!["1x", "1y", "2x", "2y"]);
	}

	#[test]
	fn for_loop_errors() {
		assert!(parse_err("end for\n").contains("'end for' without 'for'"));
		assert!(parse_err("for n in a\n").contains("'end for' expected"));
		assert!(parse_err("for n in\n").contains("expected path"));
		assert!(parse_err("for n in a\nend\n").contains("expected 'for'"));
	}

	#[test]
	fn include_shares_the_scope() {
		let mut fs = VirtualFs::default();
		fs.add("rules.ninja", "rule cc\n  command = gcc\nvar = from_include\n");
		let state = parse_with("include rules.ninja\nbuild out: cc in\n", &fs);
		assert_eq!(state.edges.len(), 1);
		let root = state.scopes.root();
		assert_eq!(state.scopes.lookup_variable(root, "var"), "from_include");
	}

	#[test]
	fn subninja_keeps_bindings_to_itself() {
		let mut fs = VirtualFs::default();
		fs.add("sub.ninja", "x = inner\nrule cc\n  command = c $x\nbuild out: cc\n");
		let state = parse_with("x = outer\nsubninja sub.ninja\n", &fs);
		let root = state.scopes.root();
		assert_eq!(state.scopes.lookup_variable(root, "x"), "outer");
		assert_eq!(state.edges.len(), 1);
		assert_eq!(state.edges[0].get_binding(&state, "command"), "c inner");
	}

	#[test]
	fn missing_include_is_an_error() {
		let err = parse_err("include nope.ninja\n");
		assert!(err.contains("loading 'nope.ninja'"));
	}

	#[test]
	fn errors_in_included_files_chain() {
		let mut fs = VirtualFs::default();
		fs.add("bad.ninja", "pool\n");
		let err = parse_err_with("include bad.ninja\n", &fs);
		assert!(err.starts_with("input:1:"));
		assert!(err.contains("bad.ninja:1:"));
		assert!(err.contains("expected pool name"));
	}

	#[test]
	fn macro_expansion_in_paths() {
		let state = parse("objs = a.o b.o\nrule cc\n  command = c\nbuild out: cc $(objs)\n");
		assert_eq!(node_paths(&state, &state.edges[0].inputs), vec!["a.o", "b.o"]);
	}

	#[test]
	fn macro_expanding_to_nothing() {
		let state = parse("rule cc\n  command = c\nbuild out: cc $(nope)\n");
		assert!(state.edges[0].inputs.is_empty());
	}

	#[test]
	fn required_version_is_recorded() {
		let state = parse("ninja_required_version = 1.0\n");
		let root = state.scopes.root();
		assert_eq!(
			state.scopes.lookup_variable(root, "ninja_required_version"),
			"1.0"
		);
	}

	#[test]
	fn stray_indent_is_an_error() {
		assert!(parse_err("  x = 3\n").contains("unexpected indent"));
	}

	#[test]
	fn tabs_are_an_error() {
		assert!(parse_err("\tx = 3\n").contains("tabs are not allowed"));
	}

	#[test]
	fn let_without_equals_is_an_error() {
		assert!(parse_err("x 3\n").contains("expected '=' or '+='"));
	}

	#[test]
	fn reparsing_is_deterministic() {
		let input = "rule cc\n  command = gcc $in -o $out\nbuild out.o: cc in.c\ndefault out.o\n";
		let a = parse(input);
		let b = parse(input);
		assert_eq!(a.edges.len(), b.edges.len());
		assert_eq!(
			node_paths(&a, &a.edges[0].outputs),
			node_paths(&b, &b.edges[0].outputs)
		);
		assert_eq!(a.defaults().len(), b.defaults().len());
	}
}
