//! Deferred evaluation of `$`-expressions.

use raw_string::{RawStr, RawString};

/// A string with variable references, not yet expanded.
///
/// The lexer produces one of these for every path and value in a manifest.
/// Expansion is deferred until a scope is known: rule bindings, for example,
/// are only expanded per edge, against the edge's own scope.
#[derive(Clone, Debug, Default)]
pub struct EvalString {
	fragments: Vec<Fragment>,
}

#[derive(Clone, Debug)]
enum Fragment {
	Literal(RawString),
	Var(String),
}

/// Something variables can be looked up in.
pub trait Env {
	/// Look up a variable. Unbound variables are the empty string.
	fn lookup_variable(&self, var: &str) -> RawString;
}

impl EvalString {
	pub fn new() -> Self {
		EvalString {
			fragments: Vec::new(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.fragments.is_empty()
	}

	pub fn clear(&mut self) {
		self.fragments.clear();
	}

	/// Append literal text. Adjacent literals are merged.
	pub fn push_literal(&mut self, text: &RawStr) {
		if text.is_empty() {
			return;
		}
		if let Some(Fragment::Literal(last)) = self.fragments.last_mut() {
			last.push_str(text);
		} else {
			self.fragments.push(Fragment::Literal(text.to_owned()));
		}
	}

	/// Append a reference to a variable.
	pub fn push_var(&mut self, name: &str) {
		self.fragments.push(Fragment::Var(name.to_string()));
	}

	/// Append all fragments of another eval string.
	pub fn extend(&mut self, other: EvalString) {
		for fragment in other.fragments {
			match fragment {
				Fragment::Literal(text) => self.push_literal(&text),
				Fragment::Var(name) => self.fragments.push(Fragment::Var(name)),
			}
		}
	}

	/// Expand against the given environment: literals verbatim, variables
	/// through the scope. A pure function of the fragments and the scope.
	pub fn evaluate(&self, env: &dyn Env) -> RawString {
		let mut out = RawString::new();
		for fragment in &self.fragments {
			match fragment {
				Fragment::Literal(text) => out.push_str(text),
				Fragment::Var(name) => out.push_str(&env.lookup_variable(name)),
			}
		}
		out
	}
}

#[cfg(test)]
mod test {
	use super::*;

	struct TestEnv;

	impl Env for TestEnv {
		fn lookup_variable(&self, var: &str) -> RawString {
			match var {
				"cc" => RawString::from("gcc".to_string()),
				"flags" => RawString::from("-O2 -g".to_string()),
				_ => RawString::new(),
			}
		}
	}

	fn eval_string(parts: &[&str]) -> EvalString {
		let mut eval = EvalString::new();
		for part in parts {
			if let Some(var) = part.strip_prefix("$") {
				eval.push_var(var);
			} else {
				eval.push_literal(part.as_ref());
			}
		}
		eval
	}

	#[test]
	fn evaluate() {
		let eval = eval_string(&["$cc", " ", "$flags", " a.c"]);
		assert_eq!(eval.evaluate(&TestEnv), "gcc -O2 -g a.c");
	}

	#[test]
	fn unbound_is_empty() {
		let eval = eval_string(&["a", "$nope", "b"]);
		assert_eq!(eval.evaluate(&TestEnv), "ab");
	}

	#[test]
	fn evaluation_is_pure() {
		let eval = eval_string(&["$cc", "-", "$flags"]);
		assert_eq!(eval.evaluate(&TestEnv), eval.evaluate(&TestEnv));
	}

	#[test]
	fn extend_concatenates() {
		let mut a = eval_string(&["x", "$cc"]);
		a.extend(eval_string(&["y"]));
		assert_eq!(a.evaluate(&TestEnv), "xgccy");
	}
}
