//! Variable and rule definition scoping and lookup.

use super::eval::{Env, EvalString};
use indexmap::IndexMap;
use raw_string::RawString;

/// Index of a scope in a [`ScopeArena`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScopeId(usize);

/// Index of a rule in a [`ScopeArena`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RuleId(usize);

/// One level of variable and rule definitions.
///
/// Variables here are already evaluated; rule bindings stay unevaluated
/// until an edge asks for them.
#[derive(Debug)]
struct Scope {
	parent: Option<ScopeId>,
	vars: IndexMap<String, RawString>,
	rules: IndexMap<String, RuleId>,
}

/// A reusable command template with reserved bindings.
#[derive(Debug)]
pub struct Rule {
	pub name: String,
	bindings: IndexMap<String, EvalString>,
}

impl Rule {
	pub fn new(name: impl Into<String>) -> Rule {
		Rule {
			name: name.into(),
			bindings: IndexMap::new(),
		}
	}

	/// Only these make sense in a rule body; anything else is a typo.
	pub fn is_reserved_binding(var: &str) -> bool {
		match var {
			"command" | "depfile" | "deps" | "description" | "generator"
			| "msvc_deps_prefix" | "pool" | "restat" | "rspfile" | "rspfile_content" => true,
			_ => false,
		}
	}

	pub fn add_binding(&mut self, key: &str, value: EvalString) {
		self.bindings.insert(key.to_string(), value);
	}

	/// `key += value`: concatenate onto the existing binding, if any.
	pub fn append_binding(&mut self, key: &str, value: EvalString) {
		match self.bindings.get_mut(key) {
			Some(existing) => existing.extend(value),
			None => {
				self.bindings.insert(key.to_string(), value);
			}
		}
	}

	pub fn get_binding(&self, key: &str) -> Option<&EvalString> {
		self.bindings.get(key)
	}
}

/// All scopes of a manifest. Parent links are indices into the arena, so
/// scopes and the rules they hold live as long as the arena itself.
#[derive(Debug)]
pub struct ScopeArena {
	scopes: Vec<Scope>,
	rules: Vec<Rule>,
}

impl ScopeArena {
	/// Create an arena holding just the root scope.
	pub fn new() -> ScopeArena {
		ScopeArena {
			scopes: vec![Scope {
				parent: None,
				vars: IndexMap::new(),
				rules: IndexMap::new(),
			}],
			rules: Vec::new(),
		}
	}

	pub fn root(&self) -> ScopeId {
		ScopeId(0)
	}

	/// Create an empty scope which inherits the parent scope's definitions.
	pub fn add_scope(&mut self, parent: ScopeId) -> ScopeId {
		self.scopes.push(Scope {
			parent: Some(parent),
			vars: IndexMap::new(),
			rules: IndexMap::new(),
		});
		ScopeId(self.scopes.len() - 1)
	}

	/// Bind a variable in `scope`. Rebinding replaces the old value.
	pub fn add_binding(&mut self, scope: ScopeId, name: &str, value: RawString) {
		self.scopes[scope.0].vars.insert(name.to_string(), value);
	}

	/// Look a variable up, walking the parent chain. Unbound variables are
	/// the empty string.
	pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> RawString {
		let mut next = Some(scope);
		while let Some(id) = next {
			let scope = &self.scopes[id.0];
			if let Some(value) = scope.vars.get(name) {
				return value.clone();
			}
			next = scope.parent;
		}
		RawString::new()
	}

	/// Look `name` up in `scope`'s own bindings; fall back to `eval` (an
	/// unevaluated rule binding, expanded against `env`), and then to the
	/// parent chain. This is the resolution order for edge bindings.
	pub fn lookup_with_fallback(
		&self,
		scope: ScopeId,
		name: &str,
		eval: Option<&EvalString>,
		env: &dyn Env,
	) -> RawString {
		if let Some(value) = self.scopes[scope.0].vars.get(name) {
			return value.clone();
		}
		if let Some(eval) = eval {
			return eval.evaluate(env);
		}
		match self.scopes[scope.0].parent {
			Some(parent) => self.lookup_variable(parent, name),
			None => RawString::new(),
		}
	}

	pub fn add_rule(&mut self, scope: ScopeId, rule: Rule) -> RuleId {
		let id = RuleId(self.rules.len());
		self.scopes[scope.0].rules.insert(rule.name.clone(), id);
		self.rules.push(rule);
		id
	}

	pub fn rule(&self, id: RuleId) -> &Rule {
		&self.rules[id.0]
	}

	/// Rule lookup in this scope only. Used to detect duplicate definitions.
	pub fn lookup_rule_current_scope(&self, scope: ScopeId, name: &str) -> Option<RuleId> {
		self.scopes[scope.0].rules.get(name).copied()
	}

	/// Rule lookup walking the parent chain. Used to resolve edges.
	pub fn lookup_rule(&self, scope: ScopeId, name: &str) -> Option<RuleId> {
		let mut next = Some(scope);
		while let Some(id) = next {
			let scope = &self.scopes[id.0];
			if let Some(&rule) = scope.rules.get(name) {
				return Some(rule);
			}
			next = scope.parent;
		}
		None
	}
}

/// An [`Env`] view of one scope (and its parents) in an arena.
pub struct ScopeRef<'a> {
	pub arena: &'a ScopeArena,
	pub scope: ScopeId,
}

impl<'a> Env for ScopeRef<'a> {
	fn lookup_variable(&self, var: &str) -> RawString {
		self.arena.lookup_variable(self.scope, var)
	}
}
