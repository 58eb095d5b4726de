//! The build graph: nodes, edges, pools, and the state a parsed manifest
//! adds up to.

use crate::manifest::canonicalize::path_decanonicalized;
use crate::manifest::eval::{Env, EvalString};
use crate::manifest::lexer::TokenPos;
use crate::manifest::scope::{Rule, RuleId, ScopeArena, ScopeId};
use indexmap::IndexMap;
use raw_string::{RawStr, RawString};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NodeId(usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EdgeId(usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PoolId(usize);

/// A file in the build graph.
#[derive(Debug)]
pub struct Node {
	path: RawString,
	slash_bits: u64,
	in_edge: Option<EdgeId>,
}

impl Node {
	/// The canonical path.
	pub fn path(&self) -> &RawStr {
		&self.path
	}

	/// The edge producing this file, if any.
	pub fn in_edge(&self) -> Option<EdgeId> {
		self.in_edge
	}

	/// The path as it was spelled, with backslashes restored on Windows.
	pub fn path_decanonicalized(&self) -> RawString {
		path_decanonicalized(&self.path, self.slash_bits)
	}
}

/// A named concurrency-slot bucket.
#[derive(Debug)]
pub struct Pool {
	pub name: String,
	pub depth: u32,
}

/// A single build statement: one application of a rule.
///
/// The inputs hold the explicit, then the implicit, then the order-only
/// dependencies; the outputs hold the explicit and then the implicit
/// outputs. The counts record where the partitions fall.
#[derive(Debug)]
pub struct Edge {
	pub rule: RuleId,
	pub env: ScopeId,
	pub pool: Option<PoolId>,
	pub outputs: Vec<NodeId>,
	pub inputs: Vec<NodeId>,
	pub implicit_outs: usize,
	pub implicit_deps: usize,
	pub order_only_deps: usize,
}

impl Edge {
	/// The inputs that `$in` expands to.
	pub fn explicit_ins(&self) -> &[NodeId] {
		&self.inputs[..self.inputs.len() - self.implicit_deps - self.order_only_deps]
	}

	/// The outputs that show up in `$out`. (All of them do.)
	pub fn explicit_outs(&self) -> &[NodeId] {
		&self.outputs[..self.outputs.len() - self.implicit_outs]
	}

	/// Resolve a binding for this edge: the edge scope first, then the
	/// rule's unevaluated binding, then the enclosing scopes.
	pub fn get_binding(&self, state: &State, var: &str) -> RawString {
		EdgeEnv { state, edge: self }.lookup_variable(var)
	}
}

/// Book-keeping for one active `for` loop.
#[derive(Debug)]
pub struct ForLoop {
	pub var: String,
	/// The loop's value list, re-evaluated once per iteration.
	pub values: Vec<EvalString>,
	pub index: usize,
	/// Where the loop body starts.
	pub pos: TokenPos,
}

/// Everything a parsed manifest adds up to.
#[derive(Debug)]
pub struct State {
	pub scopes: ScopeArena,
	nodes: Vec<Node>,
	paths: IndexMap<RawString, NodeId>,
	pub edges: Vec<Edge>,
	pools: IndexMap<String, Pool>,
	defaults: Vec<NodeId>,
	/// Active `for` loops, innermost last.
	pub forloops: Vec<ForLoop>,
}

impl State {
	/// An empty state, with the built-in `phony` rule and `console` pool.
	pub fn new() -> State {
		let mut scopes = ScopeArena::new();
		let root = scopes.root();
		scopes.add_rule(root, Rule::new("phony"));
		let mut pools = IndexMap::new();
		pools.insert(
			"console".to_string(),
			Pool {
				name: "console".to_string(),
				depth: 1,
			},
		);
		State {
			scopes,
			nodes: Vec::new(),
			paths: IndexMap::new(),
			edges: Vec::new(),
			pools,
			defaults: Vec::new(),
			forloops: Vec::new(),
		}
	}

	pub fn add_pool(&mut self, pool: Pool) {
		self.pools.insert(pool.name.clone(), pool);
	}

	pub fn lookup_pool(&self, name: &str) -> Option<&Pool> {
		self.pools.get(name)
	}

	pub fn lookup_pool_id(&self, name: &str) -> Option<PoolId> {
		self.pools.get_full(name).map(|(i, _, _)| PoolId(i))
	}

	pub fn pool(&self, id: PoolId) -> &Pool {
		self.pools.get_index(id.0).unwrap().1
	}

	pub fn pools(&self) -> impl Iterator<Item = &Pool> {
		self.pools.values()
	}

	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id.0]
	}

	pub fn edge(&self, id: EdgeId) -> &Edge {
		&self.edges[id.0]
	}

	pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge {
		&mut self.edges[id.0]
	}

	pub fn node_id(&self, path: &RawStr) -> Option<NodeId> {
		self.paths.get(path).copied()
	}

	fn get_node(&mut self, path: RawString, slash_bits: u64) -> NodeId {
		if let Some(&id) = self.paths.get(&path) {
			return id;
		}
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node {
			path: path.clone(),
			slash_bits,
			in_edge: None,
		});
		self.paths.insert(path, id);
		id
	}

	pub fn add_edge(&mut self, rule: RuleId, env: ScopeId) -> EdgeId {
		self.edges.push(Edge {
			rule,
			env,
			pool: None,
			outputs: Vec::new(),
			inputs: Vec::new(),
			implicit_outs: 0,
			implicit_deps: 0,
			order_only_deps: 0,
		});
		EdgeId(self.edges.len() - 1)
	}

	/// Claim `path` as an output of `edge`. Fails when another edge already
	/// produces it.
	pub fn add_out(&mut self, edge: EdgeId, path: RawString, slash_bits: u64) -> bool {
		let node = self.get_node(path, slash_bits);
		if self.nodes[node.0].in_edge.is_some() {
			return false;
		}
		self.nodes[node.0].in_edge = Some(edge);
		self.edges[edge.0].outputs.push(node);
		true
	}

	pub fn add_in(&mut self, edge: EdgeId, path: RawString, slash_bits: u64) {
		let node = self.get_node(path, slash_bits);
		self.edges[edge.0].inputs.push(node);
	}

	/// Drop the most recently added edge again; used when all of its
	/// outputs turned out to belong to earlier edges.
	pub fn pop_edge(&mut self, edge: EdgeId) {
		debug_assert_eq!(edge.0 + 1, self.edges.len());
		self.edges.pop();
	}

	/// Mark a target to build when none are asked for explicitly. The path
	/// must be produced by some edge.
	pub fn add_default(&mut self, path: &RawStr) -> bool {
		match self.paths.get(path) {
			Some(&id) if self.nodes[id.0].in_edge.is_some() => {
				self.defaults.push(id);
				true
			}
			_ => false,
		}
	}

	pub fn defaults(&self) -> &[NodeId] {
		&self.defaults
	}
}

/// The environment rule bindings are expanded in: `$in`, `$out`, and
/// `$in_newline` first, then the edge's scope chain with the rule's own
/// bindings as fallback.
pub struct EdgeEnv<'a> {
	pub state: &'a State,
	pub edge: &'a Edge,
}

impl<'a> EdgeEnv<'a> {
	fn path_list(&self, nodes: &[NodeId], sep: u8) -> RawString {
		let mut out = RawString::new();
		for (i, &node) in nodes.iter().enumerate() {
			if i > 0 {
				out.push(sep);
			}
			out.push_str(&self.state.node(node).path_decanonicalized());
		}
		out
	}
}

impl<'a> Env for EdgeEnv<'a> {
	fn lookup_variable(&self, var: &str) -> RawString {
		match var {
			"in" => self.path_list(self.edge.explicit_ins(), b' '),
			"in_newline" => self.path_list(self.edge.explicit_ins(), b'\n'),
			"out" => self.path_list(&self.edge.outputs, b' '),
			_ => {
				let rule = self.state.scopes.rule(self.edge.rule);
				self.state.scopes.lookup_with_fallback(
					self.edge.env,
					var,
					rule.get_binding(var),
					self,
				)
			}
		}
	}
}
