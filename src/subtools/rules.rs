use njin::graph::State;
use std::collections::BTreeSet;
use std::io::Error;

/// Output the list of rule names.
///
/// Only the rules actually used by an edge are listed.
pub(super) fn main(state: &State) -> Result<(), Error> {
	let mut rule_names = BTreeSet::new();

	for edge in &state.edges {
		rule_names.insert(&state.scopes.rule(edge.rule).name);
	}

	for name in rule_names {
		println!("{}", name);
	}

	Ok(())
}
