use njin::graph::State;
use std::io::Error;

/// Output every target together with the rule that produces it.
pub(super) fn main(state: &State) -> Result<(), Error> {
	for edge in &state.edges {
		let rule = state.scopes.rule(edge.rule);
		for &output in &edge.outputs {
			println!("{}: {}", state.node(output).path(), rule.name);
		}
	}
	Ok(())
}
