use njin::graph::State;
use std::io::Error;

/// Output the default targets.
pub(super) fn main(state: &State) -> Result<(), Error> {
	for &node in state.defaults() {
		println!("{}", state.node(node).path());
	}
	Ok(())
}
