use njin::graph::State;
use std::io::Error;

/// Output the pools and their depths.
pub(super) fn main(state: &State) -> Result<(), Error> {
	for pool in state.pools() {
		println!("{} depth {}", pool.name, pool.depth);
	}
	Ok(())
}
