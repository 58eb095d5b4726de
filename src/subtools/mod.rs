mod defaults;
mod pools;
mod rules;
mod targets;

use njin::graph::State;
use std::io::{Error, ErrorKind};

static SUBTOOLS: &'static [(&'static str, fn(&State) -> Result<(), Error>)] = &[
	("defaults", defaults::main),
	("pools", pools::main),
	("rules", rules::main),
	("targets", targets::main),
	("list", list),
];

pub(super) fn run_subtool(tool: &str, state: &State) -> Result<(), Error> {
	if let Some((_, main)) = SUBTOOLS.iter().find(|(name, _)| *name == tool) {
		main(state)
	} else {
		Err(Error::new(
			ErrorKind::Other,
			format!("Unknown subtool {:?}", tool),
		))
	}
}

fn list(_: &State) -> Result<(), Error> {
	println!("Subtools:");
	for (name, _) in SUBTOOLS {
		println!("\t{}", name);
	}
	Ok(())
}
