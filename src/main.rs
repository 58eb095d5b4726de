mod logger;
mod subtools;

use njin::graph::State;
use njin::manifest::{DiskFileReader, DupeEdgeAction, ManifestParser};
use std::path::PathBuf;
use std::process::exit;
use structopt::StructOpt;

#[derive(StructOpt)]
pub struct Options {
	/// The manifest to load.
	#[structopt(
		short = "f",
		long = "file",
		default_value = "build.ninja",
		parse(from_os_str)
	)]
	file: PathBuf,

	/// Adjust warnings. Use -w list to list the flags.
	#[structopt(short = "w")]
	warnings: Vec<String>,

	/// Run a subtool. Use -t list to list subtools.
	#[structopt(short = "t")]
	tool: Option<String>,
}

fn main() {
	logger::init();

	let opt = Options::from_args();

	let mut dupe_edge_action = DupeEdgeAction::Warn;
	for warning in &opt.warnings {
		match &warning[..] {
			"dupbuild=err" => dupe_edge_action = DupeEdgeAction::Error,
			"dupbuild=warn" => dupe_edge_action = DupeEdgeAction::Warn,
			"list" => {
				println!("warning flags:\n  dupbuild={{err,warn}}  multiple build lines for one target");
				exit(0);
			}
			flag => {
				eprintln!("Unknown warning flag {:?}. Use -w list to list the flags.", flag);
				exit(1);
			}
		}
	}

	let mut state = State::new();
	let file_reader = DiskFileReader;
	let mut parser = ManifestParser::new(&mut state, &file_reader, dupe_edge_action);
	if let Err(e) = parser.load(&opt.file) {
		eprintln!("{}", e);
		exit(1);
	}
	drop(parser);

	if let Some(tool) = opt.tool {
		if let Err(e) = subtools::run_subtool(&tool, &state) {
			eprintln!("{}", e);
			exit(1);
		}
		exit(0);
	}

	// There is no scheduler here; without a subtool, loading the manifest
	// is all there is to do.
	println!(
		"loaded {} edges and {} default targets from {:?}",
		state.edges.len(),
		state.defaults().len(),
		opt.file
	);
}
