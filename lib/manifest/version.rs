//! The `ninja_required_version` guard.

use log::{error, warn};
use std::process::exit;

/// The version of the manifest language this parser implements.
pub const SUPPORTED_VERSION: &str = "1.8.2";

/// Extract the major and minor version from a `MAJOR.MINOR[.PATCH]` string.
/// Missing or non-numeric parts read as zero.
pub fn parse_version(version: &str) -> (u32, u32) {
	let mut parts = version.split('.');
	let part = |p: Option<&str>| p.and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(0);
	(part(parts.next()), part(parts.next()))
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VersionCheck {
	Ok,
	/// Same major version, but the manifest asks for a newer minor.
	FutureMinor,
	/// The manifest requires a newer major version.
	Incompatible,
}

pub fn compare_versions(required: &str, current: &str) -> VersionCheck {
	let (req_major, req_minor) = parse_version(required);
	let (cur_major, cur_minor) = parse_version(current);
	if req_major > cur_major {
		VersionCheck::Incompatible
	} else if req_major == cur_major && req_minor > cur_minor {
		VersionCheck::FutureMinor
	} else {
		VersionCheck::Ok
	}
}

/// Check a `ninja_required_version` binding against [`SUPPORTED_VERSION`].
///
/// An incompatible major version is fatal: the process exits immediately,
/// before acting on any more of the manifest.
pub fn check_version(required: &str) {
	match compare_versions(required, SUPPORTED_VERSION) {
		VersionCheck::Ok => {}
		VersionCheck::FutureMinor => warn!(
			"manifest requires version {}; this is version {}",
			required, SUPPORTED_VERSION
		),
		VersionCheck::Incompatible => {
			error!(
				"manifest requires version {}, which is newer than version {}",
				required, SUPPORTED_VERSION
			);
			exit(1);
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn parse() {
		assert_eq!(parse_version("1.8.2"), (1, 8));
		assert_eq!(parse_version("1.8"), (1, 8));
		assert_eq!(parse_version("2"), (2, 0));
		assert_eq!(parse_version(""), (0, 0));
		assert_eq!(parse_version("pony"), (0, 0));
	}

	#[test]
	fn compare() {
		assert_eq!(compare_versions("1.5", "1.8.2"), VersionCheck::Ok);
		assert_eq!(compare_versions("1.8", "1.8.2"), VersionCheck::Ok);
		assert_eq!(compare_versions("1.9", "1.8.2"), VersionCheck::FutureMinor);
		assert_eq!(compare_versions("2.0", "1.8.2"), VersionCheck::Incompatible);
		assert_eq!(compare_versions("1.0", "2.0"), VersionCheck::Ok);
	}
}
