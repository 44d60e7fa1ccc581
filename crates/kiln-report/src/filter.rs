// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ignore-list matching for captured exceptions.

use std::collections::HashSet;

use kiln_report_core::ExceptionInfo;

/// Compiled ignore list.
///
/// A pattern matches an exception when it equals the bare type name, equals
/// the fully qualified `module::Type` name, or ends in `*` and is a prefix of
/// the qualified name.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
	exact: HashSet<String>,
	prefixes: Vec<String>,
}

impl IgnoreList {
	pub fn new(patterns: &[String]) -> Self {
		let mut exact = HashSet::new();
		let mut prefixes = Vec::new();
		for pattern in patterns {
			match pattern.strip_suffix('*') {
				Some(prefix) => prefixes.push(prefix.to_string()),
				None => {
					exact.insert(pattern.clone());
				}
			}
		}
		Self { exact, prefixes }
	}

	pub fn is_empty(&self) -> bool {
		self.exact.is_empty() && self.prefixes.is_empty()
	}

	/// Whether the exception should be dropped instead of captured.
	pub fn matches(&self, exception: &ExceptionInfo) -> bool {
		if self.exact.contains(&exception.type_name) {
			return true;
		}
		let qualified = exception.qualified_name();
		if self.exact.contains(&qualified) {
			return true;
		}
		self.prefixes.iter().any(|p| qualified.starts_with(p))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn patterns(raw: &[&str]) -> Vec<String> {
		raw.iter().map(|s| s.to_string()).collect()
	}

	fn exception(module: &str, type_name: &str) -> ExceptionInfo {
		ExceptionInfo::new(type_name, "boom").with_module(module)
	}

	#[test]
	fn empty_list_matches_nothing() {
		let list = IgnoreList::new(&[]);
		assert!(list.is_empty());
		assert!(!list.matches(&exception("kiln_server::scm", "TimeoutError")));
	}

	#[test]
	fn bare_type_name_matches() {
		let list = IgnoreList::new(&patterns(&["TimeoutError"]));
		assert!(list.matches(&exception("kiln_server::scm", "TimeoutError")));
		assert!(!list.matches(&exception("kiln_server::scm", "DiskFull")));
	}

	#[test]
	fn qualified_name_matches() {
		let list = IgnoreList::new(&patterns(&["kiln_server::scm::TimeoutError"]));
		assert!(list.matches(&exception("kiln_server::scm", "TimeoutError")));
		// Same type name under a different module does not match.
		assert!(!list.matches(&exception("kiln_server::auth", "TimeoutError")));
	}

	#[test]
	fn wildcard_matches_qualified_prefix() {
		let list = IgnoreList::new(&patterns(&["kiln_server::auth::*"]));
		assert!(list.matches(&exception("kiln_server::auth", "TokenExpired")));
		assert!(list.matches(&exception("kiln_server::auth::oauth", "StateMismatch")));
		assert!(!list.matches(&exception("kiln_server::scm", "TokenExpired")));
	}

	#[test]
	fn wildcard_does_not_match_bare_name_prefix() {
		// The prefix is tested against the qualified name only.
		let list = IgnoreList::new(&patterns(&["Timeout*"]));
		assert!(!list.matches(&exception("kiln_server::scm", "TimeoutError")));
		assert!(list.matches(&ExceptionInfo::new("TimeoutError", "boom")));
	}

	#[test]
	fn lone_star_matches_everything() {
		let list = IgnoreList::new(&patterns(&["*"]));
		assert!(list.matches(&exception("kiln_server::scm", "TimeoutError")));
		assert!(list.matches(&ExceptionInfo::new("DiskFull", "boom")));
	}

	proptest! {
		#[test]
		fn listed_type_name_always_matches(
			module in "[a-z_]{1,12}(::[a-z_]{1,12}){0,3}",
			type_name in "[A-Z][A-Za-z]{1,20}",
		) {
			let list = IgnoreList::new(&[type_name.clone()]);
			prop_assert!(list.matches(&exception(&module, &type_name)));
		}

		#[test]
		fn module_wildcard_always_matches_types_under_it(
			module in "[a-z_]{1,12}(::[a-z_]{1,12}){0,3}",
			type_name in "[A-Z][A-Za-z]{1,20}",
		) {
			let list = IgnoreList::new(&[format!("{module}::*")]);
			prop_assert!(list.matches(&exception(&module, &type_name)));
		}
	}
}
