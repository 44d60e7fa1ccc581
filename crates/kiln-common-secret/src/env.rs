// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Helpers for loading secrets from environment variables.
//!
//! Every secret variable `NAME` also accepts a `NAME_FILE` companion pointing
//! at a file whose contents (minus a trailing newline) become the secret.
//! This is the conventional shape for container secret mounts.

use std::path::PathBuf;

use thiserror::Error;

use crate::SecretString;

/// Errors from [`load_secret_env`].
#[derive(Debug, Error)]
pub enum SecretEnvError {
	/// Both `NAME` and `NAME_FILE` are set.
	#[error("both {name} and {name}_FILE are set; remove one")]
	Conflict {
		/// Base variable name.
		name: String,
	},

	/// The `NAME_FILE` target could not be read.
	#[error("failed to read secret file {path}: {source}")]
	FileRead {
		/// Path from `NAME_FILE`.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},
}

/// Errors from [`require_secret_env`].
#[derive(Debug, Error)]
pub enum RequiredSecretError {
	/// Neither `NAME` nor `NAME_FILE` is set.
	#[error("required secret {name} is not set (checked {name} and {name}_FILE)")]
	Missing {
		/// Base variable name.
		name: String,
	},

	/// Loading failed.
	#[error(transparent)]
	Env(#[from] SecretEnvError),
}

/// Load an optional secret from `name` or `name_FILE`.
///
/// Returns `Ok(None)` when neither variable is set or the value is empty.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let direct = std::env::var(name).ok().filter(|v| !v.is_empty());
	let file_var = format!("{name}_FILE");
	let file = std::env::var(&file_var).ok().filter(|v| !v.is_empty());

	match (direct, file) {
		(Some(_), Some(_)) => Err(SecretEnvError::Conflict {
			name: name.to_string(),
		}),
		(Some(value), None) => Ok(Some(SecretString::from(value))),
		(None, Some(path)) => {
			let path = PathBuf::from(path);
			let contents =
				std::fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
					path: path.clone(),
					source,
				})?;
			let trimmed = contents.trim_end_matches(['\r', '\n']);
			if trimmed.is_empty() {
				Ok(None)
			} else {
				Ok(Some(SecretString::from(trimmed)))
			}
		}
		(None, None) => Ok(None),
	}
}

/// Load a mandatory secret from `name` or `name_FILE`.
pub fn require_secret_env(name: &str) -> Result<SecretString, RequiredSecretError> {
	load_secret_env(name)?.ok_or_else(|| RequiredSecretError::Missing {
		name: name.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn missing_returns_none() {
		let loaded = load_secret_env("KILN_TEST_SECRET_MISSING").unwrap();
		assert!(loaded.is_none());
	}

	#[test]
	fn direct_value_wins() {
		std::env::set_var("KILN_TEST_SECRET_DIRECT", "plain");
		let loaded = load_secret_env("KILN_TEST_SECRET_DIRECT").unwrap().unwrap();
		assert_eq!(loaded.expose_secret(), "plain");
		std::env::remove_var("KILN_TEST_SECRET_DIRECT");
	}

	#[test]
	fn file_value_trims_trailing_newline() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "from-file").unwrap();
		std::env::set_var("KILN_TEST_SECRET_FROMFILE_FILE", file.path());

		let loaded = load_secret_env("KILN_TEST_SECRET_FROMFILE").unwrap().unwrap();
		assert_eq!(loaded.expose_secret(), "from-file");
		std::env::remove_var("KILN_TEST_SECRET_FROMFILE_FILE");
	}

	#[test]
	fn conflicting_sources_rejected() {
		let file = tempfile::NamedTempFile::new().unwrap();
		std::env::set_var("KILN_TEST_SECRET_BOTH", "plain");
		std::env::set_var("KILN_TEST_SECRET_BOTH_FILE", file.path());

		let err = load_secret_env("KILN_TEST_SECRET_BOTH").unwrap_err();
		assert!(matches!(err, SecretEnvError::Conflict { .. }));

		std::env::remove_var("KILN_TEST_SECRET_BOTH");
		std::env::remove_var("KILN_TEST_SECRET_BOTH_FILE");
	}

	#[test]
	fn unreadable_file_is_an_error() {
		std::env::set_var("KILN_TEST_SECRET_NOFILE_FILE", "/nonexistent/secret");
		let err = load_secret_env("KILN_TEST_SECRET_NOFILE").unwrap_err();
		assert!(matches!(err, SecretEnvError::FileRead { .. }));
		std::env::remove_var("KILN_TEST_SECRET_NOFILE_FILE");
	}

	#[test]
	fn require_reports_missing() {
		let err = require_secret_env("KILN_TEST_SECRET_REQUIRED").unwrap_err();
		assert!(matches!(err, RequiredSecretError::Missing { .. }));
	}
}
