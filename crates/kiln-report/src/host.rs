// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host-supplied context for option derivation.

use kiln_common_secret::SecretString;

/// What the host service passes in place of global framework settings.
///
/// The integration never reaches into process-global state; everything it
/// derives options from arrives through this struct.
#[derive(Debug, Clone, Default)]
pub struct HostContext {
	/// Names of the modules registered with the host, merged into the
	/// client's in-app include paths.
	pub installed_modules: Vec<String>,
	/// The host's own secret key; used to derive a client signing key when
	/// none is configured.
	pub secret_key: Option<SecretString>,
}

impl HostContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_modules(mut self, modules: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.installed_modules = modules.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_secret_key(mut self, secret_key: impl Into<SecretString>) -> Self {
		self.secret_key = Some(secret_key.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_collects_modules() {
		let host = HostContext::new().with_modules(["kiln_server", "kiln_server_scm"]);
		assert_eq!(host.installed_modules, vec!["kiln_server", "kiln_server_scm"]);
		assert!(host.secret_key.is_none());
	}

	#[test]
	fn debug_redacts_secret_key() {
		let host = HostContext::new().with_secret_key("top-secret");
		assert!(!format!("{host:?}").contains("top-secret"));
	}
}
