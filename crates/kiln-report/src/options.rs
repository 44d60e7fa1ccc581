// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Derivation of client options from host configuration.

use std::collections::BTreeSet;
use std::time::Duration;

use kiln_common_secret::SecretString;
use kiln_report_core::ReporterOptions;
use sha2::{Digest, Sha256};

use crate::config::ReportConfig;
use crate::host::HostContext;

/// Build the client construction options for a configuration.
///
/// Every configured key is forwarded verbatim, with two derivations:
///
/// - `include_paths` is the union of the configured paths and the host's
///   registered module names
/// - `key` falls back to a digest of the host secret key when unset
pub fn build_reporter_options(config: &ReportConfig, host: &HostContext) -> ReporterOptions {
	let mut include_paths: BTreeSet<String> = config.include_paths.iter().cloned().collect();
	include_paths.extend(host.installed_modules.iter().cloned());

	let key = config
		.key
		.clone()
		.or_else(|| host.secret_key.as_ref().map(derive_key));

	ReporterOptions {
		servers: config.servers.clone(),
		include_paths,
		exclude_paths: config.exclude_paths.clone(),
		timeout: config.timeout_secs.map(Duration::from_secs),
		name: config.name.clone(),
		auto_log_stacks: config.auto_log_stacks,
		key,
		string_max_length: config.string_max_length,
		list_max_length: config.list_max_length,
		site: config.site.clone(),
		public_key: config.public_key.clone(),
		secret_key: config.secret_key.clone(),
		project: config.project.clone(),
		processors: config.processors.clone(),
		dsn: config.dsn.clone(),
		context: config.context.clone(),
		release: config.release.clone(),
	}
}

/// Derive a signing key from the host secret key.
fn derive_key(secret_key: &SecretString) -> String {
	hex::encode(Sha256::digest(secret_key.expose_secret().as_bytes()))
}
