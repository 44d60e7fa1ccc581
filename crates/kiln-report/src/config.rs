// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reporting configuration section.
//!
//! Layered loading in the standard precedence order (highest to lowest):
//!
//! 1. Environment variables (`KILN_REPORT_*`)
//! 2. Config file (`/etc/kiln/report.toml`)
//! 3. Built-in defaults
//!
//! Every key maps onto a client construction option (see
//! [`build_reporter_options`](crate::options::build_reporter_options)) except
//! the integration-control keys `enabled`, `client`, `ignore_exceptions`,
//! `jobs_enabled` and `jobs_min_level`.

use std::path::{Path, PathBuf};

use kiln_common_secret::{load_secret_env, SecretString};
use kiln_report_core::ReportLevel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::registry::DEFAULT_FACTORY;

const SYSTEM_CONFIG_PATH: &str = "/etc/kiln/report.toml";

/// Partial configuration from a single source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportConfigLayer {
	pub enabled: Option<bool>,
	pub client: Option<String>,
	pub servers: Option<Vec<String>>,
	pub include_paths: Option<Vec<String>>,
	pub exclude_paths: Option<Vec<String>>,
	pub timeout_secs: Option<u64>,
	pub name: Option<String>,
	pub auto_log_stacks: Option<bool>,
	pub key: Option<String>,
	pub string_max_length: Option<usize>,
	pub list_max_length: Option<usize>,
	pub site: Option<String>,
	pub public_key: Option<String>,
	pub secret_key: Option<SecretString>,
	pub project: Option<String>,
	pub processors: Option<Vec<String>>,
	pub dsn: Option<SecretString>,
	pub context: Option<serde_json::Map<String, serde_json::Value>>,
	pub release: Option<String>,
	pub ignore_exceptions: Option<Vec<String>>,
	pub jobs_enabled: Option<bool>,
	pub jobs_min_level: Option<ReportLevel>,
}

impl ReportConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.client.is_some() {
			self.client = other.client;
		}
		if other.servers.is_some() {
			self.servers = other.servers;
		}
		if other.include_paths.is_some() {
			self.include_paths = other.include_paths;
		}
		if other.exclude_paths.is_some() {
			self.exclude_paths = other.exclude_paths;
		}
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.name.is_some() {
			self.name = other.name;
		}
		if other.auto_log_stacks.is_some() {
			self.auto_log_stacks = other.auto_log_stacks;
		}
		if other.key.is_some() {
			self.key = other.key;
		}
		if other.string_max_length.is_some() {
			self.string_max_length = other.string_max_length;
		}
		if other.list_max_length.is_some() {
			self.list_max_length = other.list_max_length;
		}
		if other.site.is_some() {
			self.site = other.site;
		}
		if other.public_key.is_some() {
			self.public_key = other.public_key;
		}
		if other.secret_key.is_some() {
			self.secret_key = other.secret_key;
		}
		if other.project.is_some() {
			self.project = other.project;
		}
		if other.processors.is_some() {
			self.processors = other.processors;
		}
		if other.dsn.is_some() {
			self.dsn = other.dsn;
		}
		if other.context.is_some() {
			self.context = other.context;
		}
		if other.release.is_some() {
			self.release = other.release;
		}
		if other.ignore_exceptions.is_some() {
			self.ignore_exceptions = other.ignore_exceptions;
		}
		if other.jobs_enabled.is_some() {
			self.jobs_enabled = other.jobs_enabled;
		}
		if other.jobs_min_level.is_some() {
			self.jobs_min_level = other.jobs_min_level;
		}
	}

	pub fn finalize(self) -> ReportConfig {
		ReportConfig {
			enabled: self.enabled.unwrap_or(true),
			client: self.client.unwrap_or_else(|| DEFAULT_FACTORY.to_string()),
			servers: self.servers.unwrap_or_default(),
			include_paths: self.include_paths.unwrap_or_default(),
			exclude_paths: self.exclude_paths.unwrap_or_default(),
			timeout_secs: self.timeout_secs,
			name: self.name,
			auto_log_stacks: self.auto_log_stacks.unwrap_or(false),
			key: self.key,
			string_max_length: self.string_max_length,
			list_max_length: self.list_max_length,
			site: self.site,
			public_key: self.public_key,
			secret_key: self.secret_key,
			project: self.project,
			processors: self.processors.unwrap_or_default(),
			dsn: self.dsn,
			context: self.context.unwrap_or_default(),
			release: self.release,
			ignore_exceptions: self.ignore_exceptions.unwrap_or_default(),
			jobs_enabled: self.jobs_enabled.unwrap_or(false),
			jobs_min_level: self.jobs_min_level.unwrap_or(ReportLevel::Error),
		}
	}
}

/// Fully resolved reporting configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
	/// Whether the integration installs any handlers at all.
	pub enabled: bool,
	/// Name of the reporter factory to construct the client with.
	pub client: String,
	pub servers: Vec<String>,
	pub include_paths: Vec<String>,
	pub exclude_paths: Vec<String>,
	pub timeout_secs: Option<u64>,
	pub name: Option<String>,
	pub auto_log_stacks: bool,
	pub key: Option<String>,
	pub string_max_length: Option<usize>,
	pub list_max_length: Option<usize>,
	pub site: Option<String>,
	pub public_key: Option<String>,
	pub secret_key: Option<SecretString>,
	pub project: Option<String>,
	pub processors: Vec<String>,
	pub dsn: Option<SecretString>,
	pub context: serde_json::Map<String, serde_json::Value>,
	pub release: Option<String>,
	/// Exception names never forwarded to the client. Exact bare name, exact
	/// `module::Type` name, or a `prefix*` pattern matched against the
	/// qualified name.
	pub ignore_exceptions: Vec<String>,
	/// Whether to also report background job failures.
	pub jobs_enabled: bool,
	/// Minimum job failure level that gets reported.
	pub jobs_min_level: ReportLevel,
}

impl Default for ReportConfig {
	fn default() -> Self {
		ReportConfigLayer::default().finalize()
	}
}

/// Load configuration from all sources with standard precedence.
pub fn load_config() -> Result<ReportConfig, ConfigError> {
	load_config_with_file(SYSTEM_CONFIG_PATH)
}

/// Load configuration from environment only (for testing or simple
/// deployments).
pub fn load_config_from_env() -> Result<ReportConfig, ConfigError> {
	let mut merged = ReportConfigLayer::default();
	merged.merge(load_env_layer()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<PathBuf>,
) -> Result<ReportConfig, ConfigError> {
	let mut merged = ReportConfigLayer::default();
	merged.merge(load_file_layer(&config_path.into())?);
	merged.merge(load_env_layer()?);
	finalize(merged)
}

fn finalize(layer: ReportConfigLayer) -> Result<ReportConfig, ConfigError> {
	let config = layer.finalize();
	validate_config(&config)?;

	info!(
		enabled = config.enabled,
		client = %config.client,
		dsn_configured = config.dsn.is_some(),
		ignored = config.ignore_exceptions.len(),
		jobs_enabled = config.jobs_enabled,
		"Reporting configuration loaded"
	);

	Ok(config)
}

fn validate_config(config: &ReportConfig) -> Result<(), ConfigError> {
	if config.client.trim().is_empty() {
		return Err(ConfigError::Validation(
			"client must name a registered reporter factory".to_string(),
		));
	}

	if config.string_max_length == Some(0) {
		return Err(ConfigError::Validation(
			"string_max_length must be at least 1".to_string(),
		));
	}

	Ok(())
}

fn load_file_layer(path: &Path) -> Result<ReportConfigLayer, ConfigError> {
	if !path.exists() {
		debug!(path = %path.display(), "config file not found, skipping");
		return Ok(ReportConfigLayer::default());
	}

	debug!(path = %path.display(), "loading config file");
	let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
		path: path.to_path_buf(),
		source: e,
	})?;

	toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
		path: path.to_path_buf(),
		source: e,
	})
}

fn load_env_layer() -> Result<ReportConfigLayer, ConfigError> {
	debug!("loading environment variables");

	let jobs_min_level = match env_var("KILN_REPORT_JOBS_MIN_LEVEL") {
		Some(v) => Some(
			v.parse::<ReportLevel>()
				.map_err(|_| ConfigError::InvalidValue {
					key: "KILN_REPORT_JOBS_MIN_LEVEL".to_string(),
					message: format!("unknown level '{v}'"),
				})?,
		),
		None => None,
	};

	let context = match env_var("KILN_REPORT_CONTEXT") {
		Some(json) => Some(
			serde_json::from_str(&json).map_err(|e| ConfigError::InvalidValue {
				key: "KILN_REPORT_CONTEXT".to_string(),
				message: format!("invalid JSON object: {e}"),
			})?,
		),
		None => None,
	};

	Ok(ReportConfigLayer {
		enabled: env_bool("KILN_REPORT_ENABLED"),
		client: env_var("KILN_REPORT_CLIENT"),
		servers: env_list("KILN_REPORT_SERVERS"),
		include_paths: env_list("KILN_REPORT_INCLUDE_PATHS"),
		exclude_paths: env_list("KILN_REPORT_EXCLUDE_PATHS"),
		timeout_secs: env_u64("KILN_REPORT_TIMEOUT_SECS")?,
		name: env_var("KILN_REPORT_NAME"),
		auto_log_stacks: env_bool("KILN_REPORT_AUTO_LOG_STACKS"),
		key: env_var("KILN_REPORT_KEY"),
		string_max_length: env_usize("KILN_REPORT_STRING_MAX_LENGTH")?,
		list_max_length: env_usize("KILN_REPORT_LIST_MAX_LENGTH")?,
		site: env_var("KILN_REPORT_SITE"),
		public_key: env_var("KILN_REPORT_PUBLIC_KEY"),
		secret_key: load_secret_env("KILN_REPORT_SECRET_KEY")
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
		project: env_var("KILN_REPORT_PROJECT"),
		processors: env_list("KILN_REPORT_PROCESSORS"),
		dsn: load_secret_env("KILN_REPORT_DSN").map_err(|e| ConfigError::Secret(e.to_string()))?,
		context,
		release: env_var("KILN_REPORT_RELEASE"),
		ignore_exceptions: env_list("KILN_REPORT_IGNORE_EXCEPTIONS"),
		jobs_enabled: env_bool("KILN_REPORT_JOBS_ENABLED"),
		jobs_min_level,
	})
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	})
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}
