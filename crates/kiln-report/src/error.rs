// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the reporting integration.

use std::path::PathBuf;

use kiln_report_core::CaptureError;
use thiserror::Error;

/// Result type alias for integration operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors from resolving or constructing reporting clients.
#[derive(Debug, Error)]
pub enum ReportError {
	/// No factory is registered under the configured name.
	#[error("unknown reporter factory: {name}")]
	UnknownFactory {
		/// Configured factory name.
		name: String,
	},

	/// The factory was found but failed to construct a client.
	#[error("reporter factory '{name}' failed: {source}")]
	Factory {
		/// Configured factory name.
		name: String,
		/// Construction failure.
		#[source]
		source: CaptureError,
	},
}

/// Errors from loading the reporting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Config file exists but could not be read.
	#[error("failed to read config file {path}: {source}")]
	FileRead {
		/// File path.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// Config file is not valid TOML for the expected shape.
	#[error("failed to parse config file {path}: {source}")]
	TomlParse {
		/// File path.
		path: PathBuf,
		/// Underlying parse error.
		#[source]
		source: toml::de::Error,
	},

	/// An environment variable holds an unusable value.
	#[error("invalid value for {key}: {message}")]
	InvalidValue {
		/// Variable or field name.
		key: String,
		/// What was wrong with it.
		message: String,
	},

	/// Secret loading failed.
	#[error("secret error: {0}")]
	Secret(String),

	/// Cross-field validation failed.
	#[error("invalid configuration: {0}")]
	Validation(String),
}
