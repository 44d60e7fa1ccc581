// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types shared by reporter implementations.

use thiserror::Error;

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors a reporting client can surface from a capture.
#[derive(Debug, Error)]
pub enum CaptureError {
	/// The client has been shut down and no longer accepts events.
	#[error("reporting client has been shut down")]
	ClientShutdown,

	/// The client backend rejected or failed to accept the event.
	#[error("reporting backend error: {message}")]
	Backend {
		/// Human-readable failure description.
		message: String,
	},

	/// Failed to serialize event data.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Unknown report level name.
	#[error("invalid report level: {0}")]
	InvalidLevel(String),
}
