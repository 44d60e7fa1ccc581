// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The reporting client contract and the built-in log-backed client.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::error;
use uuid::Uuid;

use crate::error::Result;
use crate::event::{ExceptionInfo, RequestContext};
use crate::options::ReporterOptions;

/// Unique ID of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// A reporting client.
///
/// Implementations deliver one captured exception to wherever they deliver
/// things. The integration never assumes anything about delivery beyond this
/// contract; it catches both errors and panics from implementations.
#[async_trait]
pub trait Reporter: Send + Sync {
	/// Deliver a captured exception, optionally with the request it occurred
	/// under. Returns the ID assigned to the event.
	async fn capture_exception(
		&self,
		exception: &ExceptionInfo,
		request: Option<&RequestContext>,
	) -> Result<EventId>;
}

/// Built-in client that writes captures to the structured log stream.
///
/// This is the fallback used when a configured client cannot be resolved, and
/// a reasonable default for development environments. It never fails.
pub struct LogReporter {
	options: ReporterOptions,
}

impl LogReporter {
	pub fn new(options: ReporterOptions) -> Self {
		Self { options }
	}

	/// Truncate a message to the configured maximum string length.
	fn clip<'a>(&self, message: &'a str) -> &'a str {
		match self.options.string_max_length {
			Some(max) => match message.char_indices().nth(max) {
				Some((idx, _)) => &message[..idx],
				None => message,
			},
			None => message,
		}
	}
}

#[async_trait]
impl Reporter for LogReporter {
	async fn capture_exception(
		&self,
		exception: &ExceptionInfo,
		request: Option<&RequestContext>,
	) -> Result<EventId> {
		let event_id = EventId::new();
		error!(
			event_id = %event_id,
			exception = %exception.qualified_name(),
			server_name = self.options.name.as_deref(),
			site = self.options.site.as_deref(),
			release = self.options.release.as_deref(),
			project = self.options.project.as_deref(),
			url = request.and_then(|r| r.url.as_deref()),
			method = request.and_then(|r| r.method.as_deref()),
			"Captured exception: {}",
			self.clip(&exception.message)
		);
		Ok(event_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[tokio::test]
	async fn capture_returns_fresh_event_ids() {
		let reporter = LogReporter::new(ReporterOptions::default());
		let info = ExceptionInfo::new("TimeoutError", "took too long");
		let first = reporter.capture_exception(&info, None).await.unwrap();
		let second = reporter.capture_exception(&info, None).await.unwrap();
		assert_ne!(first, second);
	}

	#[tokio::test]
	async fn capture_accepts_request_context() {
		let reporter = LogReporter::new(ReporterOptions::default());
		let info = ExceptionInfo::new("TimeoutError", "took too long");
		let request = RequestContext {
			url: Some("https://kiln.example.com/threads".to_string()),
			method: Some("POST".to_string()),
			..Default::default()
		};
		assert!(reporter.capture_exception(&info, Some(&request)).await.is_ok());
	}

	#[test]
	fn clip_respects_char_boundaries() {
		let reporter = LogReporter::new(ReporterOptions {
			string_max_length: Some(3),
			..Default::default()
		});
		assert_eq!(reporter.clip("héllo"), "hél");
		assert_eq!(reporter.clip("hi"), "hi");
	}

	proptest! {
		#[test]
		fn event_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let id = EventId(Uuid::from_bytes(uuid_bytes));
			let s = id.to_string();
			let parsed: EventId = s.parse().unwrap();
			prop_assert_eq!(id, parsed);
		}
	}
}
