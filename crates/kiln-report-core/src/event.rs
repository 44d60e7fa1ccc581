// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Exception and request descriptions handed to reporting clients.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Description of a captured exception.
///
/// This is the unit of work handed to a [`Reporter`](crate::Reporter): the
/// Rust rendition of an `(exception type, value, traceback)` triple. How the
/// backtrace text is parsed or serialized is the client's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
	/// Bare type name, e.g. `TimeoutError`.
	pub type_name: String,
	/// Module path the type lives in, e.g. `kiln_server::scm`.
	pub module: Option<String>,
	/// Human-readable message.
	pub message: String,
	/// Raw backtrace text, when one was captured.
	pub backtrace: Option<String>,
}

impl ExceptionInfo {
	/// Create an exception description from a bare type name and message.
	pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			type_name: type_name.into(),
			module: None,
			message: message.into(),
			backtrace: None,
		}
	}

	/// Build an exception description from an error value.
	///
	/// The module path is derived from the concrete error type's fully
	/// qualified name.
	pub fn from_error<E: std::error::Error>(error: &E) -> Self {
		let full = std::any::type_name::<E>();
		let (module, type_name) = match full.rfind("::") {
			Some(idx) => (Some(full[..idx].to_string()), full[idx + 2..].to_string()),
			None => (None, full.to_string()),
		};
		Self {
			type_name,
			module,
			message: error.to_string(),
			backtrace: None,
		}
	}

	/// Build an exception description from a panic payload.
	///
	/// Panic payloads are `&str` or `String` in practice; anything else is
	/// reported with a placeholder message.
	pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|s| (*s).to_string())
			.or_else(|| payload.downcast_ref::<String>().cloned())
			.unwrap_or_else(|| "unknown panic payload".to_string());
		Self {
			type_name: "panic".to_string(),
			module: None,
			message,
			backtrace: None,
		}
	}

	/// Attach raw backtrace text.
	pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
		self.backtrace = Some(backtrace.into());
		self
	}

	/// Attach a module path.
	pub fn with_module(mut self, module: impl Into<String>) -> Self {
		self.module = Some(module.into());
		self
	}

	/// Fully qualified `module::Type` name, or the bare type name when no
	/// module is known.
	pub fn qualified_name(&self) -> String {
		match &self.module {
			Some(module) => format!("{module}::{}", self.type_name),
			None => self.type_name.clone(),
		}
	}
}

/// HTTP request context attached to server-side captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
	pub url: Option<String>,
	pub method: Option<String>,
	pub headers: HashMap<String, String>,
	pub query_string: Option<String>,
}

impl Default for RequestContext {
	fn default() -> Self {
		Self {
			url: None,
			method: None,
			headers: HashMap::new(),
			query_string: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, thiserror::Error)]
	#[error("disk is full")]
	struct DiskFull;

	#[test]
	fn from_error_splits_module_and_type() {
		let info = ExceptionInfo::from_error(&DiskFull);
		assert_eq!(info.type_name, "DiskFull");
		let module = info.module.as_deref().unwrap();
		assert!(module.ends_with("event::tests"), "module was {module}");
		assert_eq!(info.message, "disk is full");
	}

	#[test]
	fn qualified_name_joins_with_double_colon() {
		let info = ExceptionInfo::new("TimeoutError", "took too long").with_module("kiln_server::scm");
		assert_eq!(info.qualified_name(), "kiln_server::scm::TimeoutError");
	}

	#[test]
	fn qualified_name_without_module_is_bare() {
		let info = ExceptionInfo::new("TimeoutError", "took too long");
		assert_eq!(info.qualified_name(), "TimeoutError");
	}

	#[test]
	fn from_panic_reads_str_payload() {
		let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
		let info = ExceptionInfo::from_panic(payload.as_ref());
		assert_eq!(info.type_name, "panic");
		assert_eq!(info.message, "boom");
	}

	#[test]
	fn from_panic_reads_string_payload() {
		let payload: Box<dyn std::any::Any + Send> = Box::new("boom owned".to_string());
		let info = ExceptionInfo::from_panic(payload.as_ref());
		assert_eq!(info.message, "boom owned");
	}

	#[test]
	fn from_panic_handles_opaque_payload() {
		let payload: Box<dyn std::any::Any + Send> = Box::new(42_u32);
		let info = ExceptionInfo::from_panic(payload.as_ref());
		assert_eq!(info.message, "unknown panic payload");
	}
}
