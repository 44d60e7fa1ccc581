// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process exception signal.
//!
//! The host owns an [`ExceptionSignal`] and emits on it wherever an unhandled
//! failure surfaces (the request middleware in this crate is one producer).
//! The integration connects capture handlers to it. Handlers are isolated
//! from each other: a panicking handler is contained and logged, and the
//! remaining handlers still run.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use kiln_report_core::{ExceptionInfo, RequestContext};
use tracing::error;

/// A subscriber on the exception signal.
#[async_trait]
pub trait ExceptionHandler: Send + Sync {
	async fn handle_exception(
		&self,
		exception: &ExceptionInfo,
		request: Option<&RequestContext>,
	);
}

/// Publish/subscribe hook for unhandled exceptions.
pub struct ExceptionSignal {
	handlers: RwLock<Vec<Arc<dyn ExceptionHandler>>>,
}

impl ExceptionSignal {
	pub fn new() -> Self {
		Self {
			handlers: RwLock::new(Vec::new()),
		}
	}

	/// Attach a handler. Handlers run in connection order on every emit.
	pub fn connect(&self, handler: Arc<dyn ExceptionHandler>) {
		self.handlers
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.push(handler);
	}

	/// Number of connected handlers.
	pub fn handler_count(&self) -> usize {
		self.handlers
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.len()
	}

	/// Deliver an exception to every connected handler.
	pub async fn emit(&self, exception: &ExceptionInfo, request: Option<&RequestContext>) {
		let handlers: Vec<Arc<dyn ExceptionHandler>> = {
			self.handlers
				.read()
				.unwrap_or_else(PoisonError::into_inner)
				.clone()
		};

		for handler in handlers {
			let outcome = std::panic::AssertUnwindSafe(handler.handle_exception(exception, request))
				.catch_unwind()
				.await;
			if outcome.is_err() {
				error!(
					exception = %exception.qualified_name(),
					"Exception handler panicked"
				);
			}
		}
	}
}

impl Default for ExceptionSignal {
	fn default() -> Self {
		Self::new()
	}
}
