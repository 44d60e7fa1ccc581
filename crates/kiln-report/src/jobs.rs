// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background job failure reporting.
//!
//! Hosts with a job scheduler emit [`JobFailure`] events on a [`JobSignal`];
//! the integration attaches a capture handler to it when `jobs_enabled` is
//! configured. Failures below the configured minimum level are skipped.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use kiln_report_core::{ExceptionInfo, ReportLevel};
use tracing::{debug, error};

use crate::config::ReportConfig;
use crate::handle::ReporterHandle;

/// A failed background job run.
#[derive(Debug, Clone)]
pub struct JobFailure {
	/// Identifier of the job that failed.
	pub job_id: String,
	/// Severity assigned by the scheduler.
	pub level: ReportLevel,
	/// What went wrong.
	pub exception: ExceptionInfo,
}

/// A subscriber on the job failure signal.
#[async_trait]
pub trait JobFailureHandler: Send + Sync {
	async fn handle_failure(&self, failure: &JobFailure);
}

/// Publish/subscribe hook for background job failures.
pub struct JobSignal {
	handlers: RwLock<Vec<Arc<dyn JobFailureHandler>>>,
}

impl JobSignal {
	pub fn new() -> Self {
		Self {
			handlers: RwLock::new(Vec::new()),
		}
	}

	/// Attach a handler.
	pub fn connect(&self, handler: Arc<dyn JobFailureHandler>) {
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

	/// Deliver a failure to every connected handler.
	pub async fn emit(&self, failure: &JobFailure) {
		let handlers: Vec<Arc<dyn JobFailureHandler>> = {
			self.handlers
				.read()
				.unwrap_or_else(PoisonError::into_inner)
				.clone()
		};

		for handler in handlers {
			let outcome = std::panic::AssertUnwindSafe(handler.handle_failure(failure))
				.catch_unwind()
				.await;
			if outcome.is_err() {
				error!(job_id = %failure.job_id, "Job failure handler panicked");
			}
		}
	}
}

impl Default for JobSignal {
	fn default() -> Self {
		Self::new()
	}
}

struct CaptureJobHandler {
	handle: Arc<ReporterHandle>,
	min_level: ReportLevel,
}

#[async_trait]
impl JobFailureHandler for CaptureJobHandler {
	async fn handle_failure(&self, failure: &JobFailure) {
		if failure.level < self.min_level {
			debug!(
				job_id = %failure.job_id,
				level = %failure.level,
				"Job failure below reporting level, skipping"
			);
			return;
		}

		let reporter = self.handle.get();
		let capture = std::panic::AssertUnwindSafe(
			reporter.capture_exception(&failure.exception, None),
		)
		.catch_unwind()
		.await;

		match capture {
			Ok(Ok(event_id)) => {
				debug!(
					event_id = %event_id,
					job_id = %failure.job_id,
					"Job failure captured"
				);
			}
			Ok(Err(err)) => {
				error!(
					job_id = %failure.job_id,
					error = %err,
					"Unable to report job failure"
				);
			}
			Err(_) => {
				eprintln!(
					"kiln-report: reporting client panicked while capturing job failure {}",
					failure.job_id
				);
			}
		}
	}
}

/// Connect the job failure handler when the configuration asks for it.
///
/// Returns whether a handler was attached.
pub fn register_job_handlers(
	signal: &JobSignal,
	handle: Arc<ReporterHandle>,
	config: &ReportConfig,
) -> bool {
	if !config.jobs_enabled {
		debug!("Job failure reporting disabled");
		return false;
	}

	signal.connect(Arc::new(CaptureJobHandler {
		handle,
		min_level: config.jobs_min_level,
	}));
	debug!(min_level = %config.jobs_min_level, "Job failure handler registered");
	true
}
