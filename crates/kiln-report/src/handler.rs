// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The capture handler connected to the exception signal.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use kiln_report_core::{ExceptionInfo, RequestContext};
use tracing::{debug, error, info};

use crate::config::ReportConfig;
use crate::filter::IgnoreList;
use crate::handle::ReporterHandle;
use crate::signal::{ExceptionHandler, ExceptionSignal};

/// Forwards signalled exceptions to the reporting client.
///
/// Capture must never raise into the host's request path: client errors are
/// logged, and a panicking client is contained with a best-effort stderr
/// warning as the last resort.
pub struct CaptureHandler {
	handle: Arc<ReporterHandle>,
	ignore: IgnoreList,
}

impl CaptureHandler {
	pub fn new(handle: Arc<ReporterHandle>, config: &ReportConfig) -> Self {
		Self {
			handle,
			ignore: IgnoreList::new(&config.ignore_exceptions),
		}
	}
}

#[async_trait]
impl ExceptionHandler for CaptureHandler {
	async fn handle_exception(
		&self,
		exception: &ExceptionInfo,
		request: Option<&RequestContext>,
	) {
		if self.ignore.matches(exception) {
			info!(
				exception = %exception.qualified_name(),
				"Not capturing exception due to filters"
			);
			return;
		}

		let reporter = self.handle.get();
		let capture =
			std::panic::AssertUnwindSafe(reporter.capture_exception(exception, request))
				.catch_unwind()
				.await;

		match capture {
			Ok(Ok(event_id)) => {
				debug!(
					event_id = %event_id,
					exception = %exception.qualified_name(),
					"Exception captured"
				);
			}
			Ok(Err(err)) => {
				error!(
					exception = %exception.qualified_name(),
					error = %err,
					"Unable to process captured exception"
				);
			}
			Err(_) => {
				// The log stream may be what brought the client down; go
				// straight to stderr.
				eprintln!(
					"kiln-report: reporting client panicked while capturing {}",
					exception.qualified_name()
				);
			}
		}
	}
}

/// Connect the capture handler to the host's exception signal.
pub fn register_handlers(
	signal: &ExceptionSignal,
	handle: Arc<ReporterHandle>,
	config: &ReportConfig,
) {
	signal.connect(Arc::new(CaptureHandler::new(handle, config)));
	debug!(client = %config.client, "Exception capture handler registered");
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::host::HostContext;
	use crate::registry::ReporterRegistry;
	use kiln_report_core::{CaptureError, EventId, Reporter};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	#[derive(Default)]
	struct RecordingReporter {
		captured: Mutex<Vec<ExceptionInfo>>,
		fail: bool,
		panic: bool,
	}

	#[async_trait]
	impl Reporter for RecordingReporter {
		async fn capture_exception(
			&self,
			exception: &ExceptionInfo,
			_request: Option<&RequestContext>,
		) -> kiln_report_core::Result<EventId> {
			if self.panic {
				panic!("client exploded");
			}
			if self.fail {
				return Err(CaptureError::Backend {
					message: "delivery refused".to_string(),
				});
			}
			self.captured.lock().unwrap().push(exception.clone());
			Ok(EventId::new())
		}
	}

	fn handler_with(
		reporter: Arc<RecordingReporter>,
		config: &ReportConfig,
	) -> CaptureHandler {
		let handle = Arc::new(ReporterHandle::new(
			Arc::new(ReporterRegistry::with_builtins()),
			config,
			&HostContext::new(),
		));
		handle.replace(reporter);
		CaptureHandler::new(handle, config)
	}

	#[tokio::test]
	async fn captures_unfiltered_exceptions() {
		let reporter = Arc::new(RecordingReporter::default());
		let handler = handler_with(reporter.clone(), &ReportConfig::default());

		let info = ExceptionInfo::new("TimeoutError", "boom").with_module("kiln_server::scm");
		handler.handle_exception(&info, None).await;

		let captured = reporter.captured.lock().unwrap();
		assert_eq!(captured.len(), 1);
		assert_eq!(captured[0].type_name, "TimeoutError");
	}

	#[tokio::test]
	async fn filtered_exceptions_never_reach_the_client() {
		let reporter = Arc::new(RecordingReporter::default());
		let config = ReportConfig {
			ignore_exceptions: vec!["kiln_server::auth::*".to_string(), "Http404".to_string()],
			..Default::default()
		};
		let handler = handler_with(reporter.clone(), &config);

		let wildcard =
			ExceptionInfo::new("TokenExpired", "expired").with_module("kiln_server::auth");
		let exact = ExceptionInfo::new("Http404", "not found");
		handler.handle_exception(&wildcard, None).await;
		handler.handle_exception(&exact, None).await;

		assert!(reporter.captured.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn capture_errors_are_swallowed() {
		let reporter = Arc::new(RecordingReporter {
			fail: true,
			..Default::default()
		});
		let handler = handler_with(reporter, &ReportConfig::default());

		let info = ExceptionInfo::new("TimeoutError", "boom");
		// Must not propagate the backend error.
		handler.handle_exception(&info, None).await;
	}

	#[tokio::test]
	async fn panicking_client_is_contained() {
		let reporter = Arc::new(RecordingReporter {
			panic: true,
			..Default::default()
		});
		let handler = handler_with(reporter, &ReportConfig::default());

		let info = ExceptionInfo::new("TimeoutError", "boom");
		handler.handle_exception(&info, None).await;
	}

	#[tokio::test]
	async fn register_handlers_connects_once() {
		let signal = ExceptionSignal::new();
		let config = ReportConfig::default();
		let handle = Arc::new(ReporterHandle::new(
			Arc::new(ReporterRegistry::with_builtins()),
			&config,
			&HostContext::new(),
		));

		register_handlers(&signal, handle, &config);
		assert_eq!(signal.handler_count(), 1);
	}

	#[tokio::test]
	async fn end_to_end_signal_to_recorder() {
		let signal = ExceptionSignal::new();
		let reporter = Arc::new(RecordingReporter::default());
		let config = ReportConfig {
			ignore_exceptions: vec!["Ignored".to_string()],
			..Default::default()
		};
		let handle = Arc::new(ReporterHandle::new(
			Arc::new(ReporterRegistry::with_builtins()),
			&config,
			&HostContext::new(),
		));
		handle.replace(reporter.clone());
		register_handlers(&signal, handle, &config);

		signal
			.emit(&ExceptionInfo::new("Ignored", "skip me"), None)
			.await;
		signal
			.emit(&ExceptionInfo::new("DiskFull", "keep me"), None)
			.await;

		let captured = reporter.captured.lock().unwrap();
		assert_eq!(captured.len(), 1);
		assert_eq!(captured[0].type_name, "DiskFull");
	}

	#[tokio::test]
	async fn request_context_is_forwarded() {
		struct UrlRecorder {
			urls: Mutex<Vec<Option<String>>>,
			calls: AtomicUsize,
		}

		#[async_trait]
		impl Reporter for UrlRecorder {
			async fn capture_exception(
				&self,
				_exception: &ExceptionInfo,
				request: Option<&RequestContext>,
			) -> kiln_report_core::Result<EventId> {
				self.calls.fetch_add(1, Ordering::SeqCst);
				self.urls
					.lock()
					.unwrap()
					.push(request.and_then(|r| r.url.clone()));
				Ok(EventId::new())
			}
		}

		let reporter = Arc::new(UrlRecorder {
			urls: Mutex::new(Vec::new()),
			calls: AtomicUsize::new(0),
		});
		let config = ReportConfig::default();
		let handle = Arc::new(ReporterHandle::new(
			Arc::new(ReporterRegistry::with_builtins()),
			&config,
			&HostContext::new(),
		));
		handle.replace(reporter.clone());
		let handler = CaptureHandler::new(handle, &config);

		let request = RequestContext {
			url: Some("https://kiln.example.com/threads".to_string()),
			..Default::default()
		};
		handler
			.handle_exception(&ExceptionInfo::new("DiskFull", "boom"), Some(&request))
			.await;

		assert_eq!(reporter.calls.load(Ordering::SeqCst), 1);
		assert_eq!(
			reporter.urls.lock().unwrap()[0].as_deref(),
			Some("https://kiln.example.com/threads")
		);
	}
}
