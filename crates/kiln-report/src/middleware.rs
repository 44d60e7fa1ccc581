// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tower layer that feeds the exception signal from the request path.
//!
//! [`ReportLayer`] watches every request for two kinds of failure:
//!
//! - a panic in the inner service, which is contained, emitted on the signal
//!   with the request context, and converted into a 500 response
//! - a response carrying an [`ExceptionInfo`] extension, which the host's
//!   error-to-response conversion inserts for failures it wants reported
//!
//! Ordinary error responses without an [`ExceptionInfo`] extension pass
//! through untouched; status codes alone say nothing about whether an
//! exception occurred.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use kiln_report_core::{ExceptionInfo, RequestContext};
use tower::{Layer, Service};
use tracing::debug;

use crate::signal::ExceptionSignal;

/// Headers never copied into the captured request context.
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "proxy-authorization", "set-cookie"];

/// Layer wiring a service's failures to an [`ExceptionSignal`].
#[derive(Clone)]
pub struct ReportLayer {
	signal: Arc<ExceptionSignal>,
}

impl ReportLayer {
	pub fn new(signal: Arc<ExceptionSignal>) -> Self {
		Self { signal }
	}
}

impl<S> Layer<S> for ReportLayer {
	type Service = ReportService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		ReportService {
			inner,
			signal: Arc::clone(&self.signal),
		}
	}
}

/// Service wrapper for [`ReportLayer`].
#[derive(Clone)]
pub struct ReportService<S> {
	inner: S,
	signal: Arc<ExceptionSignal>,
}

impl<S> Service<Request<Body>> for ReportService<S>
where
	S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
	S::Future: Send,
	S::Error: Send,
{
	type Response = Response;
	type Error = S::Error;
	type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let signal = Arc::clone(&self.signal);
		let context = request_context(&req);

		// Take the ready inner service, leave a clone behind.
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);

		Box::pin(async move {
			match std::panic::AssertUnwindSafe(inner.call(req)).catch_unwind().await {
				Ok(Ok(mut response)) => {
					if let Some(exception) = response.extensions_mut().remove::<ExceptionInfo>() {
						debug!(
							exception = %exception.qualified_name(),
							status = response.status().as_u16(),
							"Response carried an exception, emitting signal"
						);
						signal.emit(&exception, Some(&context)).await;
					}
					Ok(response)
				}
				Ok(Err(err)) => Err(err),
				Err(payload) => {
					let exception = ExceptionInfo::from_panic(payload.as_ref());
					signal.emit(&exception, Some(&context)).await;
					Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
				}
			}
		})
	}
}

/// Snapshot the reportable parts of a request.
fn request_context(req: &Request<Body>) -> RequestContext {
	let headers = req
		.headers()
		.iter()
		.filter(|(name, _)| !SENSITIVE_HEADERS.contains(&name.as_str()))
		.filter_map(|(name, value)| {
			value
				.to_str()
				.ok()
				.map(|v| (name.as_str().to_string(), v.to_string()))
		})
		.collect();

	RequestContext {
		url: Some(req.uri().to_string()),
		method: Some(req.method().to_string()),
		headers,
		query_string: req.uri().query().map(str::to_string),
	}
}
