// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: wire the reporting integration into an axum service.
//!
//! Run with:
//!   KILN_REPORT_IGNORE_EXCEPTIONS=Http404 cargo run --example integrate -p kiln-report

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use kiln_report::{install, ExceptionSignal, HostContext, JobFailure, JobSignal, ReportLayer};
use kiln_report_core::{ExceptionInfo, ReportLevel};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt::init();

	// Env > file > defaults; see the config module for the key list.
	let config = kiln_report::load_config_from_env()?;

	let host = HostContext::new()
		.with_modules(["kiln_server", "kiln_server_scm"])
		.with_secret_key("example-only-secret");

	let signal = Arc::new(ExceptionSignal::new());
	let handle = install(&config, &host, &signal).expect("reporting enabled");

	// The layer feeds the signal from the request path.
	let _app: Router = Router::new()
		.route("/threads", get(|| async { "[]" }))
		.layer(ReportLayer::new(Arc::clone(&signal)));

	// Signals can also be fed directly, e.g. from a task supervisor.
	signal
		.emit(
			&ExceptionInfo::new("MirrorUnreachable", "remote hung up")
				.with_module("kiln_server_scm"),
			None,
		)
		.await;

	// Background job failures use their own signal.
	let jobs = JobSignal::new();
	kiln_report::register_job_handlers(&jobs, Arc::clone(&handle), &config);
	jobs.emit(&JobFailure {
		job_id: "mirror_sync".to_string(),
		level: ReportLevel::Error,
		exception: ExceptionInfo::new("MirrorUnreachable", "remote hung up"),
	})
	.await;

	println!("captured via client '{}'", handle.configured_client());
	Ok(())
}
