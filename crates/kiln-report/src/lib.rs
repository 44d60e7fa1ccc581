// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error reporting integration for Kiln services.
//!
//! This crate wires a host service's failure paths to a reporting client:
//!
//! - derives client options from the `[report]` configuration section and the
//!   host's [`HostContext`]
//! - resolves the configured client by name from a [`ReporterRegistry`] of
//!   factories, falling back to the built-in log-backed client when the name
//!   cannot be resolved
//! - lazily constructs and caches the client behind a [`ReporterHandle`]
//! - connects a capture handler to the host's [`ExceptionSignal`], honoring
//!   the configured ignore list
//! - optionally connects a handler to the host's [`JobSignal`] for
//!   background job failures
//! - provides [`ReportLayer`], a tower layer that emits the exception signal
//!   for panics and reported failures in the request path
//!
//! Capturing never raises into the host: client errors and panics are logged
//! and contained.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use kiln_report::{install, ExceptionSignal, HostContext};
//!
//! let config = kiln_report::load_config()?;
//! let host = HostContext::new()
//!     .with_modules(["kiln_server", "kiln_server_scm"])
//!     .with_secret_key(server_secret);
//! let signal = Arc::new(ExceptionSignal::new());
//!
//! let handle = install(&config, &host, &signal);
//!
//! let app = Router::new()
//!     .route("/threads", get(list_threads))
//!     .layer(kiln_report::ReportLayer::new(signal.clone()));
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod handle;
pub mod handler;
pub mod host;
pub mod jobs;
pub mod middleware;
pub mod options;
pub mod registry;
pub mod signal;

pub use config::{
	load_config, load_config_from_env, load_config_with_file, ReportConfig, ReportConfigLayer,
};
pub use error::{ConfigError, ReportError, Result};
pub use filter::IgnoreList;
pub use handle::ReporterHandle;
pub use handler::{register_handlers, CaptureHandler};
pub use host::HostContext;
pub use jobs::{register_job_handlers, JobFailure, JobFailureHandler, JobSignal};
pub use middleware::{ReportLayer, ReportService};
pub use options::build_reporter_options;
pub use registry::{ReporterRegistry, DEFAULT_FACTORY};
pub use signal::{ExceptionHandler, ExceptionSignal};

use std::sync::Arc;

use tracing::info;

/// Wire up exception capture with the built-in factories.
///
/// Returns `None` without touching the signal when reporting is disabled.
pub fn install(
	config: &ReportConfig,
	host: &HostContext,
	signal: &ExceptionSignal,
) -> Option<Arc<ReporterHandle>> {
	install_with_registry(
		config,
		host,
		signal,
		Arc::new(ReporterRegistry::with_builtins()),
	)
}

/// Wire up exception capture with a caller-supplied registry.
///
/// Use this when the host registers factories for real client
/// implementations before installing.
pub fn install_with_registry(
	config: &ReportConfig,
	host: &HostContext,
	signal: &ExceptionSignal,
	registry: Arc<ReporterRegistry>,
) -> Option<Arc<ReporterHandle>> {
	if !config.enabled {
		info!("Error reporting disabled by configuration");
		return None;
	}

	let handle = Arc::new(ReporterHandle::new(registry, config, host));
	register_handlers(signal, Arc::clone(&handle), config);
	Some(handle)
}
