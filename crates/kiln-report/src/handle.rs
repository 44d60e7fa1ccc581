// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cached access to the configured reporting client.
//!
//! [`ReporterHandle`] is the explicit replacement for a process-global client
//! proxy: the host constructs one, passes it to whatever needs to capture,
//! and the handle lazily constructs the underlying client on first use.
//!
//! Initialization and replacement rules:
//!
//! - the client is constructed from the configured factory on first `get()`
//!   and cached; later calls return the cached instance while the configured
//!   name is unchanged
//! - when the configured factory cannot be resolved or fails, the failure is
//!   logged and the built-in default factory is used instead, exactly once;
//!   the fallback instance is then reused
//! - [`reconfigure`](ReporterHandle::reconfigure) swaps configuration and
//!   drops the cache, so the next `get()` constructs a fresh client; `Arc`s
//!   already handed out remain valid

use std::sync::{Arc, PoisonError, RwLock};

use kiln_report_core::{LogReporter, Reporter, ReporterOptions};
use tracing::{error, info};

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::host::HostContext;
use crate::options::build_reporter_options;
use crate::registry::{ReporterRegistry, DEFAULT_FACTORY};

struct Cached {
	factory: String,
	reporter: Arc<dyn Reporter>,
}

struct HandleState {
	configured: String,
	options: ReporterOptions,
	cached: Option<Cached>,
}

/// Lazily constructed, cached reporting client reference.
pub struct ReporterHandle {
	registry: Arc<ReporterRegistry>,
	state: RwLock<HandleState>,
}

impl ReporterHandle {
	/// Create a handle for a configuration. No client is constructed yet.
	pub fn new(registry: Arc<ReporterRegistry>, config: &ReportConfig, host: &HostContext) -> Self {
		Self {
			registry,
			state: RwLock::new(HandleState {
				configured: config.client.clone(),
				options: build_reporter_options(config, host),
				cached: None,
			}),
		}
	}

	/// Get the client, constructing it on first use.
	///
	/// Never fails: when the configured factory cannot produce a client the
	/// handle falls back to the built-in default and keeps serving it.
	pub fn get(&self) -> Arc<dyn Reporter> {
		{
			let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
			if let Some(cached) = &state.cached {
				if cached.factory == state.configured {
					return Arc::clone(&cached.reporter);
				}
			}
		}

		let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
		// Another caller may have populated the cache while we waited.
		if let Some(cached) = &state.cached {
			if cached.factory == state.configured {
				return Arc::clone(&cached.reporter);
			}
		}

		let name = state.configured.clone();
		match self.construct(&name, &state.options) {
			Ok(reporter) => {
				info!(client = %name, "Reporting client constructed");
				state.cached = Some(Cached {
					factory: name,
					reporter: Arc::clone(&reporter),
				});
				reporter
			}
			Err(err) => {
				error!(client = %name, error = %err, "Failed to construct configured reporting client");

				if let Some(cached) = &state.cached {
					return Arc::clone(&cached.reporter);
				}

				let reporter = self.construct_fallback(&state.options);
				state.cached = Some(Cached {
					factory: DEFAULT_FACTORY.to_string(),
					reporter: Arc::clone(&reporter),
				});
				reporter
			}
		}
	}

	/// Construct a throwaway client from a named factory, without touching
	/// the cache.
	pub fn build_uncached(&self, name: &str) -> Result<Arc<dyn Reporter>, ReportError> {
		let options = {
			let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
			state.options.clone()
		};
		self.construct(name, &options)
	}

	/// Swap in a new configuration. Drops the cached client; the next
	/// [`get`](Self::get) constructs a fresh one.
	pub fn reconfigure(&self, config: &ReportConfig, host: &HostContext) {
		let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
		info!(
			previous = %state.configured,
			client = %config.client,
			"Reporting client reconfigured"
		);
		state.configured = config.client.clone();
		state.options = build_reporter_options(config, host);
		state.cached = None;
	}

	/// Inject a client instance directly, bypassing factories.
	pub fn replace(&self, reporter: Arc<dyn Reporter>) {
		let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
		let factory = state.configured.clone();
		state.cached = Some(Cached { factory, reporter });
	}

	/// Name of the configured factory.
	pub fn configured_client(&self) -> String {
		self.state
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.configured
			.clone()
	}

	fn construct(
		&self,
		name: &str,
		options: &ReporterOptions,
	) -> Result<Arc<dyn Reporter>, ReportError> {
		let factory = self.registry.resolve(name)?;
		factory(options).map_err(|source| ReportError::Factory {
			name: name.to_string(),
			source,
		})
	}

	fn construct_fallback(&self, options: &ReporterOptions) -> Arc<dyn Reporter> {
		match self.construct(DEFAULT_FACTORY, options) {
			Ok(reporter) => reporter,
			// The default factory may have been unregistered; the log-backed
			// client itself is always available.
			Err(_) => Arc::new(LogReporter::new(options.clone())),
		}
	}
}
