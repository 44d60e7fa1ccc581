// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Named reporter factories.
//!
//! There is no import-by-path in Rust, so the configured client name resolves
//! against this registry instead: hosts register a factory per client
//! implementation during startup, and configuration selects one by name.
//! Re-registering a name overwrites the previous factory; instances already
//! constructed from it remain valid.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use kiln_report_core::{LogReporter, Reporter, ReporterOptions};

use crate::error::ReportError;

/// Name of the built-in log-backed factory, used as the fallback default.
pub const DEFAULT_FACTORY: &str = "log";

/// Constructs a reporting client from derived options.
pub type ReporterFactory =
	dyn Fn(&ReporterOptions) -> kiln_report_core::Result<Arc<dyn Reporter>> + Send + Sync;

/// Registry of reporter factories keyed by name.
pub struct ReporterRegistry {
	factories: RwLock<HashMap<String, Arc<ReporterFactory>>>,
}

impl ReporterRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self {
			factories: RwLock::new(HashMap::new()),
		}
	}

	/// Create a registry with the built-in factories registered.
	pub fn with_builtins() -> Self {
		let registry = Self::new();
		registry.register(DEFAULT_FACTORY, |options| {
			Ok(Arc::new(LogReporter::new(options.clone())) as Arc<dyn Reporter>)
		});
		registry
	}

	/// Register a factory under a name, overwriting any previous one.
	pub fn register<F>(&self, name: impl Into<String>, factory: F)
	where
		F: Fn(&ReporterOptions) -> kiln_report_core::Result<Arc<dyn Reporter>>
			+ Send
			+ Sync
			+ 'static,
	{
		self.factories
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(name.into(), Arc::new(factory));
	}

	/// Look up a factory by name.
	pub fn resolve(&self, name: &str) -> Result<Arc<ReporterFactory>, ReportError> {
		self.factories
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(name)
			.cloned()
			.ok_or_else(|| ReportError::UnknownFactory {
				name: name.to_string(),
			})
	}

	/// Whether a factory is registered under the name.
	pub fn contains(&self, name: &str) -> bool {
		self.factories
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.contains_key(name)
	}

	/// Registered factory names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self
			.factories
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.keys()
			.cloned()
			.collect();
		names.sort();
		names
	}
}

impl Default for ReporterRegistry {
	fn default() -> Self {
		Self::with_builtins()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builtins_include_log_factory() {
		let registry = ReporterRegistry::with_builtins();
		assert!(registry.contains(DEFAULT_FACTORY));
		assert_eq!(registry.names(), vec![DEFAULT_FACTORY.to_string()]);
	}

	#[test]
	fn unknown_name_is_an_error() {
		let registry = ReporterRegistry::with_builtins();
		let err = registry.resolve("no-such-client").err().unwrap();
		assert!(matches!(err, ReportError::UnknownFactory { name } if name == "no-such-client"));
	}

	#[test]
	fn resolved_factory_constructs_a_reporter() {
		let registry = ReporterRegistry::with_builtins();
		let factory = registry.resolve(DEFAULT_FACTORY).unwrap();
		assert!(factory(&ReporterOptions::default()).is_ok());
	}

	#[test]
	fn register_overwrites_previous_factory() {
		use std::sync::atomic::{AtomicUsize, Ordering};

		let registry = ReporterRegistry::with_builtins();
		let first_calls = Arc::new(AtomicUsize::new(0));
		let second_calls = Arc::new(AtomicUsize::new(0));

		let counter = Arc::clone(&first_calls);
		registry.register("custom", move |options| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(Arc::new(LogReporter::new(options.clone())) as Arc<dyn Reporter>)
		});
		let counter = Arc::clone(&second_calls);
		registry.register("custom", move |options| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(Arc::new(LogReporter::new(options.clone())) as Arc<dyn Reporter>)
		});

		let factory = registry.resolve("custom").unwrap();
		factory(&ReporterOptions::default()).unwrap();
		assert_eq!(first_calls.load(Ordering::SeqCst), 0);
		assert_eq!(second_calls.load(Ordering::SeqCst), 1);
	}
}
