// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper type that prevents accidental logging of sensitive values.
//!
//! [`Secret<T>`] wraps a sensitive value so that `Debug` and `Display` render
//! a redaction marker instead of the value itself. The inner value is only
//! reachable through [`Secret::expose_secret`], which makes every use of the
//! plaintext visible in code review. String secrets are zeroized on drop.
//!
//! # Example
//!
//! ```
//! use kiln_common_secret::SecretString;
//!
//! let token = SecretString::from("super-sensitive");
//! assert_eq!(format!("{token:?}"), "[REDACTED]");
//! assert_eq!(token.expose_secret(), "super-sensitive");
//! ```

pub mod env;

pub use env::{load_secret_env, require_secret_env, RequiredSecretError, SecretEnvError};

use std::fmt;

use zeroize::Zeroize;

/// Marker rendered in place of secret values.
pub const REDACTED: &str = "[REDACTED]";

/// Wrapper holding a sensitive value.
///
/// The inner value is zeroized when the wrapper is dropped.
pub struct Secret<S: Zeroize> {
	inner: S,
}

impl<S: Zeroize> Secret<S> {
	/// Wrap a sensitive value.
	pub fn new(inner: S) -> Self {
		Self { inner }
	}

	/// Borrow the wrapped value.
	///
	/// Call sites of this method are the complete audit surface for where the
	/// plaintext is used.
	pub fn expose_secret(&self) -> &S {
		&self.inner
	}
}

impl<S: Zeroize> Drop for Secret<S> {
	fn drop(&mut self) {
		self.inner.zeroize();
	}
}

impl<S: Zeroize + Clone> Clone for Secret<S> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<S: Zeroize + PartialEq> PartialEq for Secret<S> {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<S: Zeroize + Eq> Eq for Secret<S> {}

impl<S: Zeroize> fmt::Debug for Secret<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<S: Zeroize> fmt::Display for Secret<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

#[cfg(feature = "serde")]
impl<'de, S> serde::Deserialize<'de> for Secret<S>
where
	S: Zeroize + serde::Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		S::deserialize(deserializer).map(Secret::new)
	}
}

#[cfg(feature = "serde")]
impl<S: Zeroize> serde::Serialize for Secret<S> {
	fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
	where
		Ser: serde::Serializer,
	{
		// Secrets never round-trip through serialization.
		serializer.serialize_str(REDACTED)
	}
}

/// A secret `String`.
pub type SecretString = Secret<String>;

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Secret::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Secret::new(value.to_string())
	}
}
