//! Error types for host bootstrap.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bootstrapping a host capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// The script loaded but never defined the expected global.
	#[error("Integration unavailable: '{global}' is not defined by the host")]
	IntegrationUnavailable { global: String },

	/// The host reported an error event for the injected script.
	#[error("Failed to load script {url}: {reason}")]
	ScriptLoadFailure { url: String, reason: String },

	/// A script was already injected from another URL; only one tag is ever inserted.
	#[error("Script {injected} already injected; refusing to inject {requested}")]
	ScriptConflict { injected: String, requested: String },

	/// Neither a load nor an error event arrived in time.
	#[error("Timeout after {ms}ms waiting for script {url}")]
	Timeout { url: String, ms: u64 },
}

impl Error {
	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}
}
