//! Error taxonomy for the connect flow, the backend client, and the auth store.
//!
//! Every [`LinkError`] collapses to one user-visible string via
//! [`LinkError::user_message`]; the variants only matter for logging.

use thiserror::Error;

/// Shown when no widget global is available at connect time.
pub const WIDGET_UNAVAILABLE_MESSAGE: &str =
	"Integration widget is not available. Please refresh the page.";

/// Shown when a link-token request fails without a backend `detail`.
pub const TOKEN_REQUEST_FALLBACK: &str = "Failed to initialize the integration widget";

/// Shown when a token exchange fails without a backend `detail`.
pub const TOKEN_EXCHANGE_FALLBACK: &str = "Failed to exchange token";

/// Shown when the widget reports an error without a message.
pub const WIDGET_ERROR_FALLBACK: &str = "Failed to connect to the integration";

/// Errors from the link backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
	/// Base URL missing or unparsable. Surfaces per request, never at startup.
	#[error("backend is not configured: {0}")]
	Config(String),

	/// Connection, TLS, or timeout failure before a response arrived.
	#[error("request to {url} failed: {message}")]
	Transport { url: String, message: String },

	/// Non-2xx response.
	#[error("backend returned HTTP {status}{}", detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default())]
	Status { status: u16, detail: Option<String> },

	/// 2xx response whose body did not have the expected shape.
	#[error("malformed response from {url}: {message}")]
	Decode { url: String, message: String },
}

impl BackendError {
	/// The backend's `detail` string, if the response carried a non-blank one.
	pub fn detail(&self) -> Option<&str> {
		match self {
			BackendError::Status { detail, .. } => {
				detail.as_deref().filter(|detail| !detail.trim().is_empty())
			}
			_ => None,
		}
	}
}

/// Failures that end a link session in the `failed` state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
	/// Widget global absent at connect time.
	#[error("integration widget unavailable")]
	IntegrationUnavailable,

	/// Script bootstrap failed (load error, missing global, or timeout).
	#[error(transparent)]
	Bootstrap(#[from] hrlink_runtime::Error),

	/// A required connect input was empty.
	#[error("invalid connect request: {0}")]
	InvalidRequest(String),

	#[error("link token request failed: {0}")]
	TokenRequest(#[source] BackendError),

	#[error("widget reported an error: {0}")]
	WidgetReported(String),

	#[error("token exchange failed: {0}")]
	TokenExchange(#[source] BackendError),
}

impl LinkError {
	/// Message shown to the user. Never empty.
	pub fn user_message(&self) -> String {
		let message = match self {
			LinkError::IntegrationUnavailable => WIDGET_UNAVAILABLE_MESSAGE.to_string(),
			LinkError::Bootstrap(err) => err.to_string(),
			LinkError::InvalidRequest(message) => message.clone(),
			LinkError::TokenRequest(err) => err.detail().unwrap_or(TOKEN_REQUEST_FALLBACK).to_string(),
			LinkError::WidgetReported(message) => message.clone(),
			LinkError::TokenExchange(err) => {
				err.detail().unwrap_or(TOKEN_EXCHANGE_FALLBACK).to_string()
			}
		};
		if message.trim().is_empty() {
			WIDGET_ERROR_FALLBACK.to_string()
		} else {
			message
		}
	}

	/// Short stable name for log fields.
	pub fn kind(&self) -> &'static str {
		match self {
			LinkError::IntegrationUnavailable => "integration_unavailable",
			LinkError::Bootstrap(hrlink_runtime::Error::IntegrationUnavailable { .. }) => {
				"integration_unavailable"
			}
			LinkError::Bootstrap(hrlink_runtime::Error::ScriptLoadFailure { .. }) => {
				"script_load_failure"
			}
			LinkError::Bootstrap(hrlink_runtime::Error::Timeout { .. }) => "timeout",
			LinkError::Bootstrap(hrlink_runtime::Error::ScriptConflict { .. }) => "script_conflict",
			LinkError::InvalidRequest(_) => "invalid_request",
			LinkError::TokenRequest(_) => "token_request_failure",
			LinkError::WidgetReported(_) => "widget_reported_error",
			LinkError::TokenExchange(_) => "token_exchange_failure",
		}
	}
}

/// Missing or invalid environment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("missing required environment variable {0}")]
	Missing(&'static str),

	#[error("invalid value for {name}: {message}")]
	Invalid { name: &'static str, message: String },
}

/// Errors from the hosted auth and record service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
	#[error("request to {url} failed: {message}")]
	Transport { url: String, message: String },

	/// The service answered with a non-2xx status.
	#[error("auth service rejected the request (HTTP {status}): {message}")]
	Rejected { status: u16, message: String },

	#[error("malformed response from auth service: {0}")]
	Decode(String),

	/// Sign-up succeeded without returning a user record.
	#[error("no user returned from sign up")]
	MissingUser,

	/// An insert returned no row.
	#[error("no row returned from insert into {0}")]
	MissingRow(&'static str),
}
