//! hrlink: connect an HR system through a hosted link widget.
//!
//! A connect attempt asks the backend for a short-lived link token, hands it
//! to the widget the host exposes as a global, and exchanges the public token
//! the widget reports for whatever payload the backend returns.
//!
//! # Main Types
//!
//! - [`LinkSessionController`] - drives one connect attempt at a time
//! - [`LinkBackend`] / [`HttpBackend`] - the two backend calls
//! - [`LinkWidget`] - callback-style widget API, wrapped by [`run_widget`]
//! - [`ShellView`] - what a presentation layer renders from a [`LinkSession`]
//! - [`AuthStore`] - signed-in profile and organization
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hrlink::{ConnectRequest, HttpBackend, LinkConfig, LinkSessionController};
//!
//! let controller = LinkSessionController::new(
//!     Arc::new(HttpBackend::from_env()),
//!     widgets,
//!     LinkConfig::default(),
//! );
//! let session = controller.connect(&request).await;
//! println!("{}", hrlink::ShellView::project(&session, availability).render());
//! ```

pub mod auth;
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod request;
pub mod session;
pub mod shell;
pub mod widget;

pub use auth::{AuthEvent, AuthService, AuthState, AuthStore, AuthUser, SupabaseClient};
pub use backend::{HttpBackend, LinkBackend};
pub use config::{AuthConfig, LinkConfig, ScriptSource};
pub use controller::{LinkSessionController, WidgetProvider};
pub use error::{AuthError, BackendError, ConfigError, LinkError};
pub use hrlink_protocol::{Category, Organization, Profile, Role};
pub use hrlink_runtime::{
	AvailabilityPoller, CapabilityProvider, GlobalScope, PollHandle, ScriptHost, ScriptLoader,
	WidgetAvailability,
};
pub use request::ConnectRequest;
pub use session::{LinkSession, SessionStatus};
pub use shell::{ConnectButton, ShellView};
pub use widget::{LinkWidget, WidgetCallbacks, WidgetConfig, WidgetError, WidgetOutcome, run_widget};

/// Shortens a credential for display: first 10 characters followed by `...`.
pub fn redact(token: &str) -> String {
	let prefix: String = token.chars().take(10).collect();
	format!("{prefix}...")
}
