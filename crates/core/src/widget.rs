//! Callback-style widget API and its single-shot async wrapper.
//!
//! The hosted widget reports its result through three callbacks. [`run_widget`]
//! turns that into one awaitable [`WidgetOutcome`]: the first callback to fire
//! wins and later ones are ignored.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::WIDGET_ERROR_FALLBACK;
use crate::redact;

/// Reported when the widget drops its callbacks without calling any of them.
pub const WIDGET_ABANDONED_MESSAGE: &str = "Integration widget closed without reporting a result";

/// Error payload passed to the widget's error callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetError {
	pub message: Option<String>,
}

impl WidgetError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: Some(message.into()),
		}
	}
}

type SuccessFn = dyn Fn(String) + Send + Sync;
type ExitFn = dyn Fn() + Send + Sync;
type ErrorFn = dyn Fn(WidgetError) + Send + Sync;

/// The three terminal callbacks handed to [`LinkWidget::initialize`].
#[derive(Clone)]
pub struct WidgetCallbacks {
	on_success: Arc<SuccessFn>,
	on_exit: Arc<ExitFn>,
	on_error: Arc<ErrorFn>,
}

impl WidgetCallbacks {
	pub fn new<S, X, E>(on_success: S, on_exit: X, on_error: E) -> Self
	where
		S: Fn(String) + Send + Sync + 'static,
		X: Fn() + Send + Sync + 'static,
		E: Fn(WidgetError) + Send + Sync + 'static,
	{
		Self {
			on_success: Arc::new(on_success),
			on_exit: Arc::new(on_exit),
			on_error: Arc::new(on_error),
		}
	}

	/// The user completed the flow; `public_token` is to be exchanged.
	pub fn success(&self, public_token: impl Into<String>) {
		(self.on_success)(public_token.into());
	}

	/// The user closed the widget.
	pub fn exit(&self) {
		(self.on_exit)();
	}

	pub fn error(&self, error: WidgetError) {
		(self.on_error)(error);
	}
}

impl std::fmt::Debug for WidgetCallbacks {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WidgetCallbacks").finish_non_exhaustive()
	}
}

/// Argument of [`LinkWidget::initialize`].
#[derive(Debug, Clone)]
pub struct WidgetConfig {
	pub link_token: String,
	pub callbacks: WidgetCallbacks,
}

/// Widget global exposed by the host.
pub trait LinkWidget: Send + Sync {
	/// Prepares a widget session. Callbacks may fire any time after [`open_link`](Self::open_link).
	fn initialize(&self, config: WidgetConfig);

	fn open_link(&self);
}

/// Result of one widget session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOutcome {
	Success { public_token: String },
	Exit,
	/// `message` is never empty.
	Error { message: String },
}

/// Initializes and opens `widget`, resolving with its first reported outcome.
pub async fn run_widget(widget: &dyn LinkWidget, link_token: &str) -> WidgetOutcome {
	let (tx, rx) = oneshot::channel();
	let slot = Arc::new(Mutex::new(Some(tx)));

	let report = move |slot: &Mutex<Option<oneshot::Sender<WidgetOutcome>>>, outcome: WidgetOutcome| {
		match slot.lock().take() {
			Some(tx) => {
				let _ = tx.send(outcome);
			}
			None => debug!(target = "hrlink", ?outcome, "ignoring callback after widget settled"),
		}
	};

	let callbacks = {
		let on_success = Arc::clone(&slot);
		let on_exit = Arc::clone(&slot);
		let on_error = Arc::clone(&slot);
		WidgetCallbacks::new(
			move |public_token: String| {
				info!(target = "hrlink", token = %redact(&public_token), "widget reported success");
				report(&on_success, WidgetOutcome::Success { public_token });
			},
			move || {
				info!(target = "hrlink", "widget closed");
				report(&on_exit, WidgetOutcome::Exit);
			},
			move |error: WidgetError| {
				warn!(target = "hrlink", message = ?error.message, "widget reported an error");
				let message = error
					.message
					.filter(|message| !message.trim().is_empty())
					.unwrap_or_else(|| WIDGET_ERROR_FALLBACK.to_string());
				report(&on_error, WidgetOutcome::Error { message });
			},
		)
	};
	drop(slot);

	widget.initialize(WidgetConfig {
		link_token: link_token.to_string(),
		callbacks,
	});
	info!(target = "hrlink", "opening widget");
	widget.open_link();

	rx.await.unwrap_or_else(|_| WidgetOutcome::Error {
		message: WIDGET_ABANDONED_MESSAGE.to_string(),
	})
}
