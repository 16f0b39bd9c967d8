//! Connect-flow state machine.
//!
//! ```text
//! idle ─┬─ widget missing ──────────────────────────────────────► failed
//!       ├─ widget missing, script configured ─► awaiting-widget ─┬► requesting-token
//!       │                                                        └► failed
//!       └─ widget present ─► requesting-token ─┬─ token ────► widget-open
//!                                              └─ error ────► failed
//! widget-open ─┬─ success(public token) ─► exchanging ─┬─ ok ──► succeeded
//!              │                                       └─ err ─► failed
//!              ├─ error ─► failed
//!              └─ exit ──► idle
//! ```
//!
//! The session generation ([`LinkSession::id`]) advances on every new attempt
//! and every reset. Each async continuation captures the generation it started
//! under and drops its result if the session has moved on.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hrlink_runtime::{CapabilityProvider, ScriptLoader};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::LinkBackend;
use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::request::ConnectRequest;
use crate::session::{LinkSession, SessionStatus};
use crate::widget::{LinkWidget, WidgetOutcome, run_widget};

/// Host lookup for the widget global.
pub type WidgetProvider = dyn CapabilityProvider<Arc<dyn LinkWidget>>;

/// Why a connect attempt stopped early.
enum Halt {
	/// A newer attempt or a reset replaced this session.
	Stale,
	Failed(LinkError),
}

impl From<LinkError> for Halt {
	fn from(err: LinkError) -> Self {
		Halt::Failed(err)
	}
}

enum Completion {
	Succeeded(Value),
	Exited,
}

/// Owns the one [`LinkSession`] and runs connect attempts against it.
pub struct LinkSessionController {
	backend: Arc<dyn LinkBackend>,
	widgets: Arc<WidgetProvider>,
	loader: Option<Arc<ScriptLoader<Arc<dyn LinkWidget>>>>,
	config: LinkConfig,
	generation: AtomicU64,
	session: watch::Sender<LinkSession>,
}

impl LinkSessionController {
	pub fn new(backend: Arc<dyn LinkBackend>, widgets: Arc<WidgetProvider>, config: LinkConfig) -> Self {
		let (session, _) = watch::channel(LinkSession::idle(0));
		Self {
			backend,
			widgets,
			loader: None,
			config,
			generation: AtomicU64::new(0),
			session,
		}
	}

	/// Bootstraps the widget through `loader` when it is missing at connect
	/// time. Has no effect unless [`LinkConfig::script`] is set.
	pub fn with_script_loader(mut self, loader: Arc<ScriptLoader<Arc<dyn LinkWidget>>>) -> Self {
		self.loader = Some(loader);
		self
	}

	pub fn config(&self) -> &LinkConfig {
		&self.config
	}

	pub fn snapshot(&self) -> LinkSession {
		self.session.borrow().clone()
	}

	/// Receives every session change.
	pub fn subscribe(&self) -> watch::Receiver<LinkSession> {
		self.session.subscribe()
	}

	/// Abandons the current attempt and starts a fresh idle session.
	///
	/// Results still pending for the abandoned attempt are discarded when they arrive.
	pub fn reset(&self) {
		let id = self.next_generation();
		let previous = self.session.send_replace(LinkSession::idle(id));
		debug!(
			target = "hrlink",
			session = id,
			previous = previous.id,
			from = %previous.status,
			"session reset"
		);
	}

	/// Runs one connect attempt to completion and returns the resulting session.
	///
	/// Ignored while another attempt is in flight. Every failure ends in
	/// [`SessionStatus::Failed`] with a non-empty message; nothing is returned
	/// as an error.
	pub async fn connect(&self, request: &ConnectRequest) -> LinkSession {
		let Some(id) = self.begin() else {
			debug!(target = "hrlink", "connect ignored while a session is in flight");
			return self.snapshot();
		};
		info!(target = "hrlink", session = id, "connect requested");

		match self.drive(id, request).await {
			Ok(Completion::Succeeded(payload)) => {
				let applied = self.apply(id, |session| {
					session.status = SessionStatus::Succeeded;
					session.result_payload = Some(payload);
				});
				if applied {
					info!(target = "hrlink", session = id, "connect succeeded");
				}
			}
			Ok(Completion::Exited) => self.reset_if_current(id),
			Err(Halt::Failed(err)) => self.fail(id, err),
			Err(Halt::Stale) => {
				debug!(target = "hrlink", session = id, "discarding result of stale session");
			}
		}

		self.snapshot()
	}

	async fn drive(&self, id: u64, request: &ConnectRequest) -> Result<Completion, Halt> {
		let widget = self.acquire_widget(id).await?;
		request.validate()?;

		self.advance(id, SessionStatus::RequestingToken)?;
		let link_token = self.backend.create_link_token(&request.link_token_request()).await;
		self.ensure_current(id)?;
		let link_token = link_token.map_err(LinkError::TokenRequest)?;

		self.advance(id, SessionStatus::WidgetOpen)?;
		let outcome = run_widget(widget.as_ref(), &link_token).await;
		self.ensure_current(id)?;
		let public_token = match outcome {
			WidgetOutcome::Success { public_token } => public_token,
			WidgetOutcome::Exit => return Ok(Completion::Exited),
			WidgetOutcome::Error { message } => return Err(LinkError::WidgetReported(message).into()),
		};

		self.advance(id, SessionStatus::Exchanging)?;
		let payload = self
			.backend
			.exchange_token(&request.exchange_request(public_token))
			.await;
		self.ensure_current(id)?;
		Ok(Completion::Succeeded(payload.map_err(LinkError::TokenExchange)?))
	}

	async fn acquire_widget(&self, id: u64) -> Result<Arc<dyn LinkWidget>, Halt> {
		let global = self.config.widget_global.as_str();
		if let Some(widget) = self.widgets.lookup(global) {
			return Ok(widget);
		}

		let (Some(loader), Some(script)) = (&self.loader, &self.config.script) else {
			return Err(LinkError::IntegrationUnavailable.into());
		};

		self.advance(id, SessionStatus::AwaitingWidget)?;
		let widget = loader.load(&script.url, global, script.timeout).await;
		self.ensure_current(id)?;
		Ok(widget.map_err(LinkError::Bootstrap)?)
	}

	/// Starts a fresh session unless one is in flight.
	fn begin(&self) -> Option<u64> {
		let mut started = None;
		self.session.send_if_modified(|session| {
			if session.is_loading() {
				return false;
			}
			let id = self.next_generation();
			*session = LinkSession::idle(id);
			started = Some(id);
			true
		});
		started
	}

	fn next_generation(&self) -> u64 {
		self.generation.fetch_add(1, Ordering::SeqCst) + 1
	}

	/// Mutates the session only if it is still generation `id`.
	fn apply(&self, id: u64, mutate: impl FnOnce(&mut LinkSession)) -> bool {
		self.session.send_if_modified(|session| {
			if session.id != id {
				return false;
			}
			mutate(session);
			true
		})
	}

	fn advance(&self, id: u64, status: SessionStatus) -> Result<(), Halt> {
		if self.apply(id, |session| session.status = status) {
			debug!(target = "hrlink", session = id, %status, "session transition");
			Ok(())
		} else {
			Err(Halt::Stale)
		}
	}

	fn ensure_current(&self, id: u64) -> Result<(), Halt> {
		if self.session.borrow().id == id {
			Ok(())
		} else {
			Err(Halt::Stale)
		}
	}

	fn fail(&self, id: u64, err: LinkError) {
		let message = err.user_message();
		let applied = self.apply(id, |session| {
			session.status = SessionStatus::Failed;
			session.error_message = Some(message);
		});
		if applied {
			warn!(target = "hrlink", session = id, kind = err.kind(), error = %err, "connect failed");
		}
	}

	/// Widget exit: return to a fresh idle session without an error.
	fn reset_if_current(&self, id: u64) {
		let next = self.next_generation();
		let applied = self.apply(id, |session| *session = LinkSession::idle(next));
		if applied {
			info!(target = "hrlink", session = id, "widget closed; session reset");
		}
	}
}

impl std::fmt::Debug for LinkSessionController {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LinkSessionController")
			.field("config", &self.config)
			.field("session", &*self.session.borrow())
			.finish_non_exhaustive()
	}
}
