//! One-shot remote script injection.
//!
//! [`ScriptLoader::load`] resolves immediately if the expected global already
//! exists. Otherwise it asks the [`ScriptHost`] to inject a single script tag
//! for the URL and waits for that tag's load or error event. At most one tag
//! is ever injected per loader. The pending event is [`Shared`], so concurrent
//! and later callers wait on the same tag; each caller bounds its own wait with
//! its own timeout. A later call naming a different URL is rejected with
//! [`Error::ScriptConflict`].


use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::capability::CapabilityProvider;
use crate::error::{Error, Result};

/// `crossorigin` attribute of an injected script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossOrigin {
	#[default]
	Anonymous,
	UseCredentials,
}

impl CrossOrigin {
	pub fn as_str(self) -> &'static str {
		match self {
			CrossOrigin::Anonymous => "anonymous",
			CrossOrigin::UseCredentials => "use-credentials",
		}
	}
}

/// Script element the host should insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
	pub src: String,
	/// Load without blocking the host's parser.
	pub async_load: bool,
	pub cross_origin: CrossOrigin,
}

impl ScriptTag {
	/// Asynchronous, cross-origin-anonymous tag for `src`.
	pub fn new(src: impl Into<String>) -> Self {
		Self {
			src: src.into(),
			async_load: true,
			cross_origin: CrossOrigin::Anonymous,
		}
	}
}

/// Terminal event fired by an injected script element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
	Load,
	Error(String),
}

/// Host capable of inserting script elements.
pub trait ScriptHost: Send + Sync {
	/// Inserts `tag` now and returns a future resolving to the element's
	/// first load or error event.
	///
	/// The returned future may never resolve; callers bound it with a timeout.
	fn inject(&self, tag: ScriptTag) -> BoxFuture<'static, ScriptEvent>;
}

type PendingEvent = Shared<BoxFuture<'static, ScriptEvent>>;

/// Tag injected by a loader and its pending terminal event.
struct Injection {
	url: String,
	event: PendingEvent,
}

/// Loads a remote script once and resolves the global it defines.
pub struct ScriptLoader<H> {
	host: Arc<dyn ScriptHost>,
	scope: Arc<dyn CapabilityProvider<H>>,
	injected: Mutex<Option<Injection>>,
}

impl<H> ScriptLoader<H>
where
	H: Send + 'static,
{
	pub fn new(host: Arc<dyn ScriptHost>, scope: Arc<dyn CapabilityProvider<H>>) -> Self {
		Self {
			host,
			scope,
			injected: Mutex::new(None),
		}
	}

	/// Resolves the handle bound to `global`, injecting `url` if needed.
	///
	/// # Errors
	///
	/// - [`Error::ScriptLoadFailure`] if the script element fires an error event
	/// - [`Error::IntegrationUnavailable`] if it loads without defining `global`
	/// - [`Error::Timeout`] if neither event fires within `timeout`
	/// - [`Error::ScriptConflict`] if a tag for another URL was already injected
	pub async fn load(&self, url: &str, global: &str, timeout: Duration) -> Result<H> {
		if let Some(handle) = self.scope.lookup(global) {
			debug!(target = "hrlink", global, "global already present; skipping injection");
			return Ok(handle);
		}

		let pending = self.pending_event(url)?;
		let event = match tokio::time::timeout(timeout, pending).await {
			Ok(event) => event,
			Err(_) => {
				let ms = timeout.as_millis() as u64;
				warn!(target = "hrlink", url, ms, "script load timed out");
				return Err(Error::Timeout {
					url: url.to_string(),
					ms,
				});
			}
		};

		match event {
			ScriptEvent::Load => self.scope.lookup(global).ok_or_else(|| {
				warn!(target = "hrlink", url, global, "script loaded without defining global");
				Error::IntegrationUnavailable {
					global: global.to_string(),
				}
			}),
			ScriptEvent::Error(reason) => {
				warn!(target = "hrlink", url, %reason, "script failed to load");
				Err(Error::ScriptLoadFailure {
					url: url.to_string(),
					reason,
				})
			}
		}
	}

	/// Number of script tags injected so far; never more than one.
	pub fn injection_count(&self) -> usize {
		usize::from(self.injected.lock().is_some())
	}

	fn pending_event(&self, url: &str) -> Result<PendingEvent> {
		let mut injected = self.injected.lock();
		if let Some(injection) = injected.as_ref() {
			if injection.url != url {
				warn!(
					target = "hrlink",
					injected = %injection.url,
					requested = url,
					"script already injected from another URL"
				);
				return Err(Error::ScriptConflict {
					injected: injection.url.clone(),
					requested: url.to_string(),
				});
			}
			return Ok(injection.event.clone());
		}

		info!(target = "hrlink", url, "injecting script");
		let event = self.host.inject(ScriptTag::new(url)).shared();
		*injected = Some(Injection {
			url: url.to_string(),
			event: event.clone(),
		});
		Ok(event)
	}
}
