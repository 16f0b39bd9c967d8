//! Interval-based presence detection for a host global.
//!
//! A widget script may finish loading at a time no future can observe (for
//! example when another part of the host injected it). [`AvailabilityPoller`]
//! re-checks the global on a fixed interval and reports only actual flips.
//! The timer lives exactly as long as the returned [`PollHandle`].


use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::capability::CapabilityProvider;

/// Shortest interval the poller will tick at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Last observed presence of the watched global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WidgetAvailability {
	pub present: bool,
	/// [`None`] until the first evaluation.
	pub checked_at: Option<Instant>,
}

/// Starts presence polling; see [`AvailabilityPoller::start`].
pub struct AvailabilityPoller;

impl AvailabilityPoller {
	/// Watches `global` in `scope`, evaluating once immediately and then every
	/// `interval` until the returned handle is cancelled or dropped.
	///
	/// Presence starts out as absent. `on_change` runs once per flip, so it
	/// fires during this call only if the global is already present.
	///
	/// Must be called from within a tokio runtime.
	pub fn start<H, F>(
		scope: Arc<dyn CapabilityProvider<H>>,
		global: &str,
		interval: Duration,
		mut on_change: F,
	) -> PollHandle
	where
		H: 'static,
		F: FnMut(bool) + Send + 'static,
	{
		let global = global.to_string();
		let interval = interval.max(MIN_POLL_INTERVAL);
		let state = Arc::new(Mutex::new(WidgetAvailability::default()));

		if let Some(present) = observe(&*scope, &global, &state) {
			on_change(present);
		}

		let task_state = Arc::clone(&state);
		let task = tokio::spawn(async move {
			let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				if let Some(present) = observe(&*scope, &global, &task_state) {
					on_change(present);
				}
			}
		});

		PollHandle {
			task: Some(task),
			state,
		}
	}
}

/// Records one evaluation and returns the new presence if it flipped.
fn observe<H>(
	scope: &dyn CapabilityProvider<H>,
	global: &str,
	state: &Mutex<WidgetAvailability>,
) -> Option<bool> {
	let present = scope.is_present(global);
	let mut availability = state.lock();
	let flipped = availability.present != present;
	availability.present = present;
	availability.checked_at = Some(Instant::now());
	drop(availability);

	if flipped {
		info!(target = "hrlink", global, present, "widget availability changed");
		Some(present)
	} else {
		None
	}
}

/// Owns the polling timer. Dropping the handle stops polling.
pub struct PollHandle {
	task: Option<JoinHandle<()>>,
	state: Arc<Mutex<WidgetAvailability>>,
}

impl PollHandle {
	/// Latest evaluation result.
	pub fn availability(&self) -> WidgetAvailability {
		*self.state.lock()
	}

	pub fn is_present(&self) -> bool {
		self.state.lock().present
	}

	/// Returns `true` until the handle is cancelled.
	pub fn is_running(&self) -> bool {
		self.task.as_ref().is_some_and(|task| !task.is_finished())
	}

	/// Stops polling. Equivalent to dropping.
	pub fn cancel(mut self) {
		self.stop();
	}

	fn stop(&mut self) {
		if let Some(task) = self.task.take() {
			debug!(target = "hrlink", "stopping availability poller");
			task.abort();
		}
	}
}

impl Drop for PollHandle {
	fn drop(&mut self) {
		self.stop();
	}
}

impl std::fmt::Debug for PollHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PollHandle")
			.field("availability", &self.availability())
			.field("running", &self.task.is_some())
			.finish()
	}
}
