//! Injected lookup of host-defined globals.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Resolves named globals exposed by the host environment.
///
/// `H` is the handle type the host hands out for a global (for the connect
/// flow, a widget handle). Implementations must be cheap to call; the
/// [`AvailabilityPoller`](crate::AvailabilityPoller) calls [`lookup`](Self::lookup)
/// on every tick.
pub trait CapabilityProvider<H>: Send + Sync {
	/// Returns the handle bound to `global`, if the host currently defines it.
	fn lookup(&self, global: &str) -> Option<H>;

	fn is_present(&self, global: &str) -> bool {
		self.lookup(global).is_some()
	}
}

/// In-memory global scope.
///
/// Hosts that own their globals (terminal hosts, tests) define and remove
/// handles here directly.
pub struct GlobalScope<H> {
	globals: RwLock<HashMap<String, H>>,
}

impl<H> Default for GlobalScope<H> {
	fn default() -> Self {
		Self {
			globals: RwLock::new(HashMap::new()),
		}
	}
}

impl<H> GlobalScope<H> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Binds `handle` to `global`, replacing any previous binding.
	pub fn define(&self, global: impl Into<String>, handle: H) {
		self.globals.write().insert(global.into(), handle);
	}

	pub fn remove(&self, global: &str) -> Option<H> {
		self.globals.write().remove(global)
	}
}

impl<H> CapabilityProvider<H> for GlobalScope<H>
where
	H: Clone + Send + Sync,
{
	fn lookup(&self, global: &str) -> Option<H> {
		self.globals.read().get(global).cloned()
	}
}
