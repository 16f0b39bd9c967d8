//! Host environment capabilities for the hrlink connect flow.
//!
//! The widget this crate bootstraps lives in a host-provided global scope that
//! the rest of the system cannot observe directly. Everything here talks to
//! that scope through [`CapabilityProvider`] and [`ScriptHost`], both supplied
//! by the host at construction time.
//!
//! - [`ScriptLoader`] injects a remote script at most once and resolves when
//!   the expected global appears.
//! - [`AvailabilityPoller`] watches a global on a fixed interval and reports
//!   presence flips through a [`PollHandle`] that stops the timer on drop.

pub mod capability;
pub mod error;
pub mod poller;
pub mod script_loader;

pub use capability::{CapabilityProvider, GlobalScope};
pub use error::{Error, Result};
pub use poller::{AvailabilityPoller, PollHandle, WidgetAvailability};
pub use script_loader::{CrossOrigin, ScriptEvent, ScriptHost, ScriptLoader, ScriptTag};
