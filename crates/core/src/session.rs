//! The transient state of one connect attempt.

use serde::Serialize;
use serde_json::Value;

/// Where a connect attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
	#[default]
	Idle,
	/// Waiting for the widget script to define its global.
	AwaitingWidget,
	RequestingToken,
	WidgetOpen,
	Exchanging,
	Succeeded,
	Failed,
}

impl SessionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			SessionStatus::Idle => "idle",
			SessionStatus::AwaitingWidget => "awaiting-widget",
			SessionStatus::RequestingToken => "requesting-token",
			SessionStatus::WidgetOpen => "widget-open",
			SessionStatus::Exchanging => "exchanging",
			SessionStatus::Succeeded => "succeeded",
			SessionStatus::Failed => "failed",
		}
	}

	/// True while a request or the widget is outstanding.
	pub fn is_in_flight(self) -> bool {
		matches!(
			self,
			SessionStatus::AwaitingWidget
				| SessionStatus::RequestingToken
				| SessionStatus::WidgetOpen
				| SessionStatus::Exchanging
		)
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, SessionStatus::Succeeded | SessionStatus::Failed)
	}
}

impl std::fmt::Display for SessionStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Snapshot of the active connect attempt.
///
/// `id` is the session generation: every new attempt and every reset gets a
/// larger one, so continuations of older attempts can tell they are stale.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LinkSession {
	pub id: u64,
	pub status: SessionStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
	/// Exchange response, stored verbatim.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result_payload: Option<Value>,
}

impl LinkSession {
	/// Fresh session with no error and no payload.
	pub fn idle(id: u64) -> Self {
		Self {
			id,
			..Self::default()
		}
	}

	/// Drives the connect button's loading state.
	pub fn is_loading(&self) -> bool {
		self.status.is_in_flight()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_serializes_kebab_case() {
		let json = serde_json::to_string(&SessionStatus::RequestingToken).unwrap();
		assert_eq!(json, r#""requesting-token""#);
		assert_eq!(SessionStatus::AwaitingWidget.to_string(), "awaiting-widget");
	}

	#[test]
	fn only_outstanding_states_are_loading() {
		assert!(!LinkSession::idle(1).is_loading());
		for status in [
			SessionStatus::AwaitingWidget,
			SessionStatus::RequestingToken,
			SessionStatus::WidgetOpen,
			SessionStatus::Exchanging,
		] {
			assert!(status.is_in_flight(), "{status} should be in flight");
			assert!(!status.is_terminal());
		}
		assert!(SessionStatus::Succeeded.is_terminal());
		assert!(!SessionStatus::Failed.is_in_flight());
	}
}
