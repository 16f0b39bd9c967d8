//! What a presentation layer shows for the current session.
//!
//! [`ShellView`] is a pure projection: it reads a [`LinkSession`] and the
//! latest [`WidgetAvailability`] and never mutates either.

use hrlink_runtime::WidgetAvailability;

use crate::session::{LinkSession, SessionStatus};

pub const CONNECT_LABEL: &str = "Connect your HR system";
pub const CONNECTING_LABEL: &str = "Connecting...";
pub const SUCCESS_HEADING: &str = "Connected successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectButton {
	pub label: &'static str,
	/// False while loading or while the widget is unavailable.
	pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView {
	pub button: ConnectButton,
	pub error: Option<String>,
	/// Pretty-printed exchange payload.
	pub result: Option<String>,
}

impl ShellView {
	pub fn project(session: &LinkSession, availability: WidgetAvailability) -> Self {
		let loading = session.is_loading();
		let button = ConnectButton {
			label: if loading { CONNECTING_LABEL } else { CONNECT_LABEL },
			enabled: !loading && availability.present,
		};

		let error = match session.status {
			SessionStatus::Failed => session.error_message.clone(),
			_ => None,
		};

		let result = match (session.status, &session.result_payload) {
			(SessionStatus::Succeeded, Some(payload)) => Some(
				serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string()),
			),
			_ => None,
		};

		Self {
			button,
			error,
			result,
		}
	}

	/// Plain-text rendering for terminal hosts.
	pub fn render(&self) -> String {
		let mut lines = Vec::new();
		let state = if self.button.enabled { "" } else { " (disabled)" };
		lines.push(format!("[ {} ]{state}", self.button.label));
		if let Some(error) = &self.error {
			lines.push(format!("Error: {error}"));
		}
		if let Some(result) = &self.result {
			lines.push(SUCCESS_HEADING.to_string());
			lines.push(result.clone());
		}
		lines.join("\n")
	}
}
