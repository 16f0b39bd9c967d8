//! Terminal stand-ins for the widget global and the script host.

use std::io::{BufRead, BufReader};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use hrlink::{GlobalScope, LinkWidget, ScriptHost, WidgetConfig, WidgetError, redact};
use hrlink_runtime::{ScriptEvent, ScriptTag};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// How a line typed at the widget prompt is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
	/// Any other non-blank line is the public token.
	Success(String),
	/// Blank line or end of input.
	Exit,
	/// `!` followed by an optional message.
	Error(Option<String>),
}

pub fn interpret(line: &str) -> Answer {
	let line = line.trim();
	if line.is_empty() {
		return Answer::Exit;
	}
	match line.strip_prefix('!') {
		Some(message) => {
			let message = message.trim();
			Answer::Error((!message.is_empty()).then(|| message.to_string()))
		}
		None => Answer::Success(line.to_string()),
	}
}

type Input = Arc<Mutex<Box<dyn BufRead + Send>>>;

/// Widget that asks the operator for the outcome instead of showing a UI.
pub struct TerminalWidget {
	input: Input,
	config: Mutex<Option<WidgetConfig>>,
}

impl TerminalWidget {
	pub fn new(input: Box<dyn BufRead + Send>) -> Self {
		Self {
			input: Arc::new(Mutex::new(input)),
			config: Mutex::new(None),
		}
	}

	pub fn stdin() -> Self {
		Self::new(Box::new(BufReader::new(std::io::stdin())))
	}
}

impl LinkWidget for TerminalWidget {
	fn initialize(&self, config: WidgetConfig) {
		debug!(target = "hrlink", token = %redact(&config.link_token), "terminal widget initialized");
		*self.config.lock() = Some(config);
	}

	fn open_link(&self) {
		let Some(config) = self.config.lock().take() else {
			warn!(target = "hrlink", "open_link called before initialize");
			return;
		};
		eprintln!("Link session {} opened.", redact(&config.link_token));
		eprintln!("Enter the public token (blank line to close, '!message' to report an error):");

		let input = Arc::clone(&self.input);
		tokio::task::spawn_blocking(move || {
			let mut line = String::new();
			let answer = match input.lock().read_line(&mut line) {
				Ok(0) => Answer::Exit,
				Ok(_) => interpret(&line),
				Err(err) => Answer::Error(Some(err.to_string())),
			};
			let callbacks = config.callbacks;
			match answer {
				Answer::Success(token) => callbacks.success(token),
				Answer::Exit => callbacks.exit(),
				Answer::Error(message) => callbacks.error(WidgetError { message }),
			}
		});
	}
}

/// Script host that downloads the script and, on success, defines the widget
/// global itself. The terminal cannot evaluate the script, so a successful
/// download stands in for its evaluation.
pub struct FetchScriptHost {
	http: reqwest::Client,
	scope: Arc<GlobalScope<Arc<dyn LinkWidget>>>,
	global: String,
	widget: Arc<dyn LinkWidget>,
}

impl FetchScriptHost {
	pub fn new(
		scope: Arc<GlobalScope<Arc<dyn LinkWidget>>>,
		global: impl Into<String>,
		widget: Arc<dyn LinkWidget>,
	) -> Self {
		Self {
			http: reqwest::Client::new(),
			scope,
			global: global.into(),
			widget,
		}
	}
}

impl ScriptHost for FetchScriptHost {
	fn inject(&self, tag: ScriptTag) -> BoxFuture<'static, ScriptEvent> {
		info!(
			target = "hrlink",
			src = %tag.src,
			crossorigin = tag.cross_origin.as_str(),
			"fetching widget script"
		);
		let request = self.http.get(&tag.src);
		let scope = Arc::clone(&self.scope);
		let global = self.global.clone();
		let widget = Arc::clone(&self.widget);
		async move {
			match request.send().await.and_then(|response| response.error_for_status()) {
				Ok(_) => {
					scope.define(global, widget);
					ScriptEvent::Load
				}
				Err(err) => ScriptEvent::Error(err.to_string()),
			}
		}
		.boxed()
	}
}

#[cfg(test)]
mod tests {
	use std::io::Cursor;

	use hrlink::{WidgetOutcome, run_widget};

	use super::*;

	#[test]
	fn interpret_answers() {
		assert_eq!(interpret("pub_xyz789\n"), Answer::Success("pub_xyz789".into()));
		assert_eq!(interpret("   \n"), Answer::Exit);
		assert_eq!(
			interpret("!Provider login failed"),
			Answer::Error(Some("Provider login failed".into()))
		);
		assert_eq!(interpret("!"), Answer::Error(None));
	}

	async fn answer(input: &str) -> WidgetOutcome {
		let widget = TerminalWidget::new(Box::new(Cursor::new(input.to_string())));
		run_widget(&widget, "tok_abc123").await
	}

	#[tokio::test]
	async fn typed_token_is_success() {
		assert_eq!(
			answer("pub_xyz789\n").await,
			WidgetOutcome::Success {
				public_token: "pub_xyz789".into()
			}
		);
	}

	#[tokio::test]
	async fn end_of_input_is_exit() {
		assert_eq!(answer("").await, WidgetOutcome::Exit);
	}

	#[tokio::test]
	async fn bare_bang_reports_fallback_error() {
		assert_eq!(
			answer("!\n").await,
			WidgetOutcome::Error {
				message: hrlink::error::WIDGET_ERROR_FALLBACK.into()
			}
		);
	}
}
