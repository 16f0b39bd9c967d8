//! `hrlink connect`: one attempt against the terminal widget.

use std::io::Write;
use std::sync::Arc;

use hrlink::{
	AvailabilityPoller, GlobalScope, LinkBackend, LinkSession, LinkSessionController, LinkWidget,
	ScriptLoader, SessionStatus, ShellView, WidgetProvider,
};
use tracing::debug;

use crate::cli::ConnectArgs;
use crate::error::{CliError, Result};
use crate::terminal::{FetchScriptHost, TerminalWidget};

pub async fn run(args: ConnectArgs) -> Result<()> {
	let backend = Arc::new(super::backend(&args.backend));
	let widget = Arc::new(TerminalWidget::stdin());
	let mut stdout = std::io::stdout();
	execute(&args, backend, widget, &mut stdout).await.map(|_| ())
}

/// Runs the attempt and writes the shell view before and after it.
///
/// Without a script URL the widget global is defined up front; with one, it
/// is bootstrapped on connect.
///
/// # Errors
///
/// [`CliError::ConnectFailed`] when the session ends failed.
pub async fn execute<W: Write>(
	args: &ConnectArgs,
	backend: Arc<dyn LinkBackend>,
	widget: Arc<dyn LinkWidget>,
	out: &mut W,
) -> Result<LinkSession> {
	let config = args.link_config();
	let scope: Arc<GlobalScope<Arc<dyn LinkWidget>>> = Arc::new(GlobalScope::new());
	let widgets: Arc<WidgetProvider> = scope.clone();

	let mut controller = LinkSessionController::new(backend, widgets.clone(), config.clone());
	if config.script.is_some() {
		let host = Arc::new(FetchScriptHost::new(scope.clone(), &config.widget_global, widget));
		controller = controller.with_script_loader(Arc::new(ScriptLoader::new(host, widgets.clone())));
	} else {
		scope.define(&config.widget_global, widget);
	}

	let poll = AvailabilityPoller::start(widgets, &config.widget_global, config.poll_interval, |present| {
		debug!(target = "hrlink", present, "connect button availability refreshed");
	});

	let mut updates = controller.subscribe();
	let progress = tokio::spawn(async move {
		while updates.changed().await.is_ok() {
			let status = updates.borrow_and_update().status;
			debug!(target = "hrlink", %status, "session update");
		}
	});

	writeln!(out, "{}", ShellView::project(&controller.snapshot(), poll.availability()).render())?;
	let session = controller.connect(&args.request()).await;
	writeln!(out, "{}", ShellView::project(&session, poll.availability()).render())?;

	poll.cancel();
	progress.abort();

	if session.status == SessionStatus::Failed {
		let message = session.error_message.clone().unwrap_or_default();
		return Err(CliError::ConnectFailed(message));
	}
	Ok(session)
}
