
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use hrlink::config::{BACKEND_URL_ENV, DEFAULT_POLL_INTERVAL, DEFAULT_SCRIPT_TIMEOUT};
use hrlink::{Category, ConnectRequest, LinkConfig, ScriptSource};

use crate::styles::cli_styles;

/// Root CLI for hrlink.
#[derive(Parser, Debug)]
#[command(name = "hrlink")]
#[command(about = "Connect an HR system through the hosted link widget")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run one connect attempt, answering the widget from stdin.
	Connect(ConnectArgs),
	/// Probe the backend's health endpoint.
	Health(BackendArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
	/// Backend base URL. Requests fail individually when unset.
	#[arg(long, value_name = "URL", env = BACKEND_URL_ENV)]
	pub backend_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
	#[command(flatten)]
	pub backend: BackendArgs,

	/// End-user identifier in this system.
	#[arg(long, value_name = "ID")]
	pub user_id: String,

	#[arg(long, value_name = "ID")]
	pub organization_id: String,

	#[arg(long, value_name = "NAME")]
	pub organization_name: String,

	#[arg(long, value_name = "EMAIL")]
	pub email: String,

	/// Integration category to offer (repeatable; default: all).
	#[arg(long = "category", value_name = "CATEGORY")]
	pub categories: Vec<Category>,

	/// Bootstrap the widget from this script instead of defining it up front.
	#[arg(long, value_name = "URL")]
	pub script_url: Option<String>,

	/// How long to wait for the widget script, in milliseconds.
	#[arg(long, value_name = "MS", default_value_t = DEFAULT_SCRIPT_TIMEOUT.as_millis() as u64)]
	pub script_timeout_ms: u64,

	/// Widget availability polling interval, in milliseconds.
	#[arg(long, value_name = "MS", default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
	pub poll_interval_ms: u64,
}

impl ConnectArgs {
	pub fn request(&self) -> ConnectRequest {
		let categories = if self.categories.is_empty() {
			Category::ALL.to_vec()
		} else {
			self.categories.clone()
		};
		ConnectRequest {
			end_user_id: self.user_id.clone(),
			organization_name: self.organization_name.clone(),
			email: self.email.clone(),
			categories,
			organization_id: self.organization_id.clone(),
		}
	}

	pub fn link_config(&self) -> LinkConfig {
		LinkConfig {
			poll_interval: Duration::from_millis(self.poll_interval_ms),
			script: self.script_url.as_ref().map(|url| ScriptSource {
				url: url.clone(),
				timeout: Duration::from_millis(self.script_timeout_ms),
			}),
			..LinkConfig::default()
		}
	}
}
