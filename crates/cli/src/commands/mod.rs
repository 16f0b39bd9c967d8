mod connect;
mod health;

pub use connect::execute;

use hrlink::HttpBackend;

use crate::cli::{BackendArgs, Cli, Commands};
use crate::error::Result;

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Connect(args) => connect::run(args).await,
		Commands::Health(args) => health::run(args).await,
	}
}

/// A missing URL is deferred to request time, like the library's `from_env`.
fn backend(args: &BackendArgs) -> HttpBackend {
	match &args.backend_url {
		Some(url) => HttpBackend::new(url.clone()),
		None => HttpBackend::from_env(),
	}
}
