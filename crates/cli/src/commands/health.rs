use anyhow::Context;
use hrlink_protocol::HEALTH_PATH;
use tracing::info;

use crate::cli::BackendArgs;
use crate::error::{CliError, Result};

pub async fn run(args: BackendArgs) -> Result<()> {
	let backend = super::backend(&args);
	let health = backend
		.health()
		.await
		.with_context(|| format!("GET {HEALTH_PATH} failed"))?;
	info!(target = "hrlink", url = backend.base_url().unwrap_or(""), status = %health.status, "health probe");
	if !health.is_healthy() {
		return Err(CliError::Unhealthy(health.status));
	}
	println!("{}", health.status);
	Ok(())
}
