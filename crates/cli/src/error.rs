use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// The connect attempt ended in the failed state. The shell view already
	/// showed the message; used to signal exit code 1 without more output.
	#[error("connect failed: {0}")]
	ConnectFailed(String),

	#[error("backend reported status '{0}'")]
	Unhealthy(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	pub fn is_output_already_printed(&self) -> bool {
		matches!(self, CliError::ConnectFailed(_))
	}
}
