//! Error types for the CLI

use thiserror::Error;
use zvm::RunError;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("configuration error: {0}")]
	Config(String),

	#[error("input error: {0}")]
	Input(String),

	#[error(transparent)]
	Run(#[from] RunError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

impl From<csv::Error> for CliError {
	fn from(err: csv::Error) -> Self {
		CliError::Input(err.to_string())
	}
}
