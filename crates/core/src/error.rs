//! Error types for each layer of the orchestration engine.
//!
//! Lower layers never abort the process: transport and API failures surface as
//! values here and are converted into per-row outcomes by the orchestrator.
//! Only [`RunError`] is run-fatal.

use thiserror::Error;

/// Failure to exchange a request with the replication manager.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("invalid endpoint {endpoint}: {reason}")]
	InvalidEndpoint { endpoint: String, reason: String },

	#[error("failed to build HTTP client: {0}")]
	Client(String),

	#[error("request to {path} failed: {reason}")]
	Request { path: String, reason: String },

	#[error("request to {path} timed out")]
	Timeout { path: String },
}

/// Failure of a session-authenticated API call.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error(transparent)]
	Transport(#[from] TransportError),

	#[error("{path} returned HTTP {status}: {body}")]
	Status { path: String, status: u16, body: String },

	#[error("{path} returned a malformed response: {reason}")]
	Malformed { path: String, reason: String },
}

/// Failure to establish the run's session.
#[derive(Debug, Error)]
pub enum AuthError {
	#[error("authentication rejected with HTTP {status}")]
	Rejected { status: u16 },

	#[error("authentication succeeded but no session token was returned")]
	MissingToken,

	#[error("authentication request failed: {0}")]
	Transport(#[from] TransportError),
}

/// Failure of a single failover operation against one protection group.
#[derive(Debug, Error)]
pub enum OperationError {
	#[error("no protection group named {name:?}")]
	GroupNotFound { name: String },

	#[error("protection group {vpg_id} has no checkpoint to recover from")]
	NoCheckpoint { vpg_id: String },

	#[error(transparent)]
	Api(#[from] ApiError),
}

/// Conditions that stop the batch before any row is processed.
#[derive(Debug, Error)]
pub enum RunError {
	#[error("unable to authenticate with the replication manager: {0}")]
	Authentication(#[from] AuthError),

	#[error("unable to reach the replication manager: {0}")]
	Transport(#[from] TransportError),
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
