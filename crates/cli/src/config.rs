//! TOML configuration: replication manager endpoint, credentials and tuning.
//!
//! ```toml
//! [zvm]
//! uri = "https://zvm.example:9669"
//! username = "admin"
//! password = "secret"
//!
//! [client]
//! accept_invalid_certs = true
//! request_timeout_secs = 60
//!
//! [poll]
//! interval_secs = 5
//! max_polls = 720
//! on_error = "retry"
//! retry_attempts = 3
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use zvm::{ClientConfig, Credentials, PollErrorPolicy, PollSettings};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
	pub zvm: ZvmSection,
	#[serde(default)]
	pub client: ClientSection,
	#[serde(default)]
	pub poll: PollSection,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZvmSection {
	pub uri: String,
	pub username: String,
	pub password: String,
}

impl std::fmt::Debug for ZvmSection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ZvmSection")
			.field("uri", &self.uri)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSection {
	pub accept_invalid_certs: bool,
	pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSection {
	fn default() -> Self {
		Self {
			accept_invalid_certs: true,
			request_timeout_secs: None,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnPollError {
	#[default]
	FailOpen,
	FailClosed,
	Retry,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSection {
	pub interval_secs: u64,
	pub max_polls: Option<u32>,
	pub on_error: OnPollError,
	pub retry_attempts: u32,
}

impl Default for PollSection {
	fn default() -> Self {
		Self {
			interval_secs: 5,
			max_polls: None,
			on_error: OnPollError::FailOpen,
			retry_attempts: 3,
		}
	}
}

impl AppConfig {
	/// Reads and validates the configuration at `path`.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path).map_err(|e| CliError::Config(format!("cannot read {}: {e}", path.display())))?;
		Self::parse(&content).map_err(|e| match e {
			CliError::Config(msg) => CliError::Config(format!("{}: {msg}", path.display())),
			other => other,
		})
	}

	pub fn parse(content: &str) -> Result<Self> {
		let config: Self = toml::from_str(content).map_err(|e| CliError::Config(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.zvm.uri.trim().is_empty() {
			return Err(CliError::Config("[zvm] uri must not be empty".to_string()));
		}
		if self.zvm.username.is_empty() {
			return Err(CliError::Config("[zvm] username must not be empty".to_string()));
		}
		if self.poll.interval_secs == 0 {
			return Err(CliError::Config("[poll] interval_secs must be at least 1".to_string()));
		}
		Ok(())
	}

	pub fn credentials(&self) -> Credentials {
		Credentials::new(&self.zvm.username, &self.zvm.password)
	}

	pub fn client_config(&self) -> ClientConfig {
		ClientConfig::new(&self.zvm.uri)
			.with_accept_invalid_certs(self.client.accept_invalid_certs)
			.with_request_timeout(self.client.request_timeout_secs.map(Duration::from_secs))
	}

	pub fn poll_settings(&self) -> PollSettings {
		let on_error = match self.poll.on_error {
			OnPollError::FailOpen => PollErrorPolicy::FailOpen,
			OnPollError::FailClosed => PollErrorPolicy::FailClosed,
			OnPollError::Retry => PollErrorPolicy::Retry {
				attempts: self.poll.retry_attempts,
			},
		};
		PollSettings {
			interval: Duration::from_secs(self.poll.interval_secs),
			max_polls: self.poll.max_polls,
			on_error,
		}
	}
}
