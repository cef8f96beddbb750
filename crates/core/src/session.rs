//! Run-scoped authentication against the replication manager.

use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::transport::{ApiRequest, RequestAuth, Transport};

/// Path of the session-creation endpoint.
pub const SESSION_PATH: &str = "/v1/session/add";

/// Username/password pair used once per run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	pub username: String,
	password: String,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}

	pub fn password(&self) -> &str {
		&self.password
	}
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Authenticated session shared read-only by every API call of a run.
///
/// Never refreshed: once the token expires, later calls fail and are reported.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
	base_url: String,
	token: String,
}

impl Session {
	pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			token: token.into(),
		}
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn token(&self) -> &str {
		&self.token
	}

	pub(crate) fn auth(&self) -> RequestAuth {
		RequestAuth::Session(self.token.clone())
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session").field("base_url", &self.base_url).finish_non_exhaustive()
	}
}

/// Establishes the session used for the rest of the run.
pub struct SessionManager;

impl SessionManager {
	/// Posts basic credentials to the session endpoint and captures the token header.
	///
	/// A success status without the session header is still a failure.
	pub async fn authenticate(transport: &dyn Transport, credentials: &Credentials) -> Result<Session, AuthError> {
		let endpoint = transport.endpoint().to_string();
		debug!(target = "zvm.session", %endpoint, username = %credentials.username, "authenticating");

		let request = ApiRequest::post(SESSION_PATH).with_auth(RequestAuth::Basic {
			username: credentials.username.clone(),
			password: credentials.password.clone(),
		});

		let response = transport.execute(request).await.map_err(|err| {
			warn!(target = "zvm.session", %endpoint, error = %err, "session request failed");
			AuthError::from(err)
		})?;

		if !response.is_success() {
			warn!(target = "zvm.session", %endpoint, status = response.status, "session rejected");
			return Err(AuthError::Rejected { status: response.status });
		}

		let Some(token) = response.session_token.filter(|token| !token.is_empty()) else {
			warn!(target = "zvm.session", %endpoint, "session response lacks token header");
			return Err(AuthError::MissingToken);
		};

		info!(target = "zvm.session", %endpoint, "session established");
		Ok(Session::new(endpoint, token))
	}
}
