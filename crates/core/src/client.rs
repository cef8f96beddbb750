//! Session-authenticated GET/POST helpers over a [`Transport`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::error::{ApiError, Result};
use crate::session::Session;
use crate::transport::{ApiRequest, QueryParams, Transport};

/// API client bound to one transport and the run's session.
#[derive(Clone, Copy)]
pub struct ApiClient<'a> {
	transport: &'a dyn Transport,
	session: &'a Session,
}

impl<'a> ApiClient<'a> {
	pub fn new(transport: &'a dyn Transport, session: &'a Session) -> Self {
		Self { transport, session }
	}

	/// GETs `path` and parses the body as JSON.
	pub async fn get(&self, path: &str, query: QueryParams) -> Result<Value> {
		let request = ApiRequest::get(path).with_query(query).with_auth(self.session.auth());
		let response = self.transport.execute(request).await?;

		if !response.is_success() {
			return Err(ApiError::Status {
				path: path.to_string(),
				status: response.status,
				body: response.body,
			});
		}

		serde_json::from_str(&response.body).map_err(|e| ApiError::Malformed {
			path: path.to_string(),
			reason: e.to_string(),
		})
	}

	/// GETs `path` and deserializes the body into `T`.
	pub async fn get_as<T: DeserializeOwned>(&self, path: &str, query: QueryParams) -> Result<T> {
		let value = self.get(path, query).await?;
		serde_json::from_value(value).map_err(|e| ApiError::Malformed {
			path: path.to_string(),
			reason: e.to_string(),
		})
	}

	/// POSTs `body` to `path` and returns the raw response body.
	///
	/// The body is returned whatever the status: the replication manager reports
	/// rejected actions as an error document in place of a task identifier.
	pub async fn post(&self, path: &str, body: Option<Value>) -> Result<String> {
		let request = ApiRequest::post(path).with_body(body).with_auth(self.session.auth());
		let response = self.transport.execute(request).await?;
		trace!(target = "zvm.transport", %path, status = response.status, "post complete");
		Ok(response.body)
	}
}
