//! Request/response seam between the engine and the replication manager.
//!
//! Everything above this module speaks in [`ApiRequest`] / [`ApiResponse`];
//! [`HttpTransport`] puts them on the wire and [`FakeTransport`] answers them
//! in memory for tests.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::TransportError;

pub mod fake;
pub mod http;

pub use fake::{FakeTransport, FakeTransportController};
pub use http::{ClientConfig, HttpTransport};

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + Send + 'a>>;

/// Executes API requests against a fixed base endpoint.
pub trait Transport: Send + Sync {
	/// Base endpoint every request path is resolved against.
	fn endpoint(&self) -> &str;

	/// Sends `request` and returns the raw response.
	///
	/// Non-success HTTP statuses are returned as responses, not errors.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP verb of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
}

impl std::fmt::Display for Method {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Method::Get => write!(f, "GET"),
			Method::Post => write!(f, "POST"),
		}
	}
}

/// Credentials attached to a request.
#[derive(Clone, PartialEq, Eq)]
pub enum RequestAuth {
	None,
	Basic { username: String, password: String },
	Session(String),
}

impl std::fmt::Debug for RequestAuth {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RequestAuth::None => write!(f, "None"),
			RequestAuth::Basic { username, .. } => f.debug_struct("Basic").field("username", username).finish_non_exhaustive(),
			RequestAuth::Session(_) => write!(f, "Session(..)"),
		}
	}
}

/// Ordered query parameters; setting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
	pairs: Vec<(String, String)>,
}

impl QueryParams {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `key` to `value`, keeping the key's original position.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
		let key = key.into();
		let value = value.into();
		match self.pairs.iter_mut().find(|(existing, _)| *existing == key) {
			Some(pair) => pair.1 = value,
			None => self.pairs.push((key, value)),
		}
		self
	}

	/// Builder form of [`QueryParams::set`].
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(key, value);
		self
	}

	/// Sets `key` only when `value` is non-empty.
	pub fn with_non_empty(self, key: impl Into<String>, value: &str) -> Self {
		if value.is_empty() { self } else { self.with(key, value) }
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	pub fn pairs(&self) -> &[(String, String)] {
		&self.pairs
	}
}

/// A single call to the replication manager API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
	pub method: Method,
	pub path: String,
	pub query: QueryParams,
	pub body: Option<Value>,
	pub auth: RequestAuth,
}

impl ApiRequest {
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: QueryParams::new(),
			body: None,
			auth: RequestAuth::None,
		}
	}

	pub fn with_query(mut self, query: QueryParams) -> Self {
		self.query = query;
		self
	}

	pub fn with_body(mut self, body: Option<Value>) -> Self {
		self.body = body;
		self
	}

	pub fn with_auth(mut self, auth: RequestAuth) -> Self {
		self.auth = auth;
		self
	}
}

/// Raw response as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
	pub status: u16,
	/// Value of the session header, when present.
	pub session_token: Option<String>,
	pub body: String,
}

impl ApiResponse {
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			session_token: None,
			body: body.into(),
		}
	}

	/// 200 response carrying `value` serialized as JSON.
	pub fn json(value: Value) -> Self {
		Self::new(200, value.to_string())
	}

	pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
		self.session_token = Some(token.into());
		self
	}

	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn query_params_last_write_wins_in_place() {
		let mut query = QueryParams::new();
		query.set("vpgName", "AppA").set("vmName", "db-01").set("vpgName", "AppB");
		assert_eq!(
			query.pairs(),
			&[("vpgName".to_string(), "AppB".to_string()), ("vmName".to_string(), "db-01".to_string())]
		);
		assert_eq!(query.get("vpgName"), Some("AppB"));
	}

	#[test]
	fn query_params_skip_empty_values() {
		let query = QueryParams::new().with_non_empty("vpgName", "AppA").with_non_empty("vmName", "");
		assert_eq!(query.pairs().len(), 1);
		assert!(query.get("vmName").is_none());
	}

	#[test]
	fn request_auth_debug_redacts_secrets() {
		let basic = RequestAuth::Basic {
			username: "admin".to_string(),
			password: "hunter2".to_string(),
		};
		let rendered = format!("{basic:?} {:?}", RequestAuth::Session("token-123".to_string()));
		assert!(rendered.contains("admin"));
		assert!(!rendered.contains("hunter2"));
		assert!(!rendered.contains("token-123"));
	}

	#[test]
	fn response_success_range() {
		assert!(ApiResponse::new(200, "").is_success());
		assert!(ApiResponse::new(204, "").is_success());
		assert!(!ApiResponse::new(401, "").is_success());
		assert!(!ApiResponse::new(500, "").is_success());
	}
}
