//! In-memory transport for exercising the engine without a replication manager.
//!
//! # Example
//!
//! ```ignore
//! let (transport, controller) = FakeTransport::new("https://zvm.test", |request| match request.path.as_str() {
//!     "/v1/session/add" => Ok(ApiResponse::new(200, "").with_session_token("s-1")),
//!     _ => Ok(ApiResponse::new(404, "")),
//! });
//! // ... drive the engine with `transport` ...
//! assert_eq!(controller.count(Method::Post, "/v1/session/add"), 1);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use super::{ApiRequest, ApiResponse, Method, Transport, TransportFuture};
use crate::error::TransportError;

type Responder = dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync;

/// Transport answering every request through a routing function.
#[derive(Clone)]
pub struct FakeTransport {
	endpoint: String,
	responder: Arc<Responder>,
	sent: Arc<Mutex<Vec<ApiRequest>>>,
}

impl FakeTransport {
	/// Creates a transport and a controller sharing its request log.
	pub fn new<F>(endpoint: impl Into<String>, responder: F) -> (Self, FakeTransportController)
	where
		F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
	{
		let sent = Arc::new(Mutex::new(Vec::new()));
		let transport = Self {
			endpoint: endpoint.into(),
			responder: Arc::new(responder),
			sent: Arc::clone(&sent),
		};
		(transport, FakeTransportController { sent })
	}
}

impl std::fmt::Debug for FakeTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FakeTransport").field("endpoint", &self.endpoint).finish_non_exhaustive()
	}
}

impl Transport for FakeTransport {
	fn endpoint(&self) -> &str {
		&self.endpoint
	}

	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let response = (self.responder)(&request);
		self.sent.lock().push(request);
		Box::pin(async move { response })
	}
}

/// Inspects requests sent through a [`FakeTransport`].
#[derive(Clone)]
pub struct FakeTransportController {
	sent: Arc<Mutex<Vec<ApiRequest>>>,
}

impl FakeTransportController {
	/// All requests sent so far, in order.
	pub fn requests(&self) -> Vec<ApiRequest> {
		self.sent.lock().clone()
	}

	/// `METHOD path` lines for every request sent so far.
	pub fn calls(&self) -> Vec<String> {
		self.sent.lock().iter().map(|r| format!("{} {}", r.method, r.path)).collect()
	}

	/// Number of requests matching `method` and exact `path`.
	pub fn count(&self, method: Method, path: &str) -> usize {
		self.sent.lock().iter().filter(|r| r.method == method && r.path == path).count()
	}

	/// Number of requests whose path starts with `prefix`.
	pub fn count_prefix(&self, prefix: &str) -> usize {
		self.sent.lock().iter().filter(|r| r.path.starts_with(prefix)).count()
	}

	pub fn is_empty(&self) -> bool {
		self.sent.lock().is_empty()
	}

	/// Takes all recorded requests, clearing the log.
	pub fn take(&self) -> Vec<ApiRequest> {
		std::mem::take(&mut *self.sent.lock())
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[tokio::test]
	async fn records_requests_and_routes_responses() {
		let (transport, controller) = FakeTransport::new("https://zvm.test", |request| {
			if request.path == "/v1/vpgs" {
				Ok(ApiResponse::json(json!([{ "VpgIdentifier": "vpg-1" }])))
			} else {
				Ok(ApiResponse::new(404, ""))
			}
		});

		let ok = transport.execute(ApiRequest::get("/v1/vpgs")).await.unwrap();
		assert_eq!(ok.status, 200);
		let missing = transport.execute(ApiRequest::post("/v1/unknown")).await.unwrap();
		assert_eq!(missing.status, 404);

		assert_eq!(controller.calls(), vec!["GET /v1/vpgs", "POST /v1/unknown"]);
		assert_eq!(controller.count(Method::Get, "/v1/vpgs"), 1);
		assert_eq!(controller.take().len(), 2);
		assert!(controller.is_empty());
	}
}
