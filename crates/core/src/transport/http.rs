//! reqwest-backed transport with a pooled client per run.

use std::time::Duration;

use tracing::{debug, trace};
use url::Url;
use zvm_protocol::{CONTENT_TYPE, SESSION_HEADER};

use super::{ApiRequest, ApiResponse, Method, RequestAuth, Transport, TransportFuture};
use crate::error::TransportError;

/// Connection settings for the replication manager endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URI, e.g. `https://zvm.example:9669`.
	pub endpoint: String,
	/// Skip server certificate validation. Management appliances usually
	/// present self-signed certificates, so this defaults to `true`.
	pub accept_invalid_certs: bool,
	/// Per-request timeout; `None` leaves requests unbounded.
	pub request_timeout: Option<Duration>,
}

impl ClientConfig {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			accept_invalid_certs: true,
			request_timeout: None,
		}
	}

	pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
		self.accept_invalid_certs = accept;
		self
	}

	pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.request_timeout = timeout;
		self
	}
}

/// Transport that sends requests over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
	endpoint: String,
	base: Url,
	client: reqwest::Client,
}

impl HttpTransport {
	pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
		let base = parse_base(&config.endpoint)?;

		let mut builder = reqwest::Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);
		if let Some(timeout) = config.request_timeout {
			builder = builder.timeout(timeout);
		}
		let client = builder.build().map_err(|e| TransportError::Client(e.to_string()))?;

		debug!(
			target = "zvm.transport",
			endpoint = %config.endpoint,
			accept_invalid_certs = config.accept_invalid_certs,
			timeout = ?config.request_timeout,
			"http transport ready"
		);

		Ok(Self {
			endpoint: config.endpoint.clone(),
			base,
			client,
		})
	}

	fn url_for(&self, path: &str) -> Result<Url, TransportError> {
		self.base.join(path.trim_start_matches('/')).map_err(|e| TransportError::Request {
			path: path.to_string(),
			reason: e.to_string(),
		})
	}

	async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
		let url = self.url_for(&request.path)?;
		trace!(target = "zvm.transport", method = %request.method, %url, "sending request");

		let mut builder = match request.method {
			Method::Get => self.client.get(url),
			Method::Post => self.client.post(url),
		};

		if !request.query.is_empty() {
			builder = builder.query(request.query.pairs());
		}

		builder = match &request.auth {
			RequestAuth::None => builder,
			RequestAuth::Basic { username, password } => builder.basic_auth(username, Some(password)),
			RequestAuth::Session(token) => builder.header(SESSION_HEADER, token),
		};

		builder = builder.header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE);
		builder = match &request.body {
			Some(body) => builder.body(body.to_string()),
			None if request.method == Method::Post => builder.body(String::new()),
			None => builder,
		};

		let response = builder.send().await.map_err(|e| request_error(&request.path, e))?;
		let status = response.status().as_u16();
		let session_token = response
			.headers()
			.get(SESSION_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(str::to_string);
		let body = response.text().await.map_err(|e| request_error(&request.path, e))?;

		trace!(target = "zvm.transport", path = %request.path, status, bytes = body.len(), "received response");

		Ok(ApiResponse { status, session_token, body })
	}
}

impl Transport for HttpTransport {
	fn endpoint(&self) -> &str {
		&self.endpoint
	}

	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(self.send(request))
	}
}

fn parse_base(endpoint: &str) -> Result<Url, TransportError> {
	let invalid = |reason: String| TransportError::InvalidEndpoint {
		endpoint: endpoint.to_string(),
		reason,
	};

	let mut base = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
	if !matches!(base.scheme(), "http" | "https") {
		return Err(invalid(format!("unsupported scheme {}", base.scheme())));
	}
	// Request paths are joined relative to the base, so it must end in '/'.
	if !base.path().ends_with('/') {
		let path = format!("{}/", base.path());
		base.set_path(&path);
	}
	Ok(base)
}

fn request_error(path: &str, err: reqwest::Error) -> TransportError {
	if err.is_timeout() {
		TransportError::Timeout { path: path.to_string() }
	} else {
		TransportError::Request {
			path: path.to_string(),
			reason: err.to_string(),
		}
	}
}
