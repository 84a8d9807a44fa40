//! Request/response model and the transport seam the session client drives.
//!
//! [`ApiRequest`] describes a call relative to the configured base URL, [`ApiResponse`] carries
//! whatever the backend answered, and [`HttpTransport`] is the client's only dependency on an
//! HTTP stack. Transports resolve with `Ok` for every HTTP response regardless of status and
//! reserve `Err` for calls that produced no response at all (DNS, TCP, TLS, timeouts), which keeps
//! network failures out of the token-refresh path.

// crates.io
use ::http::{
	HeaderMap, HeaderValue, Method, StatusCode,
	header::{CONTENT_TYPE, HeaderName},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError, TransportError},
};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing fully resolved requests.
///
/// Implementations must include cookies previously set by the backend on every call (the refresh
/// token travels as a cookie in cookie-based deployments) and honor
/// [`TransportRequest::timeout`], reporting an elapsed timeout as [`TransportError::Timeout`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Issues `request` and resolves with the backend's response.
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Outbound call described relative to the client's base URL.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path (plus optional query) relative to the base URL.
	pub path: String,
	/// Caller-supplied headers; `Authorization` is managed by the session client.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request with the provided method and path.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), headers: HeaderMap::new(), body: None }
	}

	/// Creates a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Creates a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Creates a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Creates a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Creates a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Sets or replaces a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a raw body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON body and sets the content type.
	pub fn json<T>(mut self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(payload).map_err(ConfigError::RequestBody)?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(body);

		Ok(self)
	}
}

/// Fully resolved request handed to an [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Headers including any bearer token.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
	/// Deadline for receiving the complete response.
	pub timeout: Option<std::time::Duration>,
}

/// Response returned by the backend, whatever its status.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response without headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Decodes the body as JSON.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError::Json { source, status: self.status.as_u16() })
	}

	/// Returns the top-level `message` string of a JSON body, if any.
	pub fn message(&self) -> Option<String> {
		#[derive(Deserialize)]
		struct MessageOnly {
			message: Option<String>,
		}

		serde_json::from_slice::<MessageOnly>(&self.body).ok()?.message
	}

	/// Decodes the backend's `{ success, message, data }` envelope.
	pub fn envelope<T>(&self) -> Result<ApiEnvelope<T>, DecodeError>
	where
		T: DeserializeOwned,
	{
		self.json()
	}

	/// Decodes the envelope and returns its `data` member.
	pub fn data<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		self.envelope::<T>()?
			.data
			.ok_or(DecodeError::MissingData { status: self.status.as_u16() })
	}

	/// Returns the body as lossy UTF-8 text.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
impl Debug for ApiResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiResponse")
			.field("status", &self.status)
			.field("body_len", &self.body.len())
			.finish()
	}
}

/// Standard response envelope used by the admin API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ApiEnvelope<T> {
	/// Backend success flag, when reported.
	pub success: Option<bool>,
	/// Human-readable message.
	pub message: Option<String>,
	/// Payload.
	pub data: Option<T>,
}

/// Reqwest-backed [`HttpTransport`] with a cookie store, so refresh cookies set by the backend
/// accompany later calls the way a browser's `withCredentials` requests do.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport whose client keeps cookies between calls.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().cookie_store(true).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// Enable `cookie_store` on the client when the backend delivers refresh tokens as cookies.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let TransportRequest { method, url, headers, body, timeout } = request;
			let mut builder = client.request(method, url.clone()).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await.map_err(|e| map_reqwest_error(&url, e))?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(|e| map_reqwest_error(&url, e))?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(url: &Url, e: ReqwestError) -> TransportError {
	if e.is_timeout() { TransportError::timeout(url) } else { TransportError::network(url, e) }
}
