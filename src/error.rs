//! Client-level error types shared across the session, transport, and store layers.

// self
use crate::{_prelude::*, http::ApiResponse, session::SessionExpired};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded into the requested shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Backend answered with a non-success status; the response is passed through untouched.
	#[error("Request failed with HTTP status {}.", .response.status)]
	Api {
		/// Response exactly as the backend returned it.
		response: Box<ApiResponse>,
	},
	/// Session could not be recovered; stored credentials have been cleared.
	#[error(transparent)]
	SessionExpired(SessionExpired),
	/// Login endpoint refused the supplied credentials.
	#[error("Login rejected: {message}.")]
	LoginRejected {
		/// HTTP status code returned by the login endpoint.
		status: u16,
		/// Backend- or client-supplied message.
		message: String,
	},
}
impl Error {
	/// Returns the HTTP status attached to the failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { response } => Some(response.status.as_u16()),
			Self::SessionExpired(expired) => expired.response.as_ref().map(|r| r.status.as_u16()),
			Self::LoginRejected { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` when the failure terminated the session.
	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::SessionExpired(_))
	}

	pub(crate) fn api(response: ApiResponse) -> Self {
		Self::Api { response: Box::new(response) }
	}
}
impl From<SessionExpired> for Error {
	fn from(e: SessionExpired) -> Self {
		Self::SessionExpired(e)
	}
}

/// Configuration and request-construction failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client configuration failed validation.
	#[error(transparent)]
	InvalidConfig(#[from] crate::config::ClientConfigError),
	/// Relative request path cannot be joined onto the base URL.
	#[error("Request path `{path}` cannot be joined onto the base URL.")]
	InvalidPath {
		/// Offending request path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path would resolve outside the configured base URL.
	#[error("Request path `{path}` escapes the configured base URL.")]
	ForeignPath {
		/// Offending request path.
		path: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[source] serde_json::Error),
	/// Bearer token contains bytes that are not valid in an HTTP header.
	#[error("Access token cannot be used as an HTTP header value.")]
	InvalidBearer,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not valid JSON for the requested type.
	#[error("Response body is not valid JSON for the requested type.")]
	Json {
		/// Structured parsing failure including the failing path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
	/// Response envelope carried no `data` member.
	#[error("Response envelope is missing its data payload.")]
	MissingData {
		/// HTTP status code of the decoded response.
		status: u16,
	},
}

/// Transport-level failures: the request produced no HTTP response.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL of the failed call.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The configured request timeout elapsed before a response arrived.
	#[error("Request to {url} timed out.")]
	Timeout {
		/// Target URL of the failed call.
		url: String,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: url.to_string(), source: Box::new(src) }
	}

	/// Builds a timeout failure for the provided URL.
	pub fn timeout(url: &Url) -> Self {
		Self::Timeout { url: url.to_string() }
	}

	/// Returns `true` for timeout failures.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use ::http::StatusCode;
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("disk unavailable"));

		let source = StdError::source(&error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn api_error_reports_status() {
		let error = Error::api(ApiResponse::new(StatusCode::NOT_FOUND, b"{}".to_vec()));

		assert_eq!(error.status(), Some(404));
		assert_eq!(error.to_string(), "Request failed with HTTP status 404 Not Found.");
		assert!(!error.is_session_expired());
	}
}
