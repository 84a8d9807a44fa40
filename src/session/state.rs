//! Per-request retry state carried alongside an outbound call.

// crates.io
use ::http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError, http::ApiRequest};

/// Which attempt of a logical call a request represents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Attempt {
	/// First attempt, before any refresh.
	#[default]
	Original,
	/// The single retry issued after a refresh; never retried again.
	Retry,
}

/// Terminal state of a logical call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestState {
	/// The first response was returned as-is.
	NotRetried,
	/// A refresh succeeded and the retried response was returned.
	RetriedOk,
	/// The session could not be recovered.
	RetriedFailed,
}
impl RequestState {
	/// Returns a stable label suitable for span or log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestState::NotRetried => "not_retried",
			RequestState::RetriedOk => "retried_ok",
			RequestState::RetriedFailed => "retried_failed",
		}
	}
}
impl Display for RequestState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// An [`ApiRequest`] paired with its attempt marker.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
	/// Request as it will be sent, including the managed `Authorization` header.
	pub request: ApiRequest,
	attempt: Attempt,
}
impl OutboundRequest {
	/// Wraps an original request.
	pub fn new(request: ApiRequest) -> Self {
		Self { request, attempt: Attempt::Original }
	}

	/// Returns the attempt marker.
	pub fn attempt(&self) -> Attempt {
		self.attempt
	}

	/// Returns `true` once the request has been turned into its retry.
	pub fn retried(&self) -> bool {
		matches!(self.attempt, Attempt::Retry)
	}

	/// Sets the bearer header from `token`, or strips it when no token is available.
	pub fn authorize(&mut self, token: Option<&TokenSecret>) -> Result<(), ConfigError> {
		match token {
			Some(token) => {
				let mut value =
					HeaderValue::from_str(&token.bearer()).map_err(|_| ConfigError::InvalidBearer)?;

				value.set_sensitive(true);
				self.request.headers.insert(AUTHORIZATION, value);
			},
			None => {
				self.request.headers.remove(AUTHORIZATION);
			},
		}

		Ok(())
	}

	/// Consumes an original request and yields its retry.
	///
	/// A request that has already been retried is handed back unchanged as `Err`.
	pub fn into_retry(mut self) -> Result<Self, Self> {
		if self.retried() {
			return Err(self);
		}

		self.attempt = Attempt::Retry;

		Ok(self)
	}

	/// Terminal state reached when this request's response is handed back.
	pub fn completed_state(&self) -> RequestState {
		match self.attempt {
			Attempt::Original => RequestState::NotRetried,
			Attempt::Retry => RequestState::RetriedOk,
		}
	}
}
