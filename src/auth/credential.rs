//! Access/refresh credential pairs and the outcome of a refresh exchange.

// self
use crate::{_prelude::*, auth::{JwtClaims, TokenSecret}};

/// Access token plus the optional refresh token issued alongside it.
///
/// Stores persist both halves together; a credential is never partially written.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
	/// Short-lived bearer credential attached to every authenticated request.
	pub access_token: TokenSecret,
	/// Longer-lived credential, present only when the backend does not rely on cookies.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
}
impl Credential {
	/// Creates a credential holding only an access token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None }
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}

	/// Returns the access token's `exp` claim when it is a decodable JWT.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		JwtClaims::decode(self.access_token.expose()).ok()?.expires_at()
	}

	/// Returns `true` only when the access token carries an `exp` claim at or before `instant`.
	///
	/// Opaque tokens are never considered expired locally; the backend remains the authority.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|exp| instant >= exp)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token_set", &self.refresh_token.is_some())
			.finish()
	}
}

/// Outcome of a single call to the refresh endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshResult {
	/// Endpoint returned a fresh credential.
	Success(Credential),
	/// Refresh did not produce a usable credential.
	Failure(RefreshFailure),
}
impl RefreshResult {
	/// Returns `true` for [`RefreshResult::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}
}

/// Reasons a refresh exchange failed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshFailure {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint returned HTTP {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Backend message, or the canonical reason phrase when absent.
		message: String,
	},
	/// No response was received.
	#[error("Refresh request failed: {message}.")]
	Transport {
		/// Rendered transport error.
		message: String,
	},
	/// Refresh request exceeded the configured timeout.
	#[error("Refresh request timed out.")]
	Timeout,
	/// Success response carried no access token.
	#[error("Refresh response did not include an access token.")]
	MissingToken,
	/// Stored credentials could not be read or written around the refresh.
	#[error("Credential store failed during refresh: {message}.")]
	Storage {
		/// Rendered store error.
		message: String,
	},
}
