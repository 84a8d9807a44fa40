//! Minimal JWT payload inspection used for local session checks.
//!
//! Signatures are not verified: the backend owns token validity and the client only reads the
//! `exp` claim to decide whether a stored session still looks usable.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
// self
use crate::_prelude::*;

/// Errors raised while decoding a JWT payload.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum JwtDecodeError {
	/// Token does not have the `header.payload.signature` shape.
	#[error("Token is not a three-part JWT.")]
	Malformed,
	/// A token segment is not valid base64url.
	#[error("Token segment is not valid base64url.")]
	Encoding,
	/// Header or payload is not JSON with the expected claim types.
	#[error("Token payload is not valid JSON: {message}.")]
	Payload {
		/// Rendered parse failure.
		message: String,
	},
}

/// Registered claims the client cares about.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct JwtClaims {
	/// Expiry as seconds since the Unix epoch.
	#[serde(default)]
	pub exp: Option<i64>,
	/// Issued-at as seconds since the Unix epoch.
	#[serde(default)]
	pub iat: Option<i64>,
	/// Subject identifier.
	#[serde(default)]
	pub sub: Option<String>,
}
impl JwtClaims {
	/// Decodes the claims of `token` without verifying its signature or expiry.
	pub fn decode(token: &str) -> Result<Self, JwtDecodeError> {
		if token.split('.').count() != 3 {
			return Err(JwtDecodeError::Malformed);
		}

		let mut validation = Validation::new(Algorithm::HS256);

		validation.insecure_disable_signature_validation();
		validation.validate_exp = false;
		validation.validate_aud = false;
		validation.required_spec_claims.clear();

		jsonwebtoken::decode::<Self>(token, &DecodingKey::from_secret(&[]), &validation)
			.map(|data| data.claims)
			.map_err(|e| match e.kind() {
				ErrorKind::InvalidToken => JwtDecodeError::Malformed,
				ErrorKind::Base64(_) => JwtDecodeError::Encoding,
				_ => JwtDecodeError::Payload { message: e.to_string() },
			})
	}

	/// Converts the `exp` claim into an instant.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp?).ok()
	}
}
