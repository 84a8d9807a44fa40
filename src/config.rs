//! Client configuration: base URL, endpoint paths, the expiry sentinel, and request timeouts.
//!
//! Values are assembled through [`ClientConfigBuilder`], which validates every field before a
//! [`ClientConfig`] is handed to the session client, or loaded from the environment with
//! [`ClientConfig::from_env`].

/// Builder API for assembling client configurations.
pub mod builder;

pub use builder::*;

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";
/// Environment variable holding the request timeout in whole seconds (`0` disables it).
pub const TIMEOUT_SECS_ENV: &str = "API_TIMEOUT_SECS";

/// Validated configuration consumed by [`SessionClient`](crate::session::SessionClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL every relative request path is joined onto.
	pub base_url: Url,
	/// Path of the token refresh endpoint.
	pub refresh_path: String,
	/// Path of the credential login endpoint.
	pub login_path: String,
	/// Path returning the signed-in administrator.
	pub current_user_path: String,
	/// Exact 401 `message` that marks an expired access token.
	pub expiry_sentinel: String,
	/// UI entry point announced to session-expired listeners.
	pub login_entry_path: String,
	/// Per-request timeout; `None` waits indefinitely.
	pub timeout: Option<Duration>,
}
impl ClientConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "/admin/refresh";
	/// Default login endpoint path.
	pub const DEFAULT_LOGIN_PATH: &'static str = "/admin/login";
	/// Default current-user endpoint path.
	pub const DEFAULT_CURRENT_USER_PATH: &'static str = "/admin/me";
	/// Default expiry sentinel.
	pub const DEFAULT_EXPIRY_SENTINEL: &'static str = "jwt expired";
	/// Default login entry point.
	pub const DEFAULT_LOGIN_ENTRY_PATH: &'static str = "/login";
	/// Default request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Loads configuration from [`BASE_URL_ENV`] and [`TIMEOUT_SECS_ENV`].
	pub fn from_env() -> Result<Self, ClientConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Loads configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let raw = lookup(BASE_URL_ENV)
			.filter(|value| !value.trim().is_empty())
			.ok_or(ClientConfigError::MissingVariable { name: BASE_URL_ENV })?;
		let base_url = Url::parse(raw.trim())
			.map_err(|e| ClientConfigError::InvalidBaseUrl { reason: e.to_string() })?;
		let mut builder = Self::builder(base_url);

		if let Some(raw) = lookup(TIMEOUT_SECS_ENV) {
			let secs = raw.trim().parse::<u32>().map_err(|_| ClientConfigError::InvalidVariable {
				name: TIMEOUT_SECS_ENV,
				value: raw.clone(),
			})?;

			builder = if secs == 0 {
				builder.without_timeout()
			} else {
				builder.timeout(Duration::seconds(i64::from(secs)))
			};
		}

		builder.build()
	}

	/// Joins a relative request path onto the base URL, keeping any base path prefix.
	///
	/// Absolute URLs, scheme-relative paths, and `..` segments are rejected so a bearer token can
	/// only ever travel to the configured origin.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let foreign = || ConfigError::ForeignPath { path: path.to_owned() };
		let route = path.split(['?', '#']).next().unwrap_or_default();

		if Url::parse(path).is_ok()
			|| path.starts_with("//")
			|| route.split(['/', '\\']).any(|segment| segment == "..")
		{
			return Err(foreign());
		}

		let mut base = self.base_url.clone();

		if !base.path().ends_with('/') {
			let prefixed = format!("{}/", base.path());

			base.set_path(&prefixed);
		}

		let url = base
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })?;

		if url.origin() != base.origin() || !url.path().starts_with(base.path()) {
			return Err(foreign());
		}

		Ok(url)
	}

	/// Returns the timeout as a standard duration for transports.
	pub fn std_timeout(&self) -> Option<std::time::Duration> {
		self.timeout.map(|timeout| timeout.unsigned_abs())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test base URL.")
	}

	#[test]
	fn endpoint_preserves_base_path_prefix() {
		let config = ClientConfig::builder(url("https://api.example.com/v1"))
			.build()
			.expect("Config should build.");

		assert_eq!(
			config.endpoint("/admin/me").expect("Path should join.").as_str(),
			"https://api.example.com/v1/admin/me"
		);

		let config = ClientConfig::builder(url("https://api.example.com"))
			.build()
			.expect("Config should build.");

		assert_eq!(
			config.endpoint("/admin/refresh").expect("Path should join.").as_str(),
			"https://api.example.com/admin/refresh"
		);
	}

	#[test]
	fn endpoint_keeps_query_strings() {
		let config = ClientConfig::builder(url("http://localhost:4000/"))
			.build()
			.expect("Config should build.");

		assert_eq!(
			config.endpoint("/admin/api/products?page=2").expect("Path should join.").as_str(),
			"http://localhost:4000/admin/api/products?page=2"
		);
	}

	#[test]
	fn endpoint_never_leaves_the_base_origin() {
		let config = ClientConfig::builder(url("https://api.example.com/v1"))
			.build()
			.expect("Config should build.");

		for path in [
			"https://evil.example/steal",
			"http://api.example.com/v1/admin/me",
			"//evil.example/steal",
			"/admin/../../steal",
			"..",
			"\\\\evil.example/steal",
		] {
			let err = config.endpoint(path).expect_err("Paths outside the base must be rejected.");

			assert!(
				matches!(&err, ConfigError::ForeignPath { path: rejected } if rejected == path),
				"Unexpected error for {path}: {err:?}."
			);
		}

		assert_eq!(
			config.endpoint("admin/me?next=..").expect("Relative path should join.").as_str(),
			"https://api.example.com/v1/admin/me?next=.."
		);
	}

	#[test]
	fn from_lookup_reads_base_url_and_timeout() {
		let config = ClientConfig::from_lookup(|key| match key {
			BASE_URL_ENV => Some("https://api.example.com".into()),
			TIMEOUT_SECS_ENV => Some("5".into()),
			_ => None,
		})
		.expect("Environment config should load.");

		assert_eq!(config.base_url.as_str(), "https://api.example.com/");
		assert_eq!(config.timeout, Some(Duration::seconds(5)));
		assert_eq!(config.refresh_path, ClientConfig::DEFAULT_REFRESH_PATH);
		assert_eq!(config.expiry_sentinel, "jwt expired");

		let config = ClientConfig::from_lookup(|key| match key {
			BASE_URL_ENV => Some("https://api.example.com".into()),
			TIMEOUT_SECS_ENV => Some("0".into()),
			_ => None,
		})
		.expect("Environment config should load.");

		assert_eq!(config.timeout, None);
	}

	#[test]
	fn from_lookup_rejects_missing_or_bad_values() {
		let err = ClientConfig::from_lookup(|_| None).expect_err("Missing base URL should fail.");

		assert_eq!(err, ClientConfigError::MissingVariable { name: BASE_URL_ENV });

		let err = ClientConfig::from_lookup(|key| match key {
			BASE_URL_ENV => Some("https://api.example.com".into()),
			TIMEOUT_SECS_ENV => Some("soon".into()),
			_ => None,
		})
		.expect_err("Non-numeric timeout should fail.");

		assert!(matches!(err, ClientConfigError::InvalidVariable { name: TIMEOUT_SECS_ENV, .. }));

		let err = ClientConfig::from_lookup(|key| match key {
			BASE_URL_ENV => Some("not a url".into()),
			_ => None,
		})
		.expect_err("Unparseable base URL should fail.");

		assert!(matches!(err, ClientConfigError::InvalidBaseUrl { .. }));
	}
}
