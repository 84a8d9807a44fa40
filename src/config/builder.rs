// self
use crate::{_prelude::*, config::ClientConfig};

/// Errors raised while constructing or validating client configuration.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Required environment variable is absent or blank.
	#[error("Environment variable `{name}` is not set.")]
	MissingVariable {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{name}` has an invalid value: {value}.")]
	InvalidVariable {
		/// Variable name.
		name: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
	/// Base URL cannot serve as a request prefix.
	#[error("Base URL is invalid: {reason}.")]
	InvalidBaseUrl {
		/// Why the URL was rejected.
		reason: String,
	},
	/// Endpoint paths must be absolute.
	#[error("The {endpoint} path must start with `/`: {path}.")]
	RelativePath {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending path.
		path: String,
	},
	/// The expiry sentinel cannot be empty.
	#[error("Expiry sentinel must not be empty.")]
	EmptySentinel,
	/// Timeouts must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Base URL for every request.
	pub base_url: Url,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Login endpoint path.
	pub login_path: String,
	/// Current-user endpoint path.
	pub current_user_path: String,
	/// Expiry sentinel message.
	pub expiry_sentinel: String,
	/// Login entry point for session-expired listeners.
	pub login_entry_path: String,
	/// Optional request timeout.
	pub timeout: Option<Duration>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with the defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: ClientConfig::DEFAULT_REFRESH_PATH.into(),
			login_path: ClientConfig::DEFAULT_LOGIN_PATH.into(),
			current_user_path: ClientConfig::DEFAULT_CURRENT_USER_PATH.into(),
			expiry_sentinel: ClientConfig::DEFAULT_EXPIRY_SENTINEL.into(),
			login_entry_path: ClientConfig::DEFAULT_LOGIN_ENTRY_PATH.into(),
			timeout: Some(ClientConfig::DEFAULT_TIMEOUT),
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the current-user endpoint path.
	pub fn current_user_path(mut self, path: impl Into<String>) -> Self {
		self.current_user_path = path.into();

		self
	}

	/// Overrides the expiry sentinel message.
	pub fn expiry_sentinel(mut self, sentinel: impl Into<String>) -> Self {
		self.expiry_sentinel = sentinel.into();

		self
	}

	/// Overrides the login entry point announced on session expiry.
	pub fn login_entry_path(mut self, path: impl Into<String>) -> Self {
		self.login_entry_path = path.into();

		self
	}

	/// Sets the per-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Disables the per-request timeout.
	pub fn without_timeout(mut self) -> Self {
		self.timeout = None;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let config = ClientConfig {
			base_url: self.base_url,
			refresh_path: self.refresh_path,
			login_path: self.login_path,
			current_user_path: self.current_user_path,
			expiry_sentinel: self.expiry_sentinel,
			login_entry_path: self.login_entry_path,
			timeout: self.timeout,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	fn validate(&self) -> Result<(), ClientConfigError> {
		validate_base_url(&self.base_url)?;
		validate_path("refresh", &self.refresh_path)?;
		validate_path("login", &self.login_path)?;
		validate_path("current_user", &self.current_user_path)?;
		validate_path("login_entry", &self.login_entry_path)?;

		if self.expiry_sentinel.is_empty() {
			return Err(ClientConfigError::EmptySentinel);
		}
		if self.timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(ClientConfigError::NonPositiveTimeout);
		}

		Ok(())
	}
}

fn validate_base_url(url: &Url) -> Result<(), ClientConfigError> {
	if !matches!(url.scheme(), "http" | "https") {
		return Err(ClientConfigError::InvalidBaseUrl {
			reason: format!("unsupported scheme `{}`", url.scheme()),
		});
	}
	if url.cannot_be_a_base() {
		return Err(ClientConfigError::InvalidBaseUrl { reason: "URL cannot be a base".into() });
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(ClientConfigError::InvalidBaseUrl {
			reason: "query strings and fragments are not allowed".into(),
		});
	}

	Ok(())
}

fn validate_path(name: &'static str, path: &str) -> Result<(), ClientConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(ClientConfigError::RelativePath { endpoint: name, path: path.to_owned() })
	}
}
