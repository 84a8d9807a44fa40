//! Account operations layered on the session: credential login, the signed-in administrator,
//! logout, and a local session check.

// crates.io
use ::http::{HeaderMap, HeaderValue, Method, StatusCode, header::CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::ConfigError,
	http::{ApiRequest, ApiResponse, HttpTransport, TransportRequest},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{SessionClient, SessionExpired, SessionExpiredReason, TokenPayload},
};

const REJECTED_MESSAGE: &str = "Username or password is incorrect";
const FAILED_MESSAGE: &str = "Login failed";

/// Session established by [`SessionClient::login`].
#[derive(Clone, Debug)]
pub struct LoginSession {
	/// Credential now held by the store.
	pub credential: Credential,
	/// Administrator profile returned alongside the token, if any.
	pub user: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
	identifier: &'a str,
	password: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct LoginEnvelope {
	#[serde(default)]
	success: bool,
	message: Option<String>,
	data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
	#[serde(flatten)]
	tokens: TokenPayload,
	user: Option<serde_json::Value>,
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges an identifier/password pair for a credential and persists it.
	///
	/// The login call never carries a bearer header and is never retried.
	pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginSession> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.login_request(identifier, password)?;
				let response = self.transport.execute(request).await?;
				let session = interpret_login_response(&response)?;

				self.store.set(session.credential.clone()).await?;

				Ok(session)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Fetches the signed-in administrator through the authenticated request path.
	pub async fn current_user(&self) -> Result<serde_json::Value> {
		let response = self.send(ApiRequest::get(self.config.current_user_path.as_str())).await?;

		Ok(response.json()?)
	}

	/// Clears stored credentials and notifies session listeners.
	pub async fn logout(&self) -> Result<()> {
		self.store.clear().await?;

		let expired =
			SessionExpired::new(SessionExpiredReason::LoggedOut, self.config.login_entry_path.as_str());

		obs::record_session_expired(&expired.reason);
		self.listeners.notify(&expired);

		Ok(())
	}

	/// Returns `true` while the store holds an access token whose `exp` claim, if any, lies in the
	/// future.
	pub async fn is_authenticated(&self) -> Result<bool> {
		let now = OffsetDateTime::now_utc();

		Ok(self.store.get().await?.is_some_and(|credential| !credential.is_expired_at(now)))
	}

	fn login_request(
		&self,
		identifier: &str,
		password: &str,
	) -> Result<TransportRequest, ConfigError> {
		let body = serde_json::to_vec(&LoginBody { identifier, password })
			.map_err(ConfigError::RequestBody)?;
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(TransportRequest {
			method: Method::POST,
			url: self.config.endpoint(&self.config.login_path)?,
			headers,
			body: Some(body),
			timeout: self.config.std_timeout(),
		})
	}
}

fn interpret_login_response(response: &ApiResponse) -> Result<LoginSession> {
	let envelope = serde_json::from_slice::<LoginEnvelope>(&response.body).unwrap_or_default();

	if response.is_success() && envelope.success {
		if let Some(data) = envelope.data {
			let user = data.user;

			if let Some(credential) = data.tokens.into_credential() {
				return Ok(LoginSession { credential, user });
			}
		}
	}

	let fallback = if response.status == StatusCode::UNAUTHORIZED || !envelope.success {
		REJECTED_MESSAGE
	} else {
		FAILED_MESSAGE
	};

	Err(Error::LoginRejected {
		status: response.status.as_u16(),
		message: envelope.message.unwrap_or_else(|| fallback.to_owned()),
	})
}
