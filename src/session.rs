//! Authenticated request client with a guarded, one-shot token refresh.
//!
//! [`SessionClient::send`] reads the stored access token, attaches it as a bearer header, and
//! issues the call. When the backend answers `401` with the configured expiry sentinel on an
//! original attempt, the client refreshes the credential once (sharing a single in-flight refresh
//! between concurrent callers), persists it, and re-issues the request exactly once. An
//! unrecoverable session clears the store and notifies every registered listener.

pub mod account;
pub mod events;
pub mod refresh;
pub mod state;

pub use account::*;
pub use events::*;
pub use refresh::*;
pub use state::*;

// crates.io
use ::http::StatusCode;
// self
use crate::{
	_prelude::*,
	auth::{Credential, RefreshResult, TokenSecret},
	config::ClientConfig,
	error::ConfigError,
	http::{ApiRequest, ApiResponse, HttpTransport, TransportRequest},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Session client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestTransport>;

/// Sends authenticated requests against a single admin API.
///
/// The client owns the transport, the credential store, and the shared refresh guard so every
/// request observes the same session. Cloning is cheap and clones share all of that state.
pub struct SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound call.
	pub transport: Arc<T>,
	/// Store holding the current credential.
	pub store: Arc<dyn CredentialStore>,
	/// Validated client configuration.
	pub config: ClientConfig,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	listeners: Listeners,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			refresh_metrics: Default::default(),
			listeners: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Registers a callback fired whenever the session is terminated.
	pub fn on_session_expired<F>(&self, listener: F)
	where
		F: 'static + Fn(&SessionExpired) + Send + Sync,
	{
		self.listeners.push(Arc::new(listener));
	}

	/// Sends `request`, refreshing and retrying once if the access token has expired.
	///
	/// Non-success responses come back as [`Error::Api`] carrying the untouched response,
	/// transport failures as [`Error::Transport`], and unrecoverable sessions as
	/// [`Error::SessionExpired`].
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Send;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.drive(OutboundRequest::new(request))).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Sends a `GET` request.
	pub async fn get(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.send(ApiRequest::get(path)).await
	}

	/// Sends a `DELETE` request.
	pub async fn delete(&self, path: impl Into<String>) -> Result<ApiResponse> {
		self.send(ApiRequest::delete(path)).await
	}

	/// Sends a `POST` request with a JSON body.
	pub async fn post_json<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::post(path).json(body)?).await
	}

	/// Sends a `PUT` request with a JSON body.
	pub async fn put_json<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::put(path).json(body)?).await
	}

	/// Sends a `PATCH` request with a JSON body.
	pub async fn patch_json<B>(&self, path: impl Into<String>, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(ApiRequest::patch(path).json(body)?).await
	}

	/// Sends `request` and decodes the `data` member of the response envelope.
	pub async fn fetch_data<D>(&self, request: ApiRequest) -> Result<D>
	where
		D: serde::de::DeserializeOwned,
	{
		Ok(self.send(request).await?.data()?)
	}

	async fn drive(&self, mut outbound: OutboundRequest) -> Result<ApiResponse> {
		let stale = self.store.get().await?.map(|credential| credential.access_token);

		outbound.authorize(stale.as_ref())?;

		loop {
			let response = self.dispatch(&outbound.request).await?;

			if !self.signals_expiry(&response) {
				return self.complete(&outbound, response);
			}

			outbound = match outbound.into_retry() {
				Ok(mut retry) => {
					let credential = match self.recover(stale.as_ref()).await {
						Ok(credential) => credential,
						Err(e) => {
							self.record_state(&retry, response.status, RequestState::RetriedFailed);

							return Err(e);
						},
					};

					retry.authorize(Some(&credential.access_token))?;

					retry
				},
				Err(exhausted) => {
					let status = response.status;
					let error = self
						.terminate(SessionExpiredReason::ExpiredAfterRetry, Some(response))
						.await;

					self.record_state(&exhausted, status, RequestState::RetriedFailed);

					return Err(error);
				},
			};
		}
	}

	fn complete(
		&self,
		outbound: &OutboundRequest,
		response: ApiResponse,
	) -> Result<ApiResponse, Error> {
		self.record_state(outbound, response.status, outbound.completed_state());

		if response.is_success() { Ok(response) } else { Err(Error::api(response)) }
	}

	fn record_state(&self, outbound: &OutboundRequest, status: StatusCode, state: RequestState) {
		obs::record_request_state(
			&outbound.request.method,
			&outbound.request.path,
			status.as_u16(),
			state,
		);
	}

	/// Returns `true` for the exact expired-token signal: 401 plus the configured sentinel.
	fn signals_expiry(&self, response: &ApiResponse) -> bool {
		response.status == StatusCode::UNAUTHORIZED
			&& response.message().is_some_and(|message| message == self.config.expiry_sentinel)
	}

	async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let transport_request = self.resolve(request)?;

		Ok(self.transport.execute(transport_request).await?)
	}

	fn resolve(&self, request: &ApiRequest) -> Result<TransportRequest, ConfigError> {
		Ok(TransportRequest {
			method: request.method.clone(),
			url: self.config.endpoint(&request.path)?,
			headers: request.headers.clone(),
			body: request.body.clone(),
			timeout: self.config.std_timeout(),
		})
	}

	/// Clears stored credentials, notifies listeners, and builds the caller-facing error.
	///
	/// Listeners are notified even when clearing fails; the storage error rides along on the
	/// signal.
	async fn terminate(
		&self,
		reason: SessionExpiredReason,
		response: Option<ApiResponse>,
	) -> Error {
		let cleanup = self.store.clear().await.err();
		let mut expired = SessionExpired::new(reason, self.config.login_entry_path.as_str());

		if let Some(response) = response {
			expired = expired.with_response(response);
		}
		if let Some(e) = cleanup {
			expired = expired.with_cleanup_error(e);
		}

		obs::record_session_expired(&expired.reason);
		self.listeners.notify(&expired);

		expired.into()
	}

	/// Obtains a usable credential after `stale` was rejected as expired.
	///
	/// Callers queue on the shared refresh guard. A caller that finds a different token in the
	/// store reuses it instead of refreshing again; one that finds the store emptied while it
	/// waited fails without another refresh.
	async fn recover(&self, stale: Option<&TokenSecret>) -> Result<Credential> {
		let _singleflight = self.refresh_guard.lock().await;
		let current = self.store.get().await?;

		match (&current, stale) {
			(Some(current), stale) if Some(&current.access_token) != stale => {
				self.refresh_metrics.record_coalesced();

				return Ok(current.clone());
			},
			(None, Some(_)) => {
				return Err(SessionExpired::new(
					SessionExpiredReason::ClearedElsewhere,
					self.config.login_entry_path.as_str(),
				)
				.into());
			},
			_ => {},
		}

		self.refresh_metrics.record_attempt();

		match self.refresh().await {
			RefreshResult::Success(mut credential) => {
				if credential.refresh_token.is_none() {
					credential.refresh_token = current.and_then(|previous| previous.refresh_token);
				}

				self.store.set(credential.clone()).await.inspect_err(|_| {
					self.refresh_metrics.record_failure();
				})?;
				self.refresh_metrics.record_success();

				Ok(credential)
			},
			RefreshResult::Failure(failure) => {
				self.refresh_metrics.record_failure();

				Err(self.terminate(SessionExpiredReason::RefreshFailed(failure), None).await)
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestTransport> {
	/// Creates a client backed by a cookie-keeping reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
		Ok(Self::with_transport(config, store, ReqwestTransport::new()?))
	}
}
impl<T> Clone for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			listeners: self.listeners.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<T> Debug for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("listeners", &self.listeners)
			.finish()
	}
}

/// Token payload shared by the login and refresh endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload {
	access_token: Option<String>,
	refresh_token: Option<String>,
}
impl TokenPayload {
	fn into_credential(self) -> Option<Credential> {
		let access = self.access_token.filter(|token| !token.is_empty())?;
		let credential = Credential::new(access);

		Some(match self.refresh_token.filter(|token| !token.is_empty()) {
			Some(refresh) => credential.with_refresh_token(refresh),
			None => credential,
		})
	}
}
