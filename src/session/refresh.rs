//! Refresh-endpoint exchange.
//!
//! [`SessionClient::refresh`] performs exactly one `POST` to the configured refresh path with no
//! `Authorization` header. Cookie-based deployments carry the refresh token in the transport's
//! cookie jar; when the store also holds a refresh token it is sent as `{"refreshToken": ...}`.
//! The exchange never touches the store: persisting or clearing is the caller's decision.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use ::http::{HeaderMap, HeaderValue, Method, header::CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	auth::{RefreshFailure, RefreshResult, TokenSecret},
	http::{ApiResponse, HttpTransport, TransportRequest},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{SessionClient, TokenPayload},
};

#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
	#[serde(default)]
	data: Option<TokenPayload>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	refresh_token: Option<&'a str>,
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Calls the refresh endpoint once and reports the outcome without mutating the store.
	pub async fn refresh(&self) -> RefreshResult {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.exchange_refresh()).await;

		match &result {
			RefreshResult::Success(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			RefreshResult::Failure(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn exchange_refresh(&self) -> RefreshResult {
		let url = match self.config.endpoint(&self.config.refresh_path) {
			Ok(url) => url,
			Err(e) =>
				return RefreshResult::Failure(RefreshFailure::Transport { message: e.to_string() }),
		};
		let stored_refresh = match self.store.get().await {
			Ok(credential) => credential.and_then(|credential| credential.refresh_token),
			Err(e) =>
				return RefreshResult::Failure(RefreshFailure::Storage { message: e.to_string() }),
		};
		let timeout = self.config.std_timeout();
		let request = match build_refresh_request(url, stored_refresh.as_ref(), timeout) {
			Ok(request) => request,
			Err(failure) => return RefreshResult::Failure(failure),
		};
		let response = match self.transport.execute(request).await {
			Ok(response) => response,
			Err(e) if e.is_timeout() => return RefreshResult::Failure(RefreshFailure::Timeout),
			Err(e) =>
				return RefreshResult::Failure(RefreshFailure::Transport { message: e.to_string() }),
		};

		interpret_refresh_response(&response)
	}
}

fn build_refresh_request(
	url: Url,
	stored_refresh: Option<&TokenSecret>,
	timeout: Option<std::time::Duration>,
) -> Result<TransportRequest, RefreshFailure> {
	let payload = RefreshBody { refresh_token: stored_refresh.map(TokenSecret::expose) };
	let body = serde_json::to_vec(&payload)
		.map_err(|e| RefreshFailure::Transport { message: e.to_string() })?;
	let mut headers = HeaderMap::new();

	headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

	Ok(TransportRequest { method: Method::POST, url, headers, body: Some(body), timeout })
}

fn interpret_refresh_response(response: &ApiResponse) -> RefreshResult {
	if !response.is_success() {
		let message = response.message().unwrap_or_else(|| {
			response.status.canonical_reason().unwrap_or("unknown status").to_owned()
		});

		return RefreshResult::Failure(RefreshFailure::Status {
			status: response.status.as_u16(),
			message,
		});
	}

	match serde_json::from_slice::<RefreshEnvelope>(&response.body)
		.ok()
		.and_then(|envelope| envelope.data)
		.and_then(TokenPayload::into_credential)
	{
		Some(credential) => RefreshResult::Success(credential),
		None => RefreshResult::Failure(RefreshFailure::MissingToken),
	}
}
