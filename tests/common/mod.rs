#![allow(dead_code)]

// std
use std::{
	collections::{HashMap, VecDeque},
	sync::Arc,
};
// crates.io
use admin_session::{
	auth::Credential,
	config::ClientConfig,
	error::TransportError,
	http::{ApiResponse, HttpTransport, TransportFuture, TransportRequest},
	session::SessionClient,
	store::{CredentialStore, MemoryStore},
	url::Url,
};
#[cfg(feature = "reqwest")] use admin_session::session::ReqwestSessionClient;
use http::StatusCode;
use parking_lot::Mutex;

/// Builds a config whose base URL points at `base_url`.
pub fn config_for(base_url: &str) -> ClientConfig {
	ClientConfig::builder(Url::parse(base_url).expect("Mock server URL should parse."))
		.build()
		.expect("Test config should build.")
}

/// Builds a reqwest-backed client over `config`, seeding `store` with `credential` when provided.
#[cfg(feature = "reqwest")]
pub fn reqwest_client(
	config: ClientConfig,
	credential: Option<Credential>,
) -> (ReqwestSessionClient, MemoryStore) {
	let store = credential.map(MemoryStore::with_credential).unwrap_or_default();
	let shared: Arc<dyn CredentialStore> = Arc::new(store.clone());
	let client =
		SessionClient::new(config, shared).expect("Reqwest transport should build for tests.");

	(client, store)
}

/// Scripted reply for a [`ScriptedTransport`] route.
pub enum Reply {
	Json(u16, &'static str),
	Timeout,
	Network,
}

/// In-process transport that replays scripted replies per URL path and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
	routes: Mutex<HashMap<String, VecDeque<Reply>>>,
	requests: Mutex<Vec<TransportRequest>>,
}
impl ScriptedTransport {
	pub fn reply(&self, path: &str, reply: Reply) -> &Self {
		self.routes.lock().entry(path.to_owned()).or_default().push_back(reply);

		self
	}

	pub fn requests(&self) -> Vec<TransportRequest> {
		self.requests.lock().clone()
	}

	pub fn requests_to(&self, path: &str) -> Vec<TransportRequest> {
		self.requests().into_iter().filter(|request| request.url.path() == path).collect()
	}

	pub fn bearer_of(request: &TransportRequest) -> Option<String> {
		request
			.headers
			.get(http::header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned)
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
		let path = request.url.path().to_owned();
		let url = request.url.clone();

		self.requests.lock().push(request);

		let reply = self.routes.lock().get_mut(&path).and_then(VecDeque::pop_front);

		Box::pin(async move {
			match reply {
				Some(Reply::Json(status, body)) => Ok(ApiResponse::new(
					StatusCode::from_u16(status).expect("Scripted status should be valid."),
					body.as_bytes(),
				)),
				Some(Reply::Timeout) => Err(TransportError::timeout(&url)),
				Some(Reply::Network) => Err(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					"connection refused",
				))),
				None => panic!("No scripted reply left for {path}."),
			}
		})
	}
}

/// Builds a client driven by a [`ScriptedTransport`].
pub fn scripted_client(
	token: Option<Credential>,
) -> (SessionClient<ScriptedTransport>, Arc<ScriptedTransport>, MemoryStore) {
	let store = token.map(MemoryStore::with_credential).unwrap_or_default();
	let (client, transport) = scripted_client_over(Arc::new(store.clone()));

	(client, transport, store)
}

/// Builds a [`ScriptedTransport`] client over an arbitrary store.
pub fn scripted_client_over(
	store: Arc<dyn CredentialStore>,
) -> (SessionClient<ScriptedTransport>, Arc<ScriptedTransport>) {
	let transport = Arc::new(ScriptedTransport::default());
	let client = SessionClient::with_transport(
		config_for("https://api.example.com"),
		store,
		transport.clone(),
	);

	(client, transport)
}
