//! Credential persistence contracts and built-in store implementations.
//!
//! Stores expose the process-wide session state as two string keys, [`ACCESS_TOKEN_KEY`] and
//! [`REFRESH_TOKEN_KEY`]. Both keys are written together on [`CredentialStore::set`] and
//! removed together on [`CredentialStore::clear`], so readers never observe a mixed old/new pair.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Key under which the access token is persisted.
pub const ACCESS_TOKEN_KEY: &str = "authToken";
/// Key under which the optional refresh token is persisted.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by credential stores.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the current credential, if any.
	fn get(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Replaces the stored credential with `credential` in one step.
	fn set(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Removes the access and refresh tokens together.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Key-value snapshot shared by the built-in stores.
pub(crate) type Entries = HashMap<String, String>;

/// Decodes a credential from its key-value layout.
pub(crate) fn credential_from_entries(entries: &Entries) -> Option<Credential> {
	let access = entries.get(ACCESS_TOKEN_KEY)?;
	let credential = Credential::new(access.as_str());

	Some(match entries.get(REFRESH_TOKEN_KEY) {
		Some(refresh) => credential.with_refresh_token(refresh.as_str()),
		None => credential,
	})
}

/// Writes `credential` into `entries`, dropping any refresh token it does not carry.
pub(crate) fn write_entries(entries: &mut Entries, credential: Credential) {
	entries.insert(ACCESS_TOKEN_KEY.into(), credential.access_token.expose().to_owned());

	match credential.refresh_token {
		Some(refresh) => {
			entries.insert(REFRESH_TOKEN_KEY.into(), refresh.expose().to_owned());
		},
		None => {
			entries.remove(REFRESH_TOKEN_KEY);
		},
	}
}

/// Removes both credential keys from `entries`.
pub(crate) fn clear_entries(entries: &mut Entries) {
	entries.remove(ACCESS_TOKEN_KEY);
	entries.remove(REFRESH_TOKEN_KEY);
}
