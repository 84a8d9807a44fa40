//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{self, CredentialStore, Entries, StoreFuture},
};

/// Thread-safe storage backend that keeps credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Entries>>);
impl MemoryStore {
	/// Creates a store pre-seeded with `credential`.
	pub fn with_credential(credential: Credential) -> Self {
		let memory = Self::default();

		store::write_entries(&mut memory.0.write(), credential);

		memory
	}

	/// Returns the raw value stored under `key`.
	pub fn raw(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	/// Returns the current credential without going through the async contract.
	pub fn snapshot(&self) -> Option<Credential> {
		store::credential_from_entries(&self.0.read())
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self) -> StoreFuture<'_, Option<Credential>> {
		let entries = self.0.clone();

		Box::pin(async move { Ok(store::credential_from_entries(&entries.read())) })
	}

	fn set(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let entries = self.0.clone();

		Box::pin(async move {
			store::write_entries(&mut entries.write(), credential);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let entries = self.0.clone();

		Box::pin(async move {
			store::clear_entries(&mut entries.write());

			Ok(())
		})
	}
}
