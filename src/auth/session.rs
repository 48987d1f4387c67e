//! Explicit client session wrapping the credential store.

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenPair, TokenSecret},
	store::{MemoryStore, SessionKey, SessionStore, StoreError},
};

/// Handle over the two stored credentials, passed to the gateway by value and shared with
/// whoever else needs to observe or reset the session.
#[derive(Clone)]
pub struct Session {
	store: Arc<dyn SessionStore>,
}
impl Session {
	/// Creates a session backed by `store`.
	pub fn new(store: Arc<dyn SessionStore>) -> Self {
		Self { store }
	}

	/// Creates a session backed by a fresh [`MemoryStore`].
	pub fn in_memory() -> Self {
		Self::new(Arc::new(MemoryStore::default()))
	}

	/// Underlying store handle.
	pub fn store(&self) -> &Arc<dyn SessionStore> {
		&self.store
	}

	/// Returns the stored bearer credential.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		self.secret(SessionKey::AccessToken).await
	}

	/// Returns the stored refresh credential.
	pub async fn refresh_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		self.secret(SessionKey::RefreshToken).await
	}

	/// Reads both credentials.
	pub async fn credentials(&self) -> Result<Credentials, StoreError> {
		Ok(Credentials {
			access_token: self.access_token().await?,
			refresh_token: self.refresh_token().await?,
		})
	}

	/// Returns `true` when a bearer credential is stored.
	pub async fn is_authenticated(&self) -> Result<bool, StoreError> {
		Ok(self.access_token().await?.is_some())
	}

	/// Overwrites both credentials.
	pub async fn store_tokens(&self, pair: &TokenPair) -> Result<(), StoreError> {
		self.store.set(SessionKey::AccessToken, pair.access_token.expose().to_owned()).await?;
		self.store.set(SessionKey::RefreshToken, pair.refresh_token.expose().to_owned()).await
	}

	/// Removes both credentials, returning the session to the unauthenticated state.
	pub async fn clear(&self) -> Result<(), StoreError> {
		for key in SessionKey::ALL {
			self.store.remove(key).await?;
		}

		Ok(())
	}

	async fn secret(&self, key: SessionKey) -> Result<Option<TokenSecret>, StoreError> {
		Ok(self.store.get(key).await?.map(TokenSecret::new))
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Session(..)")
	}
}
