//! Thread-safe in-memory [`SessionStore`] implementation for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	store::{SessionKey, SessionStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<SessionKey, String>>>;

/// Thread-safe storage backend that keeps credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns a copy of every stored entry, mainly for assertions in tests.
	pub fn snapshot(&self) -> BTreeMap<SessionKey, String> {
		self.0.read().iter().map(|(k, v)| (*k, v.clone())).collect()
	}

	fn set_now(map: StoreMap, key: SessionKey, value: String) -> Result<(), StoreError> {
		map.write().insert(key, value);

		Ok(())
	}
}
impl SessionStore for MemoryStore {
	fn get(&self, key: SessionKey) -> StoreFuture<'_, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn set(&self, key: SessionKey, value: String) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::set_now(map, key, value) })
	}

	fn remove(&self, key: SessionKey) -> StoreFuture<'_, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(&key)) })
	}
}
