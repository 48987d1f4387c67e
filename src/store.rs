//! Storage contracts and built-in key-value backends for session credentials.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value backend holding the session's credential entries.
///
/// The contract mirrors a browser-local store: string values under a fixed set of keys,
/// read before every request and written only by sign-in and refresh.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, if present.
	fn get(&self, key: SessionKey) -> StoreFuture<'_, Option<String>>;

	/// Persists or replaces the value stored under `key`.
	fn set(&self, key: SessionKey, value: String) -> StoreFuture<'_, ()>;

	/// Removes the value stored under `key`, returning the previous value.
	fn remove(&self, key: SessionKey) -> StoreFuture<'_, Option<String>>;
}

/// Fixed entry names used by the session.
#[derive(
	Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SessionKey {
	/// Bearer credential entry (`access_token`).
	AccessToken,
	/// Refresh credential entry (`refresh_token`).
	RefreshToken,
}
impl SessionKey {
	/// Every key, in a stable order.
	pub const ALL: [SessionKey; 2] = [SessionKey::AccessToken, SessionKey::RefreshToken];

	/// Returns the stable entry name.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionKey::AccessToken => "access_token",
			SessionKey::RefreshToken => "refresh_token",
		}
	}
}
impl Display for SessionKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error type produced by [`SessionStore`] implementations.
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

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("disk full"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn session_keys_use_fixed_entry_names() {
		assert_eq!(SessionKey::AccessToken.as_str(), "access_token");
		assert_eq!(SessionKey::RefreshToken.to_string(), "refresh_token");

		let payload = serde_json::to_string(&SessionKey::RefreshToken)
			.expect("SessionKey should serialize to JSON.");

		assert_eq!(payload, "\"refresh_token\"");
	}
}
