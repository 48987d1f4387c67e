//! Access/refresh credential pair as stored by the session and issued by the API.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Snapshot of the two stored credentials; either side may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
	/// Short-lived bearer credential.
	pub access_token: Option<TokenSecret>,
	/// Longer-lived credential exchanged for a new pair.
	pub refresh_token: Option<TokenSecret>,
}
impl Credentials {
	/// Returns `true` when an access credential is present.
	pub fn is_authenticated(&self) -> bool {
		self.access_token.is_some()
	}
}

/// Fresh credential pair issued by the refresh endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Newly issued bearer credential.
	pub access_token: TokenSecret,
	/// Newly issued refresh credential.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Builds a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}
}
impl From<TokenPair> for Credentials {
	fn from(pair: TokenPair) -> Self {
		Self { access_token: Some(pair.access_token), refresh_token: Some(pair.refresh_token) }
	}
}
