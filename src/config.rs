//! Gateway configuration: which API origin to call and where to send the user on session loss.

/// Builder API for assembling gateway configs.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Endpoint that exchanges a refresh credential for a new pair.
pub const REFRESH_ENDPOINT: &str = "/api/auth/refresh";
/// API origin used when the page itself is served from a local development host.
pub const DEFAULT_DEV_API_ORIGIN: &str = "http://localhost:3000";
/// Login entry point, resolved against the current page.
pub const DEFAULT_LOGIN_PAGE: &str = "login.html";

/// Immutable configuration consumed by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Origin every endpoint path is appended to.
	pub api_origin: Url,
	/// Navigation target used when the session cannot be recovered.
	pub login_url: Url,
}
impl GatewayConfig {
	/// Creates a new builder for a client running on `page_url`.
	pub fn builder(page_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(page_url)
	}

	/// Composes the absolute URL of `endpoint` (which must start with `/`) on the API origin.
	pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ConfigError> {
		if !endpoint.starts_with('/') || endpoint.starts_with("//") {
			return Err(ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned() });
		}

		let base = self.api_origin.as_str().trim_end_matches('/');

		Url::parse(&format!("{base}{endpoint}"))
			.map_err(|source| ConfigError::InvalidUrl { endpoint: endpoint.to_owned(), source })
	}
}
