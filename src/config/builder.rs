// self
use crate::{
	_prelude::*,
	config::{DEFAULT_DEV_API_ORIGIN, DEFAULT_LOGIN_PAGE, GatewayConfig},
};

/// Errors raised while constructing or validating gateway configs.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum GatewayConfigError {
	/// Page and API origins must be `http` or `https` URLs with a host.
	#[error("The {which} URL must be an http(s) URL with a host: {url}.")]
	UnsupportedUrl {
		/// Which URL failed validation.
		which: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// Login page could not be resolved against the page URL.
	#[error("Login page `{page}` cannot be resolved against the current page.")]
	InvalidLoginPage {
		/// Login page that failed to resolve.
		page: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// URL of the page (or app entry point) the client runs on.
	pub page_url: Url,
	/// Explicit API origin; bypasses the local-development heuristic when set.
	pub api_origin: Option<Url>,
	/// API origin used when the page is served from a local development host.
	pub dev_api_origin: Option<Url>,
	/// Login page resolved against `page_url`.
	pub login_page: String,
}
impl GatewayConfigBuilder {
	/// Creates a new builder for a client running on `page_url`.
	pub fn new(page_url: Url) -> Self {
		Self {
			page_url,
			api_origin: None,
			dev_api_origin: None,
			login_page: DEFAULT_LOGIN_PAGE.into(),
		}
	}

	/// Pins the API origin, skipping origin detection.
	pub fn api_origin(mut self, url: Url) -> Self {
		self.api_origin = Some(url);

		self
	}

	/// Overrides the API origin used for local development pages.
	pub fn dev_api_origin(mut self, url: Url) -> Self {
		self.dev_api_origin = Some(url);

		self
	}

	/// Overrides the login page (relative or absolute).
	pub fn login_page(mut self, page: impl Into<String>) -> Self {
		self.login_page = page.into();

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		validate_http_url("page", &self.page_url)?;

		let api_origin = match self.api_origin {
			Some(origin) => origin,
			None if is_local_development_host(&self.page_url) => match self.dev_api_origin {
				Some(origin) => origin,
				None => Url::parse(DEFAULT_DEV_API_ORIGIN).map_err(|_| {
					GatewayConfigError::UnsupportedUrl {
						which: "development API",
						url: DEFAULT_DEV_API_ORIGIN.into(),
					}
				})?,
			},
			None => page_origin(&self.page_url)?,
		};

		validate_http_url("API", &api_origin)?;

		let login_url = self.page_url.join(&self.login_page).map_err(|source| {
			GatewayConfigError::InvalidLoginPage { page: self.login_page.clone(), source }
		})?;

		Ok(GatewayConfig { api_origin, login_url })
	}
}

/// Mirrors the browser heuristic: any origin mentioning `localhost` or `127.0.0.1` is a
/// development page talking to a separately served API.
fn is_local_development_host(page: &Url) -> bool {
	page.host_str().is_some_and(|host| host.contains("localhost") || host.contains("127.0.0.1"))
}

fn page_origin(page: &Url) -> Result<Url, GatewayConfigError> {
	Url::parse(&page.origin().ascii_serialization()).map_err(|_| {
		GatewayConfigError::UnsupportedUrl { which: "page", url: page.to_string() }
	})
}

fn validate_http_url(which: &'static str, url: &Url) -> Result<(), GatewayConfigError> {
	if matches!(url.scheme(), "http" | "https") && url.has_host() {
		Ok(())
	} else {
		Err(GatewayConfigError::UnsupportedUrl { which, url: url.to_string() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse URL fixture.")
	}

	#[test]
	fn production_pages_reuse_their_own_origin() {
		let config = GatewayConfig::builder(url("https://microloan.example.com/app/dashboard.html"))
			.build()
			.expect("Production config should build.");

		assert_eq!(config.api_origin.as_str(), "https://microloan.example.com/");
		assert_eq!(config.login_url.as_str(), "https://microloan.example.com/app/login.html");
	}

	#[test]
	fn local_pages_target_the_development_api() {
		for page in ["http://localhost:5500/index.html", "http://127.0.0.1:8080/loans.html"] {
			let config =
				GatewayConfig::builder(url(page)).build().expect("Local config should build.");

			assert_eq!(config.api_origin.as_str(), "http://localhost:3000/");
		}

		let config = GatewayConfig::builder(url("http://localhost:5500/"))
			.dev_api_origin(url("http://localhost:8000"))
			.login_page("/auth/login.html")
			.build()
			.expect("Overridden local config should build.");

		assert_eq!(config.api_origin.as_str(), "http://localhost:8000/");
		assert_eq!(config.login_url.as_str(), "http://localhost:5500/auth/login.html");
	}

	#[test]
	fn explicit_origin_wins_over_detection() {
		let config = GatewayConfig::builder(url("http://localhost:5500/"))
			.api_origin(url("https://api.microloan.example.com"))
			.build()
			.expect("Pinned config should build.");

		assert_eq!(config.api_origin.as_str(), "https://api.microloan.example.com/");
	}

	#[test]
	fn non_http_pages_are_rejected() {
		let err = GatewayConfig::builder(url("file:///tmp/index.html"))
			.build()
			.expect_err("File pages have no usable origin.");

		assert!(matches!(err, GatewayConfigError::UnsupportedUrl { which: "page", .. }));
	}
}
