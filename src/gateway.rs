//! Session-aware request gateway.
//!
//! [`Gateway`] owns the transport, the [`Session`], and the [`GatewayConfig`], and routes every
//! API call through [`Gateway::request`]: it attaches the stored bearer credential, and when
//! the API answers 401 it runs exactly one refresh-and-retry cycle before clearing the session
//! and handing control to the [`LoginRedirect`] hook.

pub mod refresh;
pub mod request;

pub use refresh::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	auth::Session,
	config::GatewayConfig,
	http::{ApiHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport stack.
pub type ReqwestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Terminal action taken when the session cannot be recovered.
///
/// Browsers navigate to the login page; a CLI might print instructions, a GUI might swap
/// screens. The hook runs after both credentials have been cleared.
pub trait LoginRedirect
where
	Self: Send + Sync,
{
	/// Sends the user to `target`.
	fn redirect(&self, target: &Url);
}

/// Redirect hook that does nothing; the caller reacts to [`Error::SessionExpired`] instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRedirect;
impl LoginRedirect for NoRedirect {
	fn redirect(&self, _target: &Url) {}
}

/// Routes API calls through one credential session.
pub struct Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Credential session read before every request and rotated by refreshes.
	pub session: Session,
	/// API origin and login target.
	pub config: GatewayConfig,
	/// Hook invoked once the session is unrecoverable.
	pub login_redirect: Arc<dyn LoginRedirect>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a gateway that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		session: Session,
		config: GatewayConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			session,
			config,
			login_redirect: Arc::new(NoRedirect),
			refresh_metrics: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Replaces the hook invoked when the session expires.
	pub fn with_login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
		self.login_redirect = redirect;

		self
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new gateway backed by a default reqwest client.
	pub fn new(session: Session, config: GatewayConfig) -> Self {
		Self::with_http_client(
			session,
			config,
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Clone for Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			session: self.session.clone(),
			config: self.config.clone(),
			login_redirect: self.login_redirect.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<C, M> Debug for Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("api_origin", &self.config.api_origin.as_str())
			.field("login_url", &self.config.login_url.as_str())
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}
