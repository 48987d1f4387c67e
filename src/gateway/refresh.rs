//! Credential refresh with a single-flight guard and outcome counters.
//!
//! A request that receives 401 calls into this module exactly once. The refresh guard
//! serializes rotations: a request that waited behind another rotation compares the stored
//! access token with the one the API rejected and, when they differ, retries with the new
//! credential instead of spending the refresh token a second time. When the rotation fails the
//! session is expired before the guard is released.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	config::REFRESH_ENDPOINT,
	gateway::{ApiRequest, Gateway, RefreshPolicy, request},
	http::{ApiHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan, SessionEvent},
};

/// How a 401 was resolved by the refresh sub-operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RefreshVerdict {
	/// A fresh credential is stored; re-issue the request once.
	Retry,
	/// The session is gone and the redirect hook has already run.
	Expired,
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges the stored refresh credential for a new pair.
	///
	/// Returns `false` without any network call when no refresh credential is stored, and
	/// `false` on any non-success response, transport failure, or store failure. On success
	/// both stored credentials are overwritten.
	pub async fn refresh_session(&self) -> bool {
		let _singleflight = self.refresh_guard.lock().await;

		self.refresh_locked().await
	}

	/// Resolves a 401 for a request that carried `rejected` (or no credential at all).
	///
	/// Runs under the refresh guard. Only a request that actually sent a credential can be
	/// satisfied by a rotation another request made while it waited. A failed refresh expires
	/// the session before the guard is released, so waiters observe the cleared store and
	/// neither refresh again nor repeat the redirect.
	pub(crate) async fn refresh_after_unauthorized(
		&self,
		rejected: Option<&TokenSecret>,
	) -> RefreshVerdict {
		let _singleflight = self.refresh_guard.lock().await;

		if let Some(sent) = rejected {
			match self.session.access_token().await {
				Ok(Some(current)) if current != *sent => {
					self.refresh_metrics.record_coalesced();
					obs::record_session_event(SessionEvent::RefreshCoalesced);

					return RefreshVerdict::Retry;
				},
				Ok(Some(_)) => (),
				Ok(None) => {
					obs::record_session_event(SessionEvent::AlreadyExpired);

					return RefreshVerdict::Expired;
				},
				Err(_) => {
					obs::record_session_event(SessionEvent::RefreshStoreFailed);
					self.expire_session().await;

					return RefreshVerdict::Expired;
				},
			}
		}

		if self.refresh_locked().await {
			RefreshVerdict::Retry
		} else {
			self.expire_session().await;

			RefreshVerdict::Expired
		}
	}

	/// Clears both credentials and hands control to the login redirect hook.
	async fn expire_session(&self) {
		if self.session.clear().await.is_err() {
			obs::record_session_event(SessionEvent::RefreshStoreFailed);
		}

		obs::record_session_event(SessionEvent::Expired { login_url: &self.config.login_url });
		self.login_redirect.redirect(&self.config.login_url);
	}

	async fn refresh_locked(&self) -> bool {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_session");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		match span.instrument(self.exchange_refresh_token()).await {
			Ok(()) => {
				self.refresh_metrics.record_success();
				obs::record_session_event(SessionEvent::Refreshed);
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				true
			},
			Err(event) => {
				self.refresh_metrics.record_failure();
				obs::record_session_event(event);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				false
			},
		}
	}

	async fn exchange_refresh_token(&self) -> Result<(), SessionEvent<'static>> {
		let refresh_token = self
			.session
			.refresh_token()
			.await
			.map_err(|_| SessionEvent::RefreshStoreFailed)?
			.ok_or(SessionEvent::RefreshUnavailable)?;
		let body = serde_json::json!({ "refresh_token": refresh_token.expose() });
		let refresh_request = ApiRequest::post(REFRESH_ENDPOINT)
			.body(body.to_string())
			.no_auth()
			.refresh_policy(RefreshPolicy::Never);
		let (response, _) =
			self.send(&refresh_request).await.map_err(|_| SessionEvent::RefreshUnreachable)?;
		let status = response.status().as_u16();
		let pair: TokenPair = request::decode_response(response)
			.map_err(|_| SessionEvent::RefreshRejected { status })?;

		self.session.store_tokens(&pair).await.map_err(|_| SessionEvent::RefreshStoreFailed)
	}
}
