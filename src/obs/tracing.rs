// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("microloan_client.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Notable session transitions worth a log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent<'a> {
	/// A 401 arrived but no refresh credential is stored.
	RefreshUnavailable,
	/// Another in-flight request already rotated the credential.
	RefreshCoalesced,
	/// The refresh endpoint answered with a non-success status or an unusable body.
	RefreshRejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
	},
	/// The refresh endpoint could not be reached.
	RefreshUnreachable,
	/// The store failed while reading or writing credentials during refresh.
	RefreshStoreFailed,
	/// Both credentials were rotated.
	Refreshed,
	/// A concurrent request already expired the session while this one waited.
	AlreadyExpired,
	/// The session was cleared and the user is being sent to the login page.
	Expired {
		/// Navigation target.
		login_url: &'a Url,
	},
}

/// Logs a session transition via `tracing` (when enabled).
pub fn record_session_event(event: SessionEvent<'_>) {
	#[cfg(feature = "tracing")]
	{
		match event {
			SessionEvent::RefreshUnavailable =>
				tracing::debug!("No refresh token stored; skipping refresh."),
			SessionEvent::RefreshCoalesced =>
				tracing::debug!("Credential already rotated by a concurrent request."),
			SessionEvent::RefreshRejected { status } =>
				tracing::warn!(status, "Refresh endpoint rejected the refresh token."),
			SessionEvent::RefreshUnreachable => tracing::warn!("Refresh endpoint is unreachable."),
			SessionEvent::RefreshStoreFailed =>
				tracing::warn!("Session store failed during refresh."),
			SessionEvent::Refreshed => tracing::info!("Session credentials rotated."),
			SessionEvent::AlreadyExpired =>
				tracing::debug!("Session already expired by a concurrent request."),
			SessionEvent::Expired { login_url } => tracing::warn!(
				login_url = login_url.as_str(),
				"Session expired; redirecting to login."
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = event;
	}
}
