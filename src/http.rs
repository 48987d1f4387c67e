//! Transport primitives for API calls.
//!
//! The module exposes [`ApiHttpClient`], the gateway's only dependency on an HTTP stack, and
//! [`TransportErrorMapper`], which decides how a transport failure surfaces to callers.
//! Requests and responses use the [`http`](::http) crate's types with fully buffered bodies,
//! so a fake transport in tests only has to build an [`HttpResponse`].

pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};

// crates.io
use ::http::{Request, Response};
// self
use crate::_prelude::*;

/// Outbound request with a buffered body.
pub type HttpRequest = Request<Vec<u8>>;
/// Inbound response with a buffered body.
pub type HttpResponse = Response<Vec<u8>>;
/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing API calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by
/// several gateways behind an `Arc`, and the returned future must be `Send` so gateway
/// futures can hop executors.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and buffers the full response.
	///
	/// Any HTTP status, including 4xx/5xx, is a successful transport outcome; an `Err` means
	/// no response was obtained.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Maps transport failures into client [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport into a client error.
	fn map_transport_error(&self, error: E) -> Error;
}

/// Mapper that treats every transport failure as [`Error::NetworkUnavailable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NetworkErrorMapper;
impl<E> TransportErrorMapper<E> for NetworkErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, error: E) -> Error {
		Error::network(error)
	}
}

/// Default mapper for reqwest-backed transports.
///
/// Builder failures (a request reqwest refused to construct) are local configuration
/// problems; everything else means the server was never reached.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, error: ReqwestError) -> Error {
		if error.is_builder() {
			crate::error::ConfigError::from(error).into()
		} else {
			Error::network(error)
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut buffered = Response::new(response.bytes().await?.to_vec());

			*buffered.status_mut() = status;
			*buffered.headers_mut() = headers;

			Ok::<_, ReqwestError>(buffered)
		})
	}
}
