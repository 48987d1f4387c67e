//! Client-level error types shared across the gateway, stores, and typed API calls.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message surfaced when the transport could not obtain any response.
pub const NETWORK_UNAVAILABLE_MESSAGE: &str =
	"Unable to connect to server. Please check your connection.";
/// Message surfaced when the session could not be recovered after a 401.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";
/// Fallback detail used when a failed response carries no usable `detail` field.
pub const FALLBACK_DETAIL: &str = "An error occurred";

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request-construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The API rejected the credential and the refresh path could not recover it.
	///
	/// Both stored tokens have been cleared and the login redirect has been triggered.
	#[error("Session expired. Please login again.")]
	SessionExpired,
	/// The API answered with a non-success status.
	#[error("{detail}")]
	RequestFailed {
		/// HTTP status code of the response.
		status: u16,
		/// Server-supplied `detail`, or a generic fallback.
		detail: String,
		/// Retry-After hint from the server, if supplied.
		retry_after: Option<Duration>,
	},
	/// No response could be obtained (DNS, TCP, TLS, or a dropped connection).
	#[error("Unable to connect to server. Please check your connection.")]
	NetworkUnavailable {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The response body was not the JSON the caller expected.
	#[error("Response body from HTTP {status} could not be decoded.")]
	MalformedBody {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure, including the JSON path that failed.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Wraps a transport-specific failure as [`Error::NetworkUnavailable`].
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::NetworkUnavailable { source: Box::new(src) }
	}

	/// Returns the HTTP status attached to the error, when the server answered at all.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::RequestFailed { status, .. } | Self::MalformedBody { status, .. } =>
				Some(*status),
			_ => None,
		}
	}
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		Self::Config(e.into())
	}
}

/// Configuration and request-construction failures raised locally.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed (bad header name or value, bad method).
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Endpoint is not an absolute path on the API origin.
	#[error("Endpoint `{endpoint}` must be an absolute path starting with `/`.")]
	InvalidEndpoint {
		/// Offending endpoint string.
		endpoint: String,
	},
	/// Endpoint could not be joined onto the API origin.
	#[error("Endpoint `{endpoint}` does not form a valid URL.")]
	InvalidUrl {
		/// Offending endpoint string.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	RequestBody(#[source] serde_json::Error),
	/// Identifier supplied to a typed call is invalid.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug)]
	struct Refused;
	impl Display for Refused {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			f.write_str("connection refused")
		}
	}
	impl StdError for Refused {}

	#[test]
	fn network_error_hides_transport_message_but_keeps_source() {
		let err = Error::network(Refused);

		assert_eq!(err.to_string(), NETWORK_UNAVAILABLE_MESSAGE);
		assert_eq!(
			StdError::source(&err).map(ToString::to_string).as_deref(),
			Some("connection refused")
		);
		assert_eq!(err.status(), None);
	}

	#[test]
	fn request_failed_displays_server_detail_verbatim() {
		let err = Error::RequestFailed {
			status: 400,
			detail: "You have an active loan. Please repay it first.".into(),
			retry_after: None,
		};

		assert_eq!(err.to_string(), "You have an active loan. Please repay it first.");
		assert_eq!(err.status(), Some(400));
		assert_eq!(Error::SessionExpired.to_string(), SESSION_EXPIRED_MESSAGE);
	}
}
