//! Request descriptors and the send → refresh → retry-once state machine.

// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, FALLBACK_DETAIL},
	gateway::{Gateway, RefreshVerdict},
	http::{ApiHttpClient, HttpRequest, HttpResponse, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Whether a 401 may trigger the refresh-and-retry cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
	/// Refresh once and retry once on 401.
	#[default]
	OnUnauthorized,
	/// Surface a 401 as [`Error::RequestFailed`] without touching the session.
	Never,
}

/// Describes one API call; transient, built per call.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute path on the API origin, e.g. `/api/loans/history`.
	pub endpoint: String,
	/// Pre-serialized JSON body.
	pub body: Option<Vec<u8>>,
	/// Header overrides merged over the JSON content type.
	pub headers: HeaderMap,
	/// Suppresses the `Authorization` header even when a credential is stored.
	pub no_auth: bool,
	/// How a 401 is handled.
	pub refresh_policy: RefreshPolicy,
}
impl ApiRequest {
	/// Creates a request without body, extra headers, or flags.
	pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
		Self {
			method,
			endpoint: endpoint.into(),
			body: None,
			headers: HeaderMap::new(),
			no_auth: false,
			refresh_policy: RefreshPolicy::default(),
		}
	}

	/// Creates a `GET` request.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(Method::GET, endpoint)
	}

	/// Creates a `POST` request.
	pub fn post(endpoint: impl Into<String>) -> Self {
		Self::new(Method::POST, endpoint)
	}

	/// Sets a pre-serialized JSON body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON body.
	pub fn json<T>(self, payload: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(payload).map_err(ConfigError::RequestBody)?;

		Ok(self.body(body))
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Marks the request as anonymous.
	pub fn no_auth(mut self) -> Self {
		self.no_auth = true;

		self
	}

	/// Overrides the 401 handling.
	pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
		self.refresh_policy = policy;

		self
	}

	fn to_http(&self, url: &Url, token: Option<&TokenSecret>) -> Result<HttpRequest, ConfigError> {
		let mut builder = Request::builder().method(self.method.clone()).uri(url.as_str());

		if let Some(headers) = builder.headers_mut() {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
			headers.extend(self.headers.clone());

			if token.is_some() {
				headers.remove(AUTHORIZATION);
			}
		}
		if let Some(token) = token {
			builder = builder.header(AUTHORIZATION, token.bearer());
		}

		Ok(builder.body(self.body.clone().unwrap_or_default())?)
	}
}

/// Progress of one gateway call. `Refreshing` is only reachable from `Pending`, so a request
/// refreshes at most once. `Failed` is entered after the session was already cleared.
#[derive(Debug)]
enum RequestPhase {
	Pending,
	Refreshing {
		/// Credential the API just rejected.
		rejected: Option<TokenSecret>,
	},
	Retried,
	Failed,
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends `request` and returns the parsed JSON body unchanged.
	pub async fn request(&self, request: ApiRequest) -> Result<Value> {
		self.request_json(request).await
	}

	/// Sends `request` and decodes the JSON body into `T`.
	pub async fn request_json<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response = self.dispatch(&request).await?;

				decode_response(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn dispatch(&self, request: &ApiRequest) -> Result<HttpResponse> {
		let mut phase = RequestPhase::Pending;

		loop {
			phase = match phase {
				RequestPhase::Pending => {
					let (response, sent) = self.send(request).await?;

					if response.status() == StatusCode::UNAUTHORIZED
						&& request.refresh_policy == RefreshPolicy::OnUnauthorized
					{
						RequestPhase::Refreshing { rejected: sent }
					} else {
						return Ok(response);
					}
				},
				RequestPhase::Refreshing { rejected } =>
					match self.refresh_after_unauthorized(rejected.as_ref()).await {
						RefreshVerdict::Retry => RequestPhase::Retried,
						RefreshVerdict::Expired => RequestPhase::Failed,
					},
				RequestPhase::Retried => {
					obs::record_flow_outcome(FlowKind::Request, FlowOutcome::Retry);

					return self.send(request).await.map(|(response, _)| response);
				},
				RequestPhase::Failed => return Err(Error::SessionExpired),
			};
		}
	}

	/// Builds and sends one HTTP call, returning the response and the credential it carried.
	pub(crate) async fn send(
		&self,
		request: &ApiRequest,
	) -> Result<(HttpResponse, Option<TokenSecret>)> {
		let url = self.config.endpoint_url(&request.endpoint)?;
		let token = if request.no_auth { None } else { self.session.access_token().await? };
		let http_request = request.to_http(&url, token.as_ref())?;
		let response = self
			.http_client
			.execute(http_request)
			.await
			.map_err(|e| self.transport_mapper.map_transport_error(e))?;

		Ok((response, token))
	}
}

/// Decodes a success body into `T`, or turns a failure body into [`Error::RequestFailed`].
pub(crate) fn decode_response<T>(response: HttpResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let status = response.status();

	if status.is_success() {
		return parse_body(status, response.body());
	}

	let retry_after = parse_retry_after(response.headers());
	let body: Value = parse_body(status, response.body())?;

	Err(Error::RequestFailed { status: status.as_u16(), detail: failure_detail(&body), retry_after })
}

fn parse_body<T>(status: StatusCode, bytes: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::MalformedBody { status: status.as_u16(), source })
}

/// Picks the human-readable reason out of an error body.
///
/// Plain `detail` strings are used verbatim; request-validation errors carry a list of
/// `{loc, msg, type}` objects whose messages are joined.
fn failure_detail(body: &Value) -> String {
	match body.get("detail") {
		Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
		Some(Value::Array(items)) => {
			let messages = items
				.iter()
				.filter_map(|item| item.get("msg").and_then(Value::as_str))
				.collect::<Vec<_>>();

			if messages.is_empty() { FALLBACK_DETAIL.into() } else { messages.join("; ") }
		},
		_ => FALLBACK_DETAIL.into(),
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
