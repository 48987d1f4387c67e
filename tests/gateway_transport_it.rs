// std
use std::{
	collections::VecDeque,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::Arc,
};
// crates.io
use parking_lot::Mutex;
use time::Duration;
use url::Url;
// self
use microloan_client::{
	auth::{Session, TokenPair},
	config::GatewayConfig,
	error::{ConfigError, Error},
	gateway::{ApiRequest, Gateway, LoginRedirect},
	http::{
		ApiHttpClient, HttpFuture, HttpRequest, HttpResponse, NetworkErrorMapper, StatusCode,
		header::{AUTHORIZATION, RETRY_AFTER},
	},
	store::{FileStore, MemoryStore, SessionKey, SessionStore, StoreFuture},
};

#[derive(Debug)]
enum FakeTransportError {
	ConnectionReset,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::ConnectionReset => write!(f, "Connection reset by peer."),
		}
	}
}
impl StdError for FakeTransportError {}

type Scripted = Result<HttpResponse, FakeTransportError>;

/// Replays queued responses and remembers what it was asked to send.
#[derive(Default)]
struct ScriptedTransport {
	replies: Mutex<VecDeque<Scripted>>,
	sent: Mutex<Vec<HttpRequest>>,
}
impl ScriptedTransport {
	fn with_replies(replies: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
		Arc::new(Self { replies: Mutex::new(replies.into_iter().collect()), ..Default::default() })
	}

	fn sent(&self) -> Vec<(String, Option<String>)> {
		self.sent
			.lock()
			.iter()
			.map(|request| {
				let auth = request
					.headers()
					.get(AUTHORIZATION)
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned);

				(request.uri().path().to_owned(), auth)
			})
			.collect()
	}
}
impl ApiHttpClient for ScriptedTransport {
	type TransportError = FakeTransportError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		self.sent.lock().push(request);

		let reply = self.replies.lock().pop_front().expect("Transport script ran out of replies.");

		// Yield once so concurrent gateway calls interleave at the network boundary.
		Box::pin(async move {
			tokio::task::yield_now().await;

			reply
		})
	}
}

#[derive(Default)]
struct RecordingRedirect(Mutex<Vec<Url>>);
impl LoginRedirect for RecordingRedirect {
	fn redirect(&self, target: &Url) {
		self.0.lock().push(target.clone());
	}
}

/// Memory store that journals every mutation.
#[derive(Default)]
struct JournalStore {
	inner: MemoryStore,
	journal: Mutex<Vec<String>>,
}
impl JournalStore {
	async fn seeded(access: &str, refresh: &str) -> Arc<Self> {
		let store = Arc::new(Self::default());

		Session::new(store.clone())
			.store_tokens(&TokenPair::new(access, refresh))
			.await
			.expect("Seeding the session should succeed.");
		store.journal.lock().clear();

		store
	}

	fn journal(&self) -> Vec<String> {
		self.journal.lock().clone()
	}
}
impl SessionStore for JournalStore {
	fn get(&self, key: SessionKey) -> StoreFuture<'_, Option<String>> {
		self.inner.get(key)
	}

	fn set(&self, key: SessionKey, value: String) -> StoreFuture<'_, ()> {
		self.journal.lock().push(format!("set {key}={value}"));

		self.inner.set(key, value)
	}

	fn remove(&self, key: SessionKey) -> StoreFuture<'_, Option<String>> {
		self.journal.lock().push(format!("remove {key}"));

		self.inner.remove(key)
	}
}

fn reply(status: u16, body: &str) -> Scripted {
	let mut response = HttpResponse::new(body.as_bytes().to_vec());

	*response.status_mut() = StatusCode::from_u16(status).expect("Status fixture should be valid.");

	Ok(response)
}

fn config() -> GatewayConfig {
	let page = Url::parse("https://app.microloan.test/loans/apply.html")
		.expect("Page URL fixture should parse.");

	GatewayConfig::builder(page).build().expect("Config should build from a production page.")
}

fn gateway(
	session: Session,
	transport: &Arc<ScriptedTransport>,
) -> Gateway<ScriptedTransport, NetworkErrorMapper> {
	Gateway::with_http_client(session, config(), transport.clone(), NetworkErrorMapper)
}

fn redirecting_gateway(
	store: &Arc<JournalStore>,
	transport: &Arc<ScriptedTransport>,
) -> (Gateway<ScriptedTransport, NetworkErrorMapper>, Arc<RecordingRedirect>) {
	let redirect = Arc::new(RecordingRedirect::default());
	let gateway =
		gateway(Session::new(store.clone()), transport).with_login_redirect(redirect.clone());

	(gateway, redirect)
}

fn cleared() -> Vec<String> {
	vec!["remove access_token".to_owned(), "remove refresh_token".to_owned()]
}

#[tokio::test]
async fn transport_failures_surface_as_network_unavailable() {
	let transport = ScriptedTransport::with_replies([Err(FakeTransportError::ConnectionReset)]);
	let gateway = gateway(Session::in_memory(), &transport);
	let err = gateway
		.request(ApiRequest::get("/api/auth/me"))
		.await
		.expect_err("Reset connection must fail.");

	match err {
		Error::NetworkUnavailable { source } =>
			assert_eq!(source.to_string(), "Connection reset by peer."),
		other => panic!("Unexpected error variant: {other:?}."),
	}
	assert_eq!(transport.sent(), [("/api/auth/me".to_owned(), None)]);
}

#[tokio::test]
async fn relative_endpoints_are_rejected_before_any_call() {
	let transport = ScriptedTransport::with_replies([]);
	let gateway = gateway(Session::in_memory(), &transport);

	for endpoint in ["api/auth/me", "//evil.test/api", "https://evil.test/api"] {
		let err = gateway
			.request(ApiRequest::get(endpoint))
			.await
			.expect_err("Non-path endpoints must be rejected.");

		assert!(
			matches!(err, Error::Config(ConfigError::InvalidEndpoint { .. })),
			"Unexpected error for {endpoint}: {err:?}."
		);
	}
	assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn retry_after_hint_is_exposed_on_throttled_calls() {
	let mut throttled = reply(429, r#"{"detail":"Too many OTP requests"}"#)
		.expect("Scripted reply should be a response.");

	throttled.headers_mut().insert(RETRY_AFTER, "45".parse().expect("Header value should parse."));

	let transport = ScriptedTransport::with_replies([Ok(throttled)]);
	let gateway = gateway(Session::in_memory(), &transport);

	match gateway.request_otp("0712345678").await.expect_err("Throttled call must fail.") {
		Error::RequestFailed { status, detail, retry_after } => {
			assert_eq!(status, 429);
			assert_eq!(detail, "Too many OTP requests");
			assert_eq!(retry_after, Some(Duration::seconds(45)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn file_backed_session_survives_a_rotation() {
	let dir = std::env::temp_dir().join(format!("microloan-client-it-{}", std::process::id()));
	let path = dir.join("session.json");
	let store: Arc<dyn SessionStore> =
		Arc::new(FileStore::open(&path).expect("File store should open."));
	let session = Session::new(store);

	session
		.store_tokens(&TokenPair::new("A1", "R1"))
		.await
		.expect("Seeding the session should succeed.");

	let transport = ScriptedTransport::with_replies([
		reply(401, r#"{"detail":"Token expired"}"#),
		reply(200, r#"{"access_token":"A2","refresh_token":"R2","token_type":"bearer"}"#),
		reply(200, r#"{"message":"ok"}"#),
	]);
	let gateway = gateway(session, &transport);
	let body = gateway
		.request(ApiRequest::get("/api/loans/history"))
		.await
		.expect("Rotation should recover the call.");

	assert_eq!(body["message"], "ok");
	assert_eq!(
		transport.sent(),
		[
			("/api/loans/history".to_owned(), Some("Bearer A1".to_owned())),
			("/api/auth/refresh".to_owned(), None),
			("/api/loans/history".to_owned(), Some("Bearer A2".to_owned())),
		]
	);

	let reopened = FileStore::open(&path).expect("File store should reopen.");

	assert_eq!(
		reopened.get(SessionKey::RefreshToken).await.expect("Reopened read should succeed."),
		Some("R2".to_owned())
	);

	std::fs::remove_dir_all(&dir).expect("Temporary directory should be removable.");
}

#[tokio::test]
async fn anonymous_request_rejected_with_stored_pair_refreshes_once() {
	let store = JournalStore::seeded("A1", "R1").await;
	let transport = ScriptedTransport::with_replies([
		reply(401, r#"{"detail":"Not authenticated"}"#),
		reply(200, r#"{"access_token":"A2","refresh_token":"R2"}"#),
		reply(200, r#"{"status":"ok"}"#),
	]);
	let (gateway, redirect) = redirecting_gateway(&store, &transport);
	let body = gateway
		.request(ApiRequest::get("/api/public").no_auth())
		.await
		.expect("Anonymous call should recover after a refresh.");

	assert_eq!(body["status"], "ok");
	assert_eq!(
		transport.sent(),
		[
			("/api/public".to_owned(), None),
			("/api/auth/refresh".to_owned(), None),
			("/api/public".to_owned(), None),
		]
	);
	assert_eq!(gateway.refresh_metrics.attempts(), 1);
	assert_eq!(gateway.refresh_metrics.coalesced(), 0);
	assert_eq!(store.journal(), ["set access_token=A2", "set refresh_token=R2"]);
	assert!(redirect.0.lock().is_empty());
}

#[tokio::test]
async fn unreachable_refresh_endpoint_expires_the_session() {
	let store = JournalStore::seeded("A1", "R1").await;
	let transport = ScriptedTransport::with_replies([
		reply(401, r#"{"detail":"Token expired"}"#),
		Err(FakeTransportError::ConnectionReset),
	]);
	let (gateway, redirect) = redirecting_gateway(&store, &transport);
	let err = gateway.me().await.expect_err("Unreachable refresh must expire the session.");

	assert!(matches!(err, Error::SessionExpired));
	assert_eq!(
		transport.sent(),
		[
			("/api/auth/me".to_owned(), Some("Bearer A1".to_owned())),
			("/api/auth/refresh".to_owned(), None),
		]
	);
	assert_eq!(store.journal(), cleared());
	assert!(store.inner.snapshot().is_empty());
	assert_eq!(redirect.0.lock().len(), 1);
	assert_eq!(gateway.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn undecodable_refresh_body_never_overwrites_the_pair() {
	let store = JournalStore::seeded("A1", "R1").await;
	let transport = ScriptedTransport::with_replies([
		reply(401, r#"{"detail":"Token expired"}"#),
		reply(200, r#"{"access_token":"A2","token_type":"bearer"}"#),
	]);
	let (gateway, redirect) = redirecting_gateway(&store, &transport);
	let err = gateway.loan_history().await.expect_err("A half pair must not be accepted.");

	assert!(matches!(err, Error::SessionExpired));
	assert_eq!(store.journal(), cleared());
	assert_eq!(
		redirect.0.lock().as_slice(),
		[Url::parse("https://app.microloan.test/loans/login.html")
			.expect("Login URL fixture should parse.")]
	);
}

#[tokio::test]
async fn refresh_session_reports_rotation_without_throwing() {
	let store = Arc::new(JournalStore::default());
	let transport = ScriptedTransport::with_replies([reply(
		200,
		r#"{"access_token":"A2","refresh_token":"R2"}"#,
	)]);
	let (gateway, redirect) = redirecting_gateway(&store, &transport);

	assert!(!gateway.refresh_session().await);
	assert!(transport.sent().is_empty());

	gateway
		.session
		.store_tokens(&TokenPair::new("A1", "R1"))
		.await
		.expect("Seeding the session should succeed.");

	assert!(gateway.refresh_session().await);
	assert_eq!(transport.sent(), [("/api/auth/refresh".to_owned(), None)]);
	assert_eq!(
		gateway.session.refresh_token().await.expect("Session read should succeed.").map(
			|secret| secret.expose().to_owned()
		),
		Some("R2".to_owned())
	);
	assert_eq!(gateway.refresh_metrics.successes(), 1);
	assert!(redirect.0.lock().is_empty());
}

#[tokio::test]
async fn concurrent_expiry_clears_and_redirects_once() {
	let store = JournalStore::seeded("A1", "R1").await;
	let transport = ScriptedTransport::with_replies([
		reply(401, r#"{"detail":"Token expired"}"#),
		reply(401, r#"{"detail":"Token expired"}"#),
		reply(401, r#"{"detail":"Invalid refresh token"}"#),
	]);
	let (gateway, redirect) = redirecting_gateway(&store, &transport);
	let (first, second) = tokio::join!(gateway.me(), gateway.transactions());

	assert!(matches!(first, Err(Error::SessionExpired)));
	assert!(matches!(second, Err(Error::SessionExpired)));

	let refreshes =
		transport.sent().into_iter().filter(|(path, _)| path == "/api/auth/refresh").count();

	assert_eq!(refreshes, 1);
	assert_eq!(transport.sent().len(), 3);
	assert_eq!(store.journal(), cleared());
	assert_eq!(redirect.0.lock().len(), 1);
	assert_eq!(gateway.refresh_metrics.attempts(), 1);
}
