//! Registration, sign-in, and profile calls.

// self
use crate::{
	_prelude::*,
	api::{Message, timestamp},
	auth::{TokenPair, TokenSecret, UserId},
	gateway::{ApiRequest, Gateway, RefreshPolicy},
	http::{ApiHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Credential pair minted by registration, login, or OTP verification.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
	/// Bearer credential.
	pub access_token: TokenSecret,
	/// Refresh credential.
	pub refresh_token: TokenSecret,
	/// Token scheme, always `bearer` in practice.
	#[serde(default = "bearer")]
	pub token_type: String,
	/// Account snapshot, present on registration and login.
	#[serde(default)]
	pub user: Option<UserProfile>,
}
impl TokenResponse {
	/// Returns the credential pair to persist.
	pub fn pair(&self) -> TokenPair {
		TokenPair {
			access_token: self.access_token.clone(),
			refresh_token: self.refresh_token.clone(),
		}
	}
}

/// Account as reported by the API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
	/// Account identifier.
	pub id: UserId,
	/// Registered phone number.
	pub phone: String,
	/// National ID number.
	pub id_number: String,
	/// Largest principal the account may currently borrow.
	pub loan_limit: u64,
	/// Registration time.
	#[serde(deserialize_with = "timestamp::deserialize")]
	pub created_at: OffsetDateTime,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
	phone: &'a str,
	id_number: &'a str,
	password: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
	phone: &'a str,
	password: &'a str,
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an account and stores the issued credentials.
	pub async fn register(
		&self,
		phone: &str,
		id_number: &str,
		password: &str,
	) -> Result<TokenResponse> {
		let request = ApiRequest::post("/api/auth/register")
			.json(&RegisterBody { phone, id_number, password })?;

		self.sign_in(request, "register").await
	}

	/// Signs in with phone and password and stores the issued credentials.
	pub async fn login(&self, phone: &str, password: &str) -> Result<TokenResponse> {
		let request = ApiRequest::post("/api/auth/login").json(&LoginBody { phone, password })?;

		self.sign_in(request, "login").await
	}

	/// Asks the API to send a one-time password to `phone`.
	pub async fn request_otp(&self, phone: &str) -> Result<Message> {
		let endpoint = with_query("/api/auth/otp/request", &[("phone", phone)]);

		self.request_json(
			ApiRequest::post(endpoint).no_auth().refresh_policy(RefreshPolicy::Never),
		)
		.await
	}

	/// Exchanges a one-time password for credentials and stores them.
	pub async fn verify_otp(&self, phone: &str, otp: &str) -> Result<TokenResponse> {
		let endpoint = with_query("/api/auth/otp/verify", &[("phone", phone), ("otp", otp)]);

		self.sign_in(ApiRequest::post(endpoint), "verify_otp").await
	}

	/// Returns the signed-in account.
	pub async fn me(&self) -> Result<UserProfile> {
		self.request_json(ApiRequest::get("/api/auth/me")).await
	}

	/// Returns `true` when an access credential is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.session.is_authenticated().await?)
	}

	/// Forgets both stored credentials.
	pub async fn logout(&self) -> Result<()> {
		Ok(self.session.clear().await?)
	}

	/// Sign-in calls are anonymous and a 401 there means the credentials were wrong, so they
	/// never enter the refresh cycle.
	async fn sign_in(&self, request: ApiRequest, stage: &'static str) -> Result<TokenResponse> {
		const KIND: FlowKind = FlowKind::SignIn;

		let span = FlowSpan::new(KIND, stage);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let response: TokenResponse = self
					.request_json(request.no_auth().refresh_policy(RefreshPolicy::Never))
					.await?;

				self.session.store_tokens(&response.pair()).await?;

				Ok::<_, Error>(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

fn bearer() -> String {
	"bearer".into()
}

fn with_query(path: &str, pairs: &[(&str, &str)]) -> String {
	let query = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();

	format!("{path}?{query}")
}
