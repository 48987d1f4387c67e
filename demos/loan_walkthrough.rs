//! Walks one borrower through sign-in, an expired access token, a loan application, and the
//! repayment checkout against a mock API.
//!
//! The mock rejects the first profile call with 401 so the gateway's refresh-and-retry cycle
//! runs once before the rest of the walkthrough.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use microloan_client::{
	auth::Session,
	config::GatewayConfig,
	gateway::{Gateway, LoginRedirect},
	store::{MemoryStore, SessionStore},
};

struct ConsoleRedirect;
impl LoginRedirect for ConsoleRedirect {
	fn redirect(&self, target: &Url) {
		println!("session lost, please sign in again at {target}");
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).json_body(json!({
				"access_token": "demo-access-1",
				"refresh_token": "demo-refresh-1",
				"token_type": "bearer"
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/auth/me").header("authorization", "Bearer demo-access-1");
			then.status(401).json_body(json!({ "detail": "Token expired" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({
				"access_token": "demo-access-2",
				"refresh_token": "demo-refresh-2"
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/auth/me").header("authorization", "Bearer demo-access-2");
			then.status(200).json_body(json!({
				"id": 1,
				"phone": "0712345678",
				"id_number": "12345678",
				"loan_limit": 5000,
				"created_at": "2024-05-01T08:00:00"
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/loans/preview");
			then.status(200).json_body(json!({ "principal": 3000, "fee": 210, "total_repayable": 3210 }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/loans/apply");
			then.status(200).json_body(json!({
				"id": 42,
				"user_id": 1,
				"amount": 3000,
				"fee": 210,
				"total": 3210,
				"status": "approved",
				"created_at": "2024-06-02T10:00:00"
			}));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/payments/initialize");
			then.status(200).json_body(json!({
				"authorization_url": "https://checkout.example.test/c/xyz",
				"access_code": "xyz",
				"reference": "LOAN-42-1717322400"
			}));
		})
		.await;

	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let config = GatewayConfig::builder(Url::parse("https://app.microloan.test/dashboard.html")?)
		.api_origin(Url::parse(&server.base_url())?)
		.build()?;
	let gateway =
		Gateway::new(Session::new(store), config).with_login_redirect(Arc::new(ConsoleRedirect));

	gateway.login("0712345678", "hunter22").await?;

	let profile = gateway.me().await?;

	println!(
		"signed in as {} (limit {}), refreshes so far: {}",
		profile.phone,
		profile.loan_limit,
		gateway.refresh_metrics.successes()
	);

	let quote = gateway.loan_preview(3000).await?;

	println!("borrowing {} costs {} in fees", quote.principal, quote.fee);

	let loan = gateway.apply_loan(quote.principal).await?;
	let checkout = gateway.initialize_payment(loan.id, None).await?;

	println!("loan {} is {:?}; repay at {}", loan.id, loan.status, checkout.authorization_url);

	gateway.logout().await?;

	Ok(())
}
