//! Repayment checkout and transaction history.

// self
use crate::{
	_prelude::*,
	api::timestamp,
	auth::{AccessCode, LoanId, PaymentReference},
	gateway::{ApiRequest, Gateway},
	http::{ApiHttpClient, TransportErrorMapper},
};

/// Outcome of a repayment transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
	/// Checkout started, not settled.
	Pending,
	/// Settled; the loan is repaid.
	Success,
	/// Declined or abandoned.
	Failed,
	/// Any state this client does not know about.
	#[serde(other)]
	Unknown,
}

/// Checkout session for repaying a loan.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PaymentInit {
	/// Hosted checkout page to send the borrower to.
	pub authorization_url: Url,
	/// Checkout access code.
	pub access_code: AccessCode,
	/// Reference to verify the payment with.
	pub reference: PaymentReference,
}

/// Result of verifying a repayment.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PaymentVerification {
	/// Settlement state.
	pub status: PaymentStatus,
	/// Verified reference.
	pub reference: PaymentReference,
	/// Amount charged.
	pub amount: u64,
	/// Human-readable summary.
	pub message: String,
}

/// A repayment attempt recorded by the API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Transaction {
	/// Transaction identifier.
	pub id: u64,
	/// Loan being repaid.
	pub loan_id: LoanId,
	/// Payment reference.
	pub reference: PaymentReference,
	/// Amount charged.
	pub amount: u64,
	/// Settlement state.
	pub status: PaymentStatus,
	/// Creation time.
	#[serde(deserialize_with = "timestamp::deserialize")]
	pub created_at: OffsetDateTime,
}

#[derive(Serialize)]
struct InitializeBody<'a> {
	loan_id: LoanId,
	#[serde(skip_serializing_if = "Option::is_none")]
	callback_url: Option<&'a str>,
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts a checkout for repaying `loan_id`.
	///
	/// `callback_url` is where the payment provider sends the borrower afterwards; when absent
	/// the field is omitted and the API falls back to its own default.
	pub async fn initialize_payment(
		&self,
		loan_id: LoanId,
		callback_url: Option<&Url>,
	) -> Result<PaymentInit> {
		let body = InitializeBody { loan_id, callback_url: callback_url.map(Url::as_str) };

		self.request_json(ApiRequest::post("/api/payments/initialize").json(&body)?).await
	}

	/// Asks the API to confirm the payment behind `reference`.
	pub async fn verify_payment(&self, reference: &PaymentReference) -> Result<PaymentVerification> {
		self.request_json(ApiRequest::get(format!("/api/payments/verify/{reference}"))).await
	}

	/// Lists the account's repayment transactions, newest first.
	pub async fn transactions(&self) -> Result<Vec<Transaction>> {
		self.request_json(ApiRequest::get("/api/payments/transactions")).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn callback_url_is_omitted_when_absent() {
		let body = serde_json::to_value(InitializeBody { loan_id: LoanId(7), callback_url: None })
			.expect("Body should serialize.");

		assert_eq!(body, serde_json::json!({ "loan_id": 7 }));

		let body = serde_json::to_value(InitializeBody {
			loan_id: LoanId(7),
			callback_url: Some("https://app.microloan.test/payment-callback.html"),
		})
		.expect("Body should serialize.");

		assert_eq!(body["callback_url"], "https://app.microloan.test/payment-callback.html");
	}

	#[test]
	fn verification_rejects_references_that_escape_the_path() {
		let err = serde_json::from_str::<PaymentVerification>(
			r#"{"status":"success","reference":"../admin","amount":1070,"message":"ok"}"#,
		)
		.expect_err("A reference with a slash must be rejected.");

		assert!(err.to_string().contains("reserved character"));
	}
}
