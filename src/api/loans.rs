//! Loan quotes, applications, and history.

// self
use crate::{
	_prelude::*,
	api::timestamp,
	auth::{LoanId, UserId},
	gateway::{ApiRequest, Gateway},
	http::{ApiHttpClient, TransportErrorMapper},
};

/// Lifecycle state of a loan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
	/// Submitted, awaiting a decision.
	Pending,
	/// Approved, not yet paid out.
	Approved,
	/// Paid out to the borrower.
	Disbursed,
	/// Fully repaid.
	Repaid,
	/// Any state this client does not know about.
	#[serde(other)]
	Unknown,
}
impl LoanStatus {
	/// Returns `true` while the loan still blocks a new application.
	pub fn is_active(self) -> bool {
		matches!(self, Self::Pending | Self::Approved | Self::Disbursed)
	}
}

/// Fee quote for a prospective principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct LoanPreview {
	/// Requested principal.
	pub principal: u64,
	/// Flat fee charged on the principal.
	pub fee: u64,
	/// Principal plus fee.
	pub total_repayable: u64,
}

/// A loan as stored by the API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Loan {
	/// Loan identifier.
	pub id: LoanId,
	/// Borrower.
	pub user_id: UserId,
	/// Principal.
	pub amount: u64,
	/// Fee.
	pub fee: u64,
	/// Amount due.
	pub total: u64,
	/// Current state.
	pub status: LoanStatus,
	/// Application time.
	#[serde(deserialize_with = "timestamp::deserialize")]
	pub created_at: OffsetDateTime,
}

/// Every loan of the signed-in account together with the current limit.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoanHistory {
	/// Loans, newest first.
	pub loans: Vec<Loan>,
	/// Largest principal the account may currently borrow.
	pub loan_limit: u64,
}
impl LoanHistory {
	/// Returns the loan that is still outstanding, if any.
	pub fn active_loan(&self) -> Option<&Loan> {
		self.loans.iter().find(|loan| loan.status.is_active())
	}
}

#[derive(Serialize)]
struct PreviewBody {
	principal: u64,
}

#[derive(Serialize)]
struct ApplyBody {
	amount: u64,
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Quotes the fee for borrowing `principal`.
	pub async fn loan_preview(&self, principal: u64) -> Result<LoanPreview> {
		self.request_json(ApiRequest::post("/api/loans/preview").json(&PreviewBody { principal })?)
			.await
	}

	/// Applies for a loan of `amount`.
	pub async fn apply_loan(&self, amount: u64) -> Result<Loan> {
		self.request_json(ApiRequest::post("/api/loans/apply").json(&ApplyBody { amount })?).await
	}

	/// Lists the account's loans.
	pub async fn loan_history(&self) -> Result<LoanHistory> {
		self.request_json(ApiRequest::get("/api/loans/history")).await
	}

	/// Fetches a single loan.
	pub async fn loan(&self, id: LoanId) -> Result<Loan> {
		self.request_json(ApiRequest::get(format!("/api/loans/{id}"))).await
	}
}
