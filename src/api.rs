//! Typed operations for every endpoint of the loan API, layered over [`Gateway::request_json`].
//!
//! [`Gateway::request_json`]: crate::gateway::Gateway::request_json

pub mod auth;
pub mod loans;
pub mod payments;

pub use auth::*;
pub use loans::*;
pub use payments::*;

// self
use crate::_prelude::*;

/// Plain acknowledgement body (`{"message": ...}`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Message {
	/// Server-supplied text.
	pub message: String,
}

/// Server timestamps: RFC 3339, or ISO 8601 without an offset (read as UTC).
pub(crate) mod timestamp {
	// crates.io
	use serde::{Deserializer, de::Error as _};
	use time::{
		PrimitiveDateTime,
		format_description::well_known::{Iso8601, Rfc3339},
	};
	// self
	use crate::_prelude::*;

	pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`")))
	}

	pub(crate) fn parse(raw: &str) -> Option<OffsetDateTime> {
		OffsetDateTime::parse(raw, &Rfc3339)
			.ok()
			.or_else(|| PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).ok().map(|t| t.assume_utc()))
	}

	#[cfg(test)]
	mod tests {
		// crates.io
		use time::macros::datetime;
		// self
		use super::*;

		#[test]
		fn naive_timestamps_are_read_as_utc() {
			assert_eq!(parse("2024-03-01T09:30:00.250000"), Some(datetime!(2024-03-01 09:30:00.25 UTC)));
			assert_eq!(parse("2024-03-01T12:30:00+03:00"), Some(datetime!(2024-03-01 09:30:00 UTC)));
			assert_eq!(parse("yesterday"), None);
		}
	}
}
