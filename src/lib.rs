//! Session-aware client for the microloan API: bearer sessions that refresh themselves once,
//! typed loan and payment calls, and pluggable transports and credential stores.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Session,
		config::GatewayConfig,
		gateway::{Gateway, LoginRedirect},
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		store::{MemoryStore, SessionStore},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Login redirect hook that remembers every navigation it was asked to perform.
	#[derive(Debug, Default)]
	pub struct RecordingRedirect(Mutex<Vec<Url>>);
	impl RecordingRedirect {
		/// Returns the recorded navigation targets in call order.
		pub fn targets(&self) -> Vec<Url> {
			self.0.lock().clone()
		}
	}
	impl LoginRedirect for RecordingRedirect {
		fn redirect(&self, target: &Url) {
			self.0.lock().push(target.clone());
		}
	}

	/// Builds a gateway config whose API origin is pinned to `api_origin` (typically the
	/// `httpmock` server) so the localhost heuristic never rewrites it.
	pub fn test_gateway_config(api_origin: &str) -> GatewayConfig {
		let page = Url::parse("https://app.microloan.test/dashboard.html")
			.expect("Failed to parse test page URL.");
		let origin = Url::parse(api_origin).expect("Failed to parse test API origin.");

		GatewayConfig::builder(page)
			.api_origin(origin)
			.build()
			.expect("Failed to build test gateway config.")
	}

	/// Constructs a [`Gateway`] backed by an in-memory store, a recording login redirect, and
	/// the reqwest transport used across integration tests.
	pub fn build_reqwest_test_gateway(
		api_origin: &str,
	) -> (ReqwestTestGateway, Arc<MemoryStore>, Arc<RecordingRedirect>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let redirect = Arc::new(RecordingRedirect::default());
		let gateway = Gateway::with_http_client(
			Session::new(store),
			test_gateway_config(api_origin),
			ReqwestHttpClient::default(),
			ReqwestTransportErrorMapper,
		)
		.with_login_redirect(redirect.clone());

		(gateway, store_backend, redirect)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
