//! OAuth 2.0 token broker for load-generation style workloads: acquire client-credentials and
//! password-grant tokens, cache them per credential identity, renew them ahead of expiry, and
//! attach them to outbound requests from many concurrent callers sharing one cache.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::config::{CredentialConfig, CredentialConfigBuilder, GrantType};
	#[cfg(feature = "reqwest")]
	use crate::{
		flows::Broker,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		store::{BrokerStore, MemoryStore},
	};

	/// Broker type alias used by reqwest-backed integration tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`Broker`] backed by an in-memory store and the reqwest transport used
	/// across integration tests.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_broker() -> (ReqwestTestBroker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn BrokerStore> = store_backend.clone();
		let broker = Broker::with_http_client(
			store,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(broker, store_backend)
	}

	/// Returns an enabled configuration builder pointed at `token_endpoint`.
	pub fn enabled_config_builder(
		token_endpoint: &str,
		client_id: &str,
		client_secret: &str,
		scope: &str,
	) -> CredentialConfigBuilder {
		CredentialConfig::builder()
			.enabled(true)
			.token_endpoint(
				Url::parse(token_endpoint).expect("Test token endpoint should be a valid URL."),
			)
			.client_id(client_id)
			.client_secret(client_secret)
			.scope(scope)
			.grant_type(GrantType::ClientCredentials)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
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
