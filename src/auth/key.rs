//! Cache identity derived from a credential configuration.

// std
use std::sync::OnceLock;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, config::CredentialConfig};

/// Identity under which a token is cached: `(token_endpoint, client_id, scope)`.
///
/// Grant type and secrets are not part of the key, so a client-credentials and a password
/// configuration sharing endpoint, client and scope resolve to the same entry.
#[derive(Clone)]
pub struct CacheKey {
	token_endpoint: String,
	client_id: String,
	scope: String,
	fingerprint_cache: OnceLock<String>,
}
impl CacheKey {
	/// Builds a key from its three components.
	pub fn new(token_endpoint: &Url, client_id: impl Into<String>, scope: impl Into<String>) -> Self {
		Self {
			token_endpoint: token_endpoint.to_string(),
			client_id: client_id.into(),
			scope: scope.into(),
			fingerprint_cache: OnceLock::new(),
		}
	}

	/// Derives the key for `config`; `None` when no token endpoint is configured.
	pub fn from_config(config: &CredentialConfig) -> Option<Self> {
		config
			.token_endpoint()
			.map(|endpoint| Self::new(endpoint, config.client_id(), config.scope()))
	}

	/// Token endpoint component.
	pub fn token_endpoint(&self) -> &str {
		&self.token_endpoint
	}

	/// Client identifier component.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Raw scope component.
	pub fn scope(&self) -> &str {
		&self.scope
	}

	/// Stable label for logs and metrics.
	///
	/// Base64 (no padding) SHA-256 digest of the `endpoint:client_id:scope` form, computed once.
	pub fn fingerprint(&self) -> &str {
		self.fingerprint_cache.get_or_init(|| {
			let mut hasher = Sha256::new();

			hasher.update(self.to_string().as_bytes());

			STANDARD_NO_PAD.encode(hasher.finalize())
		})
	}
}
impl PartialEq for CacheKey {
	fn eq(&self, other: &Self) -> bool {
		self.token_endpoint == other.token_endpoint
			&& self.client_id == other.client_id
			&& self.scope == other.scope
	}
}
impl Eq for CacheKey {}
impl Hash for CacheKey {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.token_endpoint.hash(state);
		self.client_id.hash(state);
		self.scope.hash(state);
	}
}
impl Debug for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CacheKey")
			.field("token_endpoint", &self.token_endpoint)
			.field("client_id", &self.client_id)
			.field("scope", &self.scope)
			.finish()
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}:{}:{}", self.token_endpoint, self.client_id, self.scope)
	}
}
