//! Cache contract and the built-in in-memory implementation.
//!
//! The broker never holds a store lock across a network call: lookups and writes are short
//! critical sections, so exchanges for different keys proceed independently.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, CachedToken},
};

/// Boxed future returned by [`BrokerStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Token cache contract implemented by broker stores.
///
/// Writes replace whole entries (last writer wins); implementations must be safe for
/// concurrent readers and writers without per-key locking.
pub trait BrokerStore
where
	Self: Send + Sync,
{
	/// Stores `token` under `key`, replacing any previous entry.
	fn save(&self, key: CacheKey, token: Arc<CachedToken>) -> StoreFuture<'_, ()>;

	/// Fetches the entry stored under `key`, if present.
	fn fetch<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<Arc<CachedToken>>>;

	/// Drops every entry.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`BrokerStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
