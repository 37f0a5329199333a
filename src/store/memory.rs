//! Thread-safe in-memory [`BrokerStore`] implementation scoped to the process lifetime.

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, CachedToken},
	store::{BrokerStore, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<CacheKey, Arc<CachedToken>>>>;

/// Thread-safe token cache shared by every caller of a broker.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of cached entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Synchronous lookup for diagnostics and tests.
	pub fn get(&self, key: &CacheKey) -> Option<Arc<CachedToken>> {
		self.0.read().get(key).cloned()
	}

	/// Synchronous insert for seeding the cache (e.g. tests, warm starts).
	pub fn insert(&self, key: CacheKey, token: Arc<CachedToken>) {
		self.0.write().insert(key, token);
	}
}
impl BrokerStore for MemoryStore {
	fn save(&self, key: CacheKey, token: Arc<CachedToken>) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, token);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<Arc<CachedToken>>> {
		Box::pin(async move { Ok(self.get(key)) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().clear();

			Ok(())
		})
	}
}
