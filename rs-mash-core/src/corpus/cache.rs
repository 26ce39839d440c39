use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, warn};

use crate::error::{MashError, Result};
use crate::source::{SourceKey, TextSource, TextUnit};

/// Units of one source, shared between the cache and its readers.
pub type Units = Arc<[TextUnit]>;

type SharedFetch = Shared<BoxFuture<'static, Result<Units>>>;

/// State of one key in the cache.
///
/// Failed fetches leave no entry behind, so a later call retries.
enum CacheEntry {
	/// A fetch is in flight. `id` identifies the fetch that owns the entry.
	Pending { id: u64, fetch: SharedFetch },
	Ready(Units),
}

type Entries = Arc<Mutex<HashMap<SourceKey, CacheEntry>>>;

/// Memoizing cache of fetched units, one entry per source key.
///
/// # Guarantees
/// - Single flight: concurrent calls for the same key share one fetch. The
///   lookup and the registration of the pending fetch happen under one lock.
/// - Memoization: a key is never fetched again once its units are cached,
///   even when the cached batch is empty.
/// - A failed (or timed out) fetch evicts its entry; every waiter receives
///   the same error.
///
/// The cache is unbounded and lives as long as its owner. Build one per
/// process (or per test) and share it behind an `Arc`.
pub struct SourceCache<S> {
	source: Arc<S>,
	entries: Entries,
	fetch_timeout: Option<Duration>,
	next_id: AtomicU64,
}

impl<S: TextSource> SourceCache<S> {
	pub fn new(source: S) -> Self {
		Self::with_shared_source(Arc::new(source))
	}

	pub fn with_shared_source(source: Arc<S>) -> Self {
		Self { source, entries: Arc::default(), fetch_timeout: None, next_id: AtomicU64::new(0) }
	}

	/// Fails fetches that take longer than `timeout`.
	pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.fetch_timeout = timeout;
		self
	}

	/// The wrapped source, for uncached calls.
	pub fn source(&self) -> &S {
		&self.source
	}

	/// Returns the units of `key`, fetching at most `max_units` on a miss.
	///
	/// `max_units` only applies to the fetch that fills the entry: a cached
	/// batch is returned as is, whatever size is requested.
	pub async fn get_units(&self, key: &SourceKey, max_units: usize) -> Result<Units> {
		let fetch = {
			let mut entries = lock(&self.entries);
			match entries.get(key) {
				Some(CacheEntry::Ready(units)) => {
					debug!("cache hit for {key} ({} units)", units.len());
					return Ok(Arc::clone(units));
				}
				Some(CacheEntry::Pending { fetch, .. }) => {
					debug!("joining in-flight fetch for {key}");
					fetch.clone()
				}
				None => {
					debug!("cache miss for {key}, fetching {max_units} units");
					let id = self.next_id.fetch_add(1, Ordering::Relaxed);
					let fetch = self.start_fetch(id, key.clone(), max_units);
					entries.insert(key.clone(), CacheEntry::Pending { id, fetch: fetch.clone() });
					fetch
				}
			}
		};
		fetch.await
	}

	/// Builds the shared fetch future. It settles its own entry.
	fn start_fetch(&self, id: u64, key: SourceKey, max_units: usize) -> SharedFetch {
		let source = Arc::clone(&self.source);
		let entries = Arc::clone(&self.entries);
		let timeout = self.fetch_timeout;

		async move {
			let fetched = match timeout {
				Some(limit) => tokio::time::timeout(limit, source.fetch_units(&key, max_units))
					.await
					.unwrap_or_else(|_| Err(MashError::unavailable(&key, format!("fetch timed out after {limit:?}")))),
				None => source.fetch_units(&key, max_units).await,
			};

			let mut entries = lock(&entries);
			let owned = matches!(entries.get(&key), Some(CacheEntry::Pending { id: current, .. }) if *current == id);
			match fetched {
				Ok(units) => {
					let units: Units = units.into();
					if owned {
						entries.insert(key, CacheEntry::Ready(Arc::clone(&units)));
					}
					Ok(units)
				}
				Err(e) => {
					warn!("fetch for {key} failed: {e}");
					if owned {
						entries.remove(&key);
					}
					Err(e)
				}
			}
		}
		.boxed()
		.shared()
	}

	/// Number of keys cached or being fetched.
	pub fn len(&self) -> usize {
		lock(&self.entries).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// True once `key` has been fetched successfully.
	pub fn contains_ready(&self, key: &SourceKey) -> bool {
		matches!(lock(&self.entries).get(key), Some(CacheEntry::Ready(_)))
	}

	/// Drops every entry. In-flight fetches still complete for their
	/// waiters but no longer fill the cache.
	pub fn clear(&self) {
		lock(&self.entries).clear();
	}
}

/// The map stays consistent even if a holder panicked: every critical
/// section is a single insert or remove.
fn lock(entries: &Mutex<HashMap<SourceKey, CacheEntry>>) -> MutexGuard<'_, HashMap<SourceKey, CacheEntry>> {
	entries.lock().unwrap_or_else(PoisonError::into_inner)
}
