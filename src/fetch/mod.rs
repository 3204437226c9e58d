//! Remote markdown retrieval with a revalidation window.
//!
//! [`Fetcher`] builds the raw URL for a document, consults its cache, and
//! otherwise asks a [`Transport`] for the body. Entries younger than the TTL
//! are served without touching the network; failures are never cached and
//! never retried.

mod transport;

pub use transport::{HttpTransport, Transport};

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::site::Site;

/// Default revalidation window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Why a document could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("unreadable response body: {0}")]
    Body(String),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

/// Fetches documents from the two raw content bases of a site.
pub struct Fetcher<T: Transport> {
    transport: T,
    root_base: String,
    docs_base: String,
    ttl: Duration,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl<T: Transport> Fetcher<T> {
    /// Create a fetcher for the given raw bases.
    pub fn new(transport: T, root_base: &str, docs_base: &str) -> Self {
        Self {
            transport,
            root_base: root_base.trim_end_matches('/').to_string(),
            docs_base: docs_base.trim_end_matches('/').to_string(),
            ttl: DEFAULT_TTL,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Create a fetcher for a site's repository.
    pub fn for_site(transport: T, site: &Site) -> Self {
        Self::new(transport, &site.raw_base, &site.docs_raw_base())
    }

    /// Set the revalidation window.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Fully qualified URL for a document path.
    pub fn url_for(&self, path: &str, is_root: bool) -> String {
        let base = if is_root {
            &self.root_base
        } else {
            &self.docs_base
        };
        format!("{base}/{}", path.trim_start_matches('/'))
    }

    /// Retrieve the text of `path`.
    ///
    /// # Errors
    /// Returns a [`FetchError`] for network failures, non-success statuses and
    /// unreadable bodies. A failed attempt is final for this call.
    pub fn fetch(&self, path: &str, is_root: bool) -> Result<String, FetchError> {
        self.fetch_at(path, is_root, Instant::now())
    }

    /// Like [`Fetcher::fetch`], evaluating freshness at `now`.
    ///
    /// # Errors
    /// See [`Fetcher::fetch`].
    pub fn fetch_at(&self, path: &str, is_root: bool, now: Instant) -> Result<String, FetchError> {
        let url = self.url_for(path, is_root);

        if let Some(text) = self.cached(&url, now) {
            tracing::debug!(%url, "serving document from cache");
            return Ok(text);
        }

        tracing::debug!(%url, "fetching document");
        match self.transport.get(&url) {
            Ok(text) => {
                self.store(url, text.clone(), now);
                Ok(text)
            }
            Err(err) => {
                tracing::warn!(%url, error = %err, "failed to fetch markdown");
                Err(err)
            }
        }
    }

    /// Drop every cached entry.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    fn cached(&self, url: &str, now: Instant) -> Option<String> {
        let cache = self.lock_cache();
        cache
            .get(url)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.text.clone())
    }

    fn store(&self, url: String, text: String, now: Instant) {
        let entry = CacheEntry {
            text,
            fetched_at: now,
            ttl: self.ttl,
        };
        self.lock_cache().insert(url, entry);
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport returning canned bodies and counting requests.
    #[derive(Default)]
    pub(crate) struct StubTransport {
        pub(crate) bodies: HashMap<String, Result<String, FetchError>>,
        pub(crate) calls: AtomicUsize,
    }

    impl StubTransport {
        pub(crate) fn with(mut self, url: &str, body: Result<&str, FetchError>) -> Self {
            self.bodies
                .insert(url.to_string(), body.map(str::to_string));
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Transport for StubTransport {
        fn get(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::Status(404)))
        }
    }

    const ROOT: &str = "https://raw.example.com/repo/main";
    const DOCS: &str = "https://raw.example.com/repo/main/doc";

    fn fetcher() -> Fetcher<StubTransport> {
        let transport = StubTransport::default()
            .with(&format!("{DOCS}/usage.md"), Ok("# Usage"))
            .with(&format!("{ROOT}/README.md"), Ok("# Readme"))
            .with(&format!("{DOCS}/broken.md"), Err(FetchError::Status(500)));
        Fetcher::new(transport, ROOT, DOCS)
    }

    #[test]
    fn test_url_depends_on_root_flag() {
        let f = fetcher();
        assert_eq!(f.url_for("README.md", true), format!("{ROOT}/README.md"));
        assert_eq!(f.url_for("usage.md", false), format!("{DOCS}/usage.md"));
    }

    #[test]
    fn test_fetch_returns_body() {
        let f = fetcher();
        assert_eq!(f.fetch("README.md", true).unwrap(), "# Readme");
        assert_eq!(f.fetch("usage.md", false).unwrap(), "# Usage");
    }

    #[test]
    fn test_second_fetch_within_window_uses_cache() {
        let f = fetcher();
        let first = f.fetch("usage.md", false).unwrap();
        let second = f.fetch("usage.md", false).unwrap();
        assert_eq!(first, second);
        assert_eq!(f.transport().calls(), 1);
    }

    #[test]
    fn test_stale_entry_is_refetched() {
        let f = fetcher().with_ttl(Duration::from_secs(300));
        let start = Instant::now();
        f.fetch_at("usage.md", false, start).unwrap();
        f.fetch_at("usage.md", false, start + Duration::from_secs(299))
            .unwrap();
        assert_eq!(f.transport().calls(), 1);
        f.fetch_at("usage.md", false, start + Duration::from_secs(300))
            .unwrap();
        assert_eq!(f.transport().calls(), 2);
    }

    #[test]
    fn test_zero_ttl_never_caches() {
        let f = fetcher().with_ttl(Duration::ZERO);
        f.fetch("usage.md", false).unwrap();
        f.fetch("usage.md", false).unwrap();
        assert_eq!(f.transport().calls(), 2);
    }

    #[test]
    fn test_root_and_docs_paths_cached_separately() {
        let f = fetcher();
        assert!(f.fetch("usage.md", true).is_err());
        assert_eq!(f.fetch("usage.md", false).unwrap(), "# Usage");
        assert_eq!(f.transport().calls(), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let f = fetcher();
        assert_eq!(f.fetch("broken.md", false), Err(FetchError::Status(500)));
        assert_eq!(f.fetch("broken.md", false), Err(FetchError::Status(500)));
        assert_eq!(f.transport().calls(), 2);
    }

    #[test]
    fn test_clear_cache_forces_refetch() {
        let f = fetcher();
        f.fetch("usage.md", false).unwrap();
        f.clear_cache();
        f.fetch("usage.md", false).unwrap();
        assert_eq!(f.transport().calls(), 2);
    }
}
