//! Resource cache for server reads
//!
//! Caches the three logical resources a screen reads (session user, tree
//! snapshot, referral links). Each key allows at most one fetch in flight:
//! concurrent callers wait on the key's lock and then share the stored
//! result. Every successful fetch bumps the key's version, which the tree
//! renderer uses as its dataset identity.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Node, ReferralLink, SessionUser};

/// Upper bound for a single backoff delay
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Number of retries for reads that allow retrying
const DEFAULT_RETRIES: u32 = 3;

/// Logical name of a cached resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    User,
    Tree,
    ReferralLinks,
}

impl ResourceKey {
    /// Returns the cache key name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKey::User => "user",
            ResourceKey::Tree => "mlm-tree",
            ResourceKey::ReferralLinks => "referral-links",
        }
    }

    /// How many times a failed read of this resource is retried.
    ///
    /// The session identity is never retried so a logged-out user fails fast.
    pub fn retry_limit(&self) -> u32 {
        match self {
            ResourceKey::User => 0,
            ResourceKey::Tree | ResourceKey::ReferralLinks => DEFAULT_RETRIES,
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cached value tagged with the version it was stored under
#[derive(Debug)]
pub struct Versioned<T> {
    /// Monotonic per-key fetch counter, starting at 1
    pub version: u64,
    pub value: Arc<T>,
}

impl<T> Clone for Versioned<T> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            value: Arc::clone(&self.value),
        }
    }
}

/// Cache slot for one resource key
#[derive(Debug)]
pub struct CachedResource<T> {
    key: ResourceKey,
    entry: Mutex<Option<Versioned<T>>>,
    version: AtomicU64,
}

impl<T> CachedResource<T> {
    /// Create an empty slot
    pub fn new(key: ResourceKey) -> Self {
        Self {
            key,
            entry: Mutex::new(None),
            version: AtomicU64::new(0),
        }
    }

    /// The key this slot caches
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    /// Return the cached value, or fetch it if the slot is empty.
    ///
    /// The slot lock is held across the fetch, so a second caller for the
    /// same key waits and receives the first caller's result.
    ///
    /// # Errors
    ///
    /// Returns the last fetch error once retries are exhausted. Failures are
    /// not cached.
    pub async fn get_or_fetch<F, Fut>(&self, retry_delay: Duration, fetch: F) -> ApiResult<Versioned<T>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let mut entry = self.entry.lock().await;
        if let Some(cached) = entry.as_ref() {
            debug!("Cache hit for {} (version {})", self.key, cached.version);
            return Ok(cached.clone());
        }

        let value = fetch_with_retry(self.key, retry_delay, fetch).await?;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Cached {} at version {}", self.key, version);

        let versioned = Versioned {
            version,
            value: Arc::new(value),
        };
        *entry = Some(versioned.clone());
        Ok(versioned)
    }

    /// Drop the cached value; the next read fetches again.
    pub async fn invalidate(&self) {
        *self.entry.lock().await = None;
        debug!("Invalidated {}", self.key);
    }

    /// Whether a value is currently cached
    pub async fn is_cached(&self) -> bool {
        self.entry.lock().await.is_some()
    }
}

/// Run `fetch`, retrying retryable failures with exponential backoff.
async fn fetch_with_retry<T, F, Fut>(key: ResourceKey, base: Duration, fetch: F) -> ApiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut attempt = 0;
    loop {
        match fetch().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < key.retry_limit() && e.is_retryable() => {
                let delay = backoff_delay(base, attempt);
                warn!(
                    "Fetching {} failed (attempt {}): {}; retrying in {:?}",
                    key,
                    attempt + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RETRY_DELAY)
}

/// Cache for all server reads of one session
#[derive(Debug)]
pub struct ResourceCache {
    user: CachedResource<SessionUser>,
    tree: CachedResource<Vec<Node>>,
    referral_links: CachedResource<Vec<ReferralLink>>,
    retry_delay: Duration,
}

impl ResourceCache {
    /// Create an empty cache with the given base retry delay.
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            user: CachedResource::new(ResourceKey::User),
            tree: CachedResource::new(ResourceKey::Tree),
            referral_links: CachedResource::new(ResourceKey::ReferralLinks),
            retry_delay,
        }
    }

    /// The current session user, fetched once.
    pub async fn user(&self, client: &ApiClient) -> ApiResult<Versioned<SessionUser>> {
        self.user
            .get_or_fetch(self.retry_delay, || client.me())
            .await
    }

    /// The placement tree snapshot, fetched once per version.
    pub async fn tree(&self, client: &ApiClient) -> ApiResult<Versioned<Vec<Node>>> {
        self.tree
            .get_or_fetch(self.retry_delay, || client.tree())
            .await
    }

    /// The referral links of the current user.
    pub async fn referral_links(
        &self,
        client: &ApiClient,
    ) -> ApiResult<Versioned<Vec<ReferralLink>>> {
        self.referral_links
            .get_or_fetch(self.retry_delay, || client.referral_links())
            .await
    }

    /// Drop one resource.
    pub async fn invalidate(&self, key: ResourceKey) {
        match key {
            ResourceKey::User => self.user.invalidate().await,
            ResourceKey::Tree => self.tree.invalidate().await,
            ResourceKey::ReferralLinks => self.referral_links.invalidate().await,
        }
    }

    /// Drop every resource (logout).
    pub async fn clear(&self) {
        self.user.invalidate().await;
        self.tree.invalidate().await;
        self.referral_links.invalidate().await;
    }

    /// Whether a resource is currently cached
    pub async fn is_cached(&self, key: ResourceKey) -> bool {
        match key {
            ResourceKey::User => self.user.is_cached().await,
            ResourceKey::Tree => self.tree.is_cached().await,
            ResourceKey::ReferralLinks => self.referral_links.is_cached().await,
        }
    }
}
