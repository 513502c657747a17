//! Application context
//!
//! Bundles the process-wide pieces every surface needs: the API client, the
//! resource cache, the notification sink and the persisted session. It is
//! created once at startup and passed by reference to whatever needs it.

use tracing::debug;

use crate::cache::ResourceCache;
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::ApiResult;
use crate::notify::Notifier;
use crate::session::SessionStore;

/// Shared state for one client session
#[derive(Debug)]
pub struct AppContext {
    config: Config,
    client: ApiClient,
    cache: ResourceCache,
    notifier: Notifier,
    store: SessionStore,
}

impl AppContext {
    /// Build the context and restore a saved session cookie, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is invalid or the session file exists
    /// but cannot be read.
    pub fn init(config: Config, notifier: Notifier) -> ApiResult<Self> {
        let client = ApiClient::new(&config.api_url)?;
        let store = SessionStore::new(config.session_path.clone());

        if let Some(cookies) = store.load()? {
            client.restore_cookies(&cookies);
            debug!("Restored session for {}", client.base_url());
        }

        Ok(Self {
            cache: ResourceCache::new(config.retry_delay),
            config,
            client,
            notifier,
            store,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Whether a session cookie is currently held
    pub fn has_session(&self) -> bool {
        self.client.cookie_header().is_some()
    }

    /// Write the client's current cookies to the session file.
    ///
    /// Does nothing when the jar is empty.
    pub fn persist_session(&self) -> ApiResult<()> {
        match self.client.cookie_header() {
            Some(header) => self.store.save(&header),
            None => {
                debug!("No cookies to persist");
                Ok(())
            }
        }
    }

    /// Drop all session-scoped state: cached resources, the in-memory cookies
    /// and the saved cookie file.
    pub async fn teardown(&self) -> ApiResult<()> {
        self.cache.clear().await;
        self.client.clear_cookies();
        self.store.clear()
    }
}
