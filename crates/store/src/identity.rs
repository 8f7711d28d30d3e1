//! Session and personal-entry lookups with a bounded read-through cache.
//!
//! Both maps are LRU-bounded and every value expires after `ttl`, so an
//! out-of-band change (another process, a manual SQL fix) becomes visible
//! within one TTL. Writes made through this process update the cache
//! directly. Misses are cached as well.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::Mutex;
use tokio::time::Instant;
use dex_core::session::{generate_session_token, hash_session_token};
use dex_core::types::{EntryId, UserId};
use dex_db::repositories::{SessionRepo, UserPreferenceRepo};
use dex_db::DbPool;

/// Default number of keys per map.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default time a cached value stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
pub struct IdentityCacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
}

impl Default for IdentityCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

// ---------------------------------------------------------------------------
// TtlLru
// ---------------------------------------------------------------------------

/// An LRU map whose values go stale after a fixed TTL.
pub(crate) struct TtlLru<K: Hash + Eq, V: Clone> {
    entries: LruCache<K, (V, Instant)>,
    ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> TtlLru<K, V> {
    pub(crate) fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Fresh value for `key`, if any. Stale values are evicted.
    pub(crate) fn get(&mut self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some((value, stored_at)) if stored_at.elapsed() < self.ttl => return Some(value.clone()),
            Some(_) => {}
            None => return None,
        }
        self.entries.pop(key);
        None
    }

    pub(crate) fn insert(&mut self, key: K, value: V) {
        self.entries.put(key, (value, Instant::now()));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// IdentityCache
// ---------------------------------------------------------------------------

/// Maps session tokens to users and users to their personal entry.
pub struct IdentityCache {
    pool: DbPool,
    sessions: Mutex<TtlLru<String, Option<UserId>>>,
    personal_entries: Mutex<TtlLru<UserId, Option<EntryId>>>,
}

impl IdentityCache {
    pub fn new(pool: DbPool, config: IdentityCacheConfig) -> Self {
        Self {
            pool,
            sessions: Mutex::new(TtlLru::new(config.capacity, config.ttl)),
            personal_entries: Mutex::new(TtlLru::new(config.capacity, config.ttl)),
        }
    }

    /// Start a session for `user_id` and return its token.
    pub async fn create_session(&self, user_id: UserId) -> Result<String, sqlx::Error> {
        let token = generate_session_token();
        let token_hash = hash_session_token(&token);
        SessionRepo::create(&self.pool, &token_hash, user_id).await?;
        self.sessions.lock().await.insert(token_hash, Some(user_id));
        tracing::info!(user_id, "Session created");
        Ok(token)
    }

    /// The user a session token belongs to.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<UserId>, sqlx::Error> {
        let token_hash = hash_session_token(token);
        if let Some(cached) = self.sessions.lock().await.get(&token_hash) {
            return Ok(cached);
        }

        let user_id = SessionRepo::find_by_token_hash(&self.pool, &token_hash)
            .await?
            .map(|session| session.user_id);
        self.sessions.lock().await.insert(token_hash, user_id);
        Ok(user_id)
    }

    /// Id of the user's designated personal entry.
    pub async fn personal_entry(&self, user_id: UserId) -> Result<Option<EntryId>, sqlx::Error> {
        if let Some(cached) = self.personal_entries.lock().await.get(&user_id) {
            return Ok(cached);
        }

        let entry_id = UserPreferenceRepo::find(&self.pool, user_id)
            .await?
            .and_then(|pref| pref.personal_entry);
        self.personal_entries
            .lock()
            .await
            .insert(user_id, entry_id.clone());
        Ok(entry_id)
    }

    /// Persist a personal-entry assignment and keep the cache coherent.
    pub async fn set_personal_entry(
        &self,
        user_id: UserId,
        entry_id: &str,
    ) -> Result<(), sqlx::Error> {
        UserPreferenceRepo::set_personal_entry(&self.pool, user_id, Some(entry_id)).await?;
        self.personal_entries
            .lock()
            .await
            .insert(user_id, Some(entry_id.to_string()));
        Ok(())
    }
}
