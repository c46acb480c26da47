use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use log::debug;
use tokio::{sync::RwLock, time::Instant};

use crate::call::{CallSession, SessionRecord};

use super::{SessionStore, StoreError};

const DEFAULT_SLIDING: Duration = Duration::from_secs(30 * 60);
const DEFAULT_ABSOLUTE: Duration = Duration::from_secs(60 * 60);

/// Whichever window elapses first evicts the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Idle time allowed since the last `put`.
    pub sliding: Duration,
    /// Hard ceiling measured from the first `put`.
    pub absolute: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            sliding: DEFAULT_SLIDING,
            absolute: DEFAULT_ABSOLUTE,
        }
    }
}

impl ExpiryPolicy {
    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.refreshed_at) >= self.sliding
            || now.saturating_duration_since(entry.inserted_at) >= self.absolute
    }
}

struct Entry {
    payload: String,
    inserted_at: Instant,
    refreshed_at: Instant,
}

/// In-process session store.
///
/// Entries are held in their serialized JSON form so every read goes through
/// the same rehydration path a remote cache would. Timestamps come from the
/// monotonic tokio clock.
#[derive(Clone)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    policy: ExpiryPolicy,
}

impl MemorySessionStore {
    pub fn new(policy: ExpiryPolicy) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    /// Number of entries that have not yet expired.
    pub async fn live_count(&self) -> usize {
        let now = Instant::now();
        let guard = self.entries.read().await;
        guard
            .values()
            .filter(|entry| !self.policy.is_expired(entry, now))
            .count()
    }

    /// Drop every expired entry and report how many went.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.entries.write().await;
        let before = guard.len();
        guard.retain(|_, entry| !self.policy.is_expired(entry, now));
        before - guard.len()
    }

    /// Returns the payload of a live entry, evicting it if it has expired.
    async fn live_payload(&self, call_id: &str) -> Option<String> {
        let now = Instant::now();
        {
            let guard = self.entries.read().await;
            match guard.get(call_id) {
                None => return None,
                Some(entry) if !self.policy.is_expired(entry, now) => {
                    return Some(entry.payload.clone())
                }
                Some(_) => {}
            }
        }

        let mut guard = self.entries.write().await;
        // Another writer may have refreshed the entry in between.
        let still_expired = guard
            .get(call_id)
            .map(|entry| self.policy.is_expired(entry, now))
            .unwrap_or(false);
        if still_expired {
            guard.remove(call_id);
            debug!("Evicted expired session for call {call_id} on read");
            return None;
        }
        guard.get(call_id).map(|entry| entry.payload.clone())
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(ExpiryPolicy::default())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, call_id: &str) -> Result<Option<CallSession>, StoreError> {
        let payload = match self.live_payload(call_id).await {
            Some(payload) => payload,
            None => return Ok(None),
        };

        let record: SessionRecord = serde_json::from_str(&payload)
            .map_err(|err| StoreError::corrupt(call_id, err))?;
        let session =
            CallSession::rehydrate(record).map_err(|err| StoreError::corrupt(call_id, err))?;

        Ok(Some(session))
    }

    async fn put(&self, session: &CallSession) -> Result<(), StoreError> {
        let payload =
            serde_json::to_string(&session.to_record()).map_err(|source| {
                StoreError::Serialization {
                    call_id: session.call_id().to_string(),
                    source,
                }
            })?;

        let now = Instant::now();
        let mut guard = self.entries.write().await;
        if let Some(entry) = guard
            .get_mut(session.call_id())
            .filter(|entry| !self.policy.is_expired(entry, now))
        {
            entry.payload = payload;
            entry.refreshed_at = now;
            return Ok(());
        }

        // New key, or an expired one: the absolute ceiling starts over.
        guard.insert(
            session.call_id().to_string(),
            Entry {
                payload,
                inserted_at: now,
                refreshed_at: now,
            },
        );
        Ok(())
    }

    async fn remove(&self, call_id: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(call_id);
        Ok(())
    }

    async fn exists(&self, call_id: &str) -> Result<bool, StoreError> {
        Ok(self.live_payload(call_id).await.is_some())
    }
}
