//! Keyed, time-limited persistence of call sessions between webhooks.

use async_trait::async_trait;
use thiserror::Error;

use crate::call::CallSession;

pub mod memory;
pub mod sweep;

pub use memory::{ExpiryPolicy, MemorySessionStore};
pub use sweep::SweepController;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize session for call {call_id}: {source}")]
    Serialization {
        call_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored session for call {call_id} is corrupt: {reason}")]
    Corrupt { call_id: String, reason: String },

    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn corrupt(call_id: &str, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            call_id: call_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Storage seam for call sessions. An expired entry is indistinguishable
/// from one that was never stored.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, call_id: &str) -> Result<Option<CallSession>, StoreError>;

    /// Upsert by call id and refresh the entry's sliding window.
    async fn put(&self, session: &CallSession) -> Result<(), StoreError>;

    /// Removing an absent key is not an error.
    async fn remove(&self, call_id: &str) -> Result<(), StoreError>;

    async fn exists(&self, call_id: &str) -> Result<bool, StoreError>;
}
