use anyhow::Result;
use async_trait::async_trait;

use crate::db::{CallLog, Database};

/// Where interaction records go. Failures are reported to the caller, which
/// decides whether they matter.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: CallLog) -> Result<()>;
}

#[async_trait]
impl AuditSink for Database {
    async fn record(&self, entry: CallLog) -> Result<()> {
        self.insert_call_log(&entry).await
    }
}
