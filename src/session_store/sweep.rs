use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::MemorySessionStore;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Periodically evicts expired sessions until cancelled.
pub async fn expiry_sweep(
    store: MemorySessionStore,
    every: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing can have expired yet.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.purge_expired().await;
                if removed > 0 {
                    log_info!("session sweep evicted {} expired sessions", removed);
                } else {
                    log_debug!("session sweep found nothing to evict");
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("session sweep shutting down");
                break;
            }
        }
    }
}

/// Owns the background sweep task for a [`MemorySessionStore`].
#[derive(Default)]
pub struct SweepController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl SweepController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self, store: MemorySessionStore, every: Duration) -> Result<()> {
        if self.handle.is_some() {
            bail!("session sweep already running");
        }
        if every.is_zero() {
            bail!("session sweep interval must be greater than zero");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(expiry_sweep(store, every, cancel_token.clone()));

        log_info!("session sweep started (every {:?})", every);
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("session sweep task failed to join")
        } else {
            Ok(())
        }
    }
}
