use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use thiserror::Error;

use crate::{
    audit::AuditSink,
    db::{CallLog, CALL_STARTED_DIGIT},
    markup::MarkupRenderer,
    menu::{CatalogError, Digit, MenuCatalog, MenuNode},
    session_store::{SessionStore, StoreError},
};

use super::{CallSession, CallerIdentity, IdentityError, SessionError};

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please call again.";
pub const CALL_START_FAILED_MESSAGE: &str = "An error occurred. Please try again later.";
pub const DIGIT_FAILED_MESSAGE: &str = "An error occurred. Please try again.";

const DEFAULT_AUDIT_TIMEOUT: Duration = Duration::from_secs(2);

/// What the transport should play back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    RenderMenu { node: MenuNode, action_target: String },
    RenderError { reason: String },
}

impl NavigationOutcome {
    pub fn error(reason: &str) -> Self {
        NavigationOutcome::RenderError {
            reason: reason.to_string(),
        }
    }

    pub fn render(&self, renderer: &dyn MarkupRenderer) -> String {
        match self {
            NavigationOutcome::RenderMenu {
                node,
                action_target,
            } => renderer.render(node, action_target),
            NavigationOutcome::RenderError { reason } => renderer.render_error(reason),
        }
    }

    pub fn menu_id(&self) -> Option<&str> {
        match self {
            NavigationOutcome::RenderMenu { node, .. } => Some(node.id.as_str()),
            NavigationOutcome::RenderError { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, NavigationOutcome::RenderMenu { .. })
    }
}

/// Faults inside a navigation step. Logged and turned into
/// [`NavigationOutcome::RenderError`] before leaving the engine.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("invalid caller: {0}")]
    InvalidCaller(#[from] IdentityError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("session points at a menu the catalog no longer has: {0}")]
    UnknownMenu(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives one call through the menu tree, one webhook at a time.
#[derive(Clone)]
pub struct NavigationEngine {
    catalog: Arc<MenuCatalog>,
    store: Arc<dyn SessionStore>,
    audit: Arc<dyn AuditSink>,
    audit_timeout: Duration,
    action_target: String,
}

impl NavigationEngine {
    pub fn new(
        catalog: Arc<MenuCatalog>,
        store: Arc<dyn SessionStore>,
        audit: Arc<dyn AuditSink>,
        action_target: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            store,
            audit,
            audit_timeout: DEFAULT_AUDIT_TIMEOUT,
            action_target: action_target.into(),
        }
    }

    /// Longest a step waits on the audit sink before moving on without it.
    /// Keep it well under the transport's request timeout.
    pub fn with_audit_timeout(mut self, audit_timeout: Duration) -> Self {
        self.audit_timeout = audit_timeout;
        self
    }

    pub async fn handle_call_start(&self, call_id: &str, caller: &str) -> NavigationOutcome {
        match self.start_call(call_id, caller, Utc::now()).await {
            Ok(root) => {
                info!("call {call_id} started at {}", root.id);
                self.menu(root)
            }
            Err(err) => {
                error!("failed to start call {call_id}: {err}");
                NavigationOutcome::error(CALL_START_FAILED_MESSAGE)
            }
        }
    }

    /// `digit` is the raw value from the platform; anything other than a
    /// single accepted key re-prompts the current menu.
    pub async fn handle_digit(&self, call_id: &str, caller: &str, digit: &str) -> NavigationOutcome {
        match self.advance(call_id, caller, digit, Utc::now()).await {
            Ok(Some(node)) => self.menu(node),
            Ok(None) => {
                warn!("no live session for call {call_id}; digit '{digit}' dropped");
                NavigationOutcome::error(SESSION_EXPIRED_MESSAGE)
            }
            Err(err) => {
                error!("failed to process digit '{digit}' for call {call_id}: {err}");
                NavigationOutcome::error(DIGIT_FAILED_MESSAGE)
            }
        }
    }

    pub async fn handle_call_end(&self, call_id: &str) {
        match self.store.remove(call_id).await {
            Ok(()) => info!("call {call_id} ended; session removed"),
            Err(err) => error!("failed to remove session for call {call_id}: {err}"),
        }
    }

    fn menu(&self, node: MenuNode) -> NavigationOutcome {
        NavigationOutcome::RenderMenu {
            node,
            action_target: self.action_target.clone(),
        }
    }

    async fn start_call(
        &self,
        call_id: &str,
        caller: &str,
        now: DateTime<Utc>,
    ) -> Result<MenuNode, NavigationError> {
        let caller = CallerIdentity::parse(caller)?;
        let root = self.catalog.root().clone();
        let session = CallSession::new(call_id, caller, root.clone(), now)?;

        self.store.put(&session).await?;
        self.record(&session, CALL_STARTED_DIGIT, &root, now).await;

        Ok(root)
    }

    /// `Ok(None)` means the session is gone.
    async fn advance(
        &self,
        call_id: &str,
        caller: &str,
        raw_digit: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MenuNode>, NavigationError> {
        let Some(mut session) = self.store.get(call_id).await? else {
            return Ok(None);
        };

        let current = session.current_node()?.clone();
        self.catalog.lookup(&current.id)?;

        match CallerIdentity::parse(caller) {
            Ok(reported) if &reported == session.caller() => {}
            _ => warn!(
                "call {call_id}: webhook caller '{caller}' differs from session caller {}",
                session.caller()
            ),
        }

        let Some(digit) = Digit::parse(raw_digit) else {
            warn!(
                "call {call_id}: ignoring invalid input '{raw_digit}' at {}",
                current.id
            );
            return Ok(Some(current));
        };

        // Explicit transitions win over back, so MAIN can route 4 forward.
        let next = if let Some(target) = self.catalog.next_for(&current.id, digit) {
            session.navigate_to(target.clone(), now);
            target.clone()
        } else if digit.is_back() {
            session.navigate_back(now)?.clone()
        } else {
            if self.catalog.is_terminal(&current.id) {
                info!("call {call_id}: digit {digit} at leaf {}, repeating", current.id);
            } else {
                warn!("call {call_id}: no transition for {digit} at {}, repeating", current.id);
            }
            current
        };

        self.store.put(&session).await?;
        self.record(&session, digit.as_str(), &next, now).await;

        info!(
            "call {call_id}: pressed {digit}, now at {}",
            session.path_string()
        );
        Ok(Some(next))
    }

    async fn record(&self, session: &CallSession, digit: &str, node: &MenuNode, now: DateTime<Utc>) {
        let entry = CallLog::new(
            session.call_id(),
            session.caller(),
            session.path_string(),
            digit,
            &node.id,
            now,
        );

        match tokio::time::timeout(self.audit_timeout, self.audit.record(entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(
                "failed to record audit entry for call {}: {err:#}",
                session.call_id()
            ),
            Err(_) => error!(
                "audit entry for call {} not recorded within {:?}; continuing",
                session.call_id(),
                self.audit_timeout
            ),
        }
    }
}
