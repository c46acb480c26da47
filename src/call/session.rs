use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::menu::MenuNode;

use super::identity::{CallerIdentity, IdentityError};

pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("navigation stack for call {0} is empty")]
    EmptyStack(String),

    #[error("call {call_id} reports current menu '{reported}' but the stack ends at '{top}'")]
    CurrentMenuMismatch {
        call_id: String,
        reported: String,
        top: String,
    },

    #[error("call {call_id} has '{menu_id}' twice in a row on its navigation stack")]
    AdjacentDuplicate { call_id: String, menu_id: String },

    #[error("navigation stack for call {call_id} starts at '{bottom}', which is not a root menu")]
    RootlessStack { call_id: String, bottom: String },

    #[error("call {call_id}: '{node}' is not a child of '{below}' on the navigation stack")]
    BrokenChain {
        call_id: String,
        node: String,
        below: String,
    },

    #[error("call id must not be empty")]
    EmptyCallId,

    #[error(transparent)]
    InvalidCaller(#[from] IdentityError),
}

/// Persisted form of a [`CallSession`].
///
/// Carries the whole navigation stack so back-navigation survives a trip
/// through the session store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub call_id: String,
    pub caller_identity: String,
    /// Bottom (root) first, current menu last.
    pub navigation_stack: Vec<MenuNode>,
    pub current_menu_id: String,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// Navigation state for one live call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSession {
    call_id: String,
    caller: CallerIdentity,
    stack: Vec<MenuNode>,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl CallSession {
    pub fn new(
        call_id: impl Into<String>,
        caller: CallerIdentity,
        root: MenuNode,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let call_id = call_id.into();
        if call_id.trim().is_empty() {
            return Err(SessionError::EmptyCallId);
        }

        Ok(Self {
            call_id,
            caller,
            stack: vec![root],
            started_at: now,
            last_activity_at: now,
        })
    }

    /// Rebuild a session from its persisted form, checking the stack
    /// invariants instead of trusting the payload.
    pub fn rehydrate(record: SessionRecord) -> Result<Self, SessionError> {
        let SessionRecord {
            call_id,
            caller_identity,
            navigation_stack,
            current_menu_id,
            started_at,
            last_activity_at,
        } = record;

        if call_id.trim().is_empty() {
            return Err(SessionError::EmptyCallId);
        }

        let top = navigation_stack
            .last()
            .ok_or_else(|| SessionError::EmptyStack(call_id.clone()))?;
        if top.id != current_menu_id {
            return Err(SessionError::CurrentMenuMismatch {
                call_id,
                reported: current_menu_id,
                top: top.id.clone(),
            });
        }

        if let Some(pair) = navigation_stack.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(SessionError::AdjacentDuplicate {
                menu_id: pair[0].id.clone(),
                call_id,
            });
        }

        // Non-empty: checked against `current_menu_id` above.
        let bottom = &navigation_stack[0];
        if !bottom.is_root() {
            return Err(SessionError::RootlessStack {
                bottom: bottom.id.clone(),
                call_id,
            });
        }

        if let Some(pair) = navigation_stack
            .windows(2)
            .find(|pair| pair[1].parent_id.as_deref() != Some(pair[0].id.as_str()))
        {
            return Err(SessionError::BrokenChain {
                node: pair[1].id.clone(),
                below: pair[0].id.clone(),
                call_id,
            });
        }

        let caller = CallerIdentity::parse(&caller_identity)?;

        Ok(Self {
            call_id,
            caller,
            stack: navigation_stack,
            started_at,
            last_activity_at,
        })
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            call_id: self.call_id.clone(),
            caller_identity: self.caller.as_str().to_string(),
            navigation_stack: self.stack.clone(),
            current_menu_id: self
                .stack
                .last()
                .map(|node| node.id.clone())
                .unwrap_or_default(),
            started_at: self.started_at,
            last_activity_at: self.last_activity_at,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn caller(&self) -> &CallerIdentity {
        &self.caller
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn stack(&self) -> &[MenuNode] {
        &self.stack
    }

    pub fn current_node(&self) -> Result<&MenuNode, SessionError> {
        self.stack
            .last()
            .ok_or_else(|| SessionError::EmptyStack(self.call_id.clone()))
    }

    /// Push `node` as the new position. The caller is expected to have
    /// validated the move against the catalog.
    pub fn navigate_to(&mut self, node: MenuNode, now: DateTime<Utc>) {
        self.stack.push(node);
        self.last_activity_at = now;
    }

    /// Pop back one level. At the root this is a no-op that returns the root
    /// and leaves `last_activity_at` untouched.
    pub fn navigate_back(&mut self, now: DateTime<Utc>) -> Result<&MenuNode, SessionError> {
        if self.stack.len() > 1 {
            self.stack.pop();
            self.last_activity_at = now;
        }
        self.current_node()
    }

    /// Node ids from the root to the current position.
    pub fn path(&self) -> Vec<&str> {
        self.stack.iter().map(|node| node.id.as_str()).collect()
    }

    pub fn path_string(&self) -> String {
        self.path().join(PATH_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::menu::{Digit, MenuCatalog};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn caller() -> CallerIdentity {
        CallerIdentity::parse("+15551234567").unwrap()
    }

    fn fresh(catalog: &MenuCatalog) -> CallSession {
        CallSession::new("C1", caller(), catalog.root().clone(), t0()).unwrap()
    }

    fn step(catalog: &MenuCatalog, session: &mut CallSession, digit: Digit, now: DateTime<Utc>) {
        let current = session.current_node().unwrap().id.clone();
        let next = catalog.next_for(&current, digit).unwrap().clone();
        session.navigate_to(next, now);
    }

    #[test]
    fn starts_at_root() {
        let catalog = MenuCatalog::standard().unwrap();
        let session = fresh(&catalog);
        assert_eq!(session.depth(), 1);
        assert_eq!(session.current_node().unwrap().id, "MAIN");
        assert_eq!(session.path(), vec!["MAIN"]);
        assert_eq!(session.started_at(), session.last_activity_at());
    }

    #[test]
    fn rejects_blank_call_id() {
        let catalog = MenuCatalog::standard().unwrap();
        let err = CallSession::new(" ", caller(), catalog.root().clone(), t0()).unwrap_err();
        assert_eq!(err, SessionError::EmptyCallId);
    }

    #[test]
    fn path_follows_forward_navigation() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut session = fresh(&catalog);
        step(&catalog, &mut session, Digit::One, t0());
        step(&catalog, &mut session, Digit::Two, t0());
        assert_eq!(session.path(), vec!["MAIN", "SALES", "SALES_ORDERS"]);
        assert_eq!(session.path_string(), "MAIN > SALES > SALES_ORDERS");
        assert_eq!(session.current_node().unwrap().id, "SALES_ORDERS");
    }

    #[test]
    fn back_at_root_is_idempotent() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut session = fresh(&catalog);
        let later = t0() + Duration::seconds(30);
        for _ in 0..5 {
            let node = session.navigate_back(later).unwrap();
            assert_eq!(node.id, "MAIN");
        }
        assert_eq!(session.depth(), 1);
        assert_eq!(session.last_activity_at(), t0());
    }

    #[test]
    fn back_pops_and_touches_activity() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut session = fresh(&catalog);
        step(&catalog, &mut session, Digit::Three, t0() + Duration::seconds(1));
        let later = t0() + Duration::seconds(9);
        let node = session.navigate_back(later).unwrap().clone();
        assert_eq!(node.id, "MAIN");
        assert_eq!(session.depth(), 1);
        assert_eq!(session.last_activity_at(), later);
    }

    #[test]
    fn stack_size_tracks_effective_moves() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut session = fresh(&catalog);
        // forward, forward, back, back, back(no-op), forward
        let script: &[Option<Digit>] = &[
            Some(Digit::Two),
            Some(Digit::One),
            None,
            None,
            None,
            Some(Digit::One),
        ];
        let mut forwards = 0usize;
        let mut effective_backs = 0usize;
        for entry in script {
            match entry {
                Some(digit) => {
                    step(&catalog, &mut session, *digit, t0());
                    forwards += 1;
                }
                None => {
                    if session.depth() > 1 {
                        effective_backs += 1;
                    }
                    session.navigate_back(t0()).unwrap();
                }
            }
            assert_eq!(session.depth(), 1 + forwards - effective_backs);
        }
        assert_eq!(session.path(), vec!["MAIN", "SALES"]);
    }

    #[test]
    fn record_round_trip_keeps_full_stack() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut session = fresh(&catalog);
        step(&catalog, &mut session, Digit::One, t0() + Duration::seconds(2));
        step(&catalog, &mut session, Digit::Three, t0() + Duration::seconds(4));

        let json = serde_json::to_string(&session.to_record()).unwrap();
        let record: SessionRecord = serde_json::from_str(&json).unwrap();
        let restored = CallSession::rehydrate(record).unwrap();

        assert_eq!(restored, session);
        assert_eq!(restored.depth(), 3);
        let levels: Vec<_> = restored.stack().iter().map(|n| n.level).collect();
        let original_levels: Vec<_> = session.stack().iter().map(|n| n.level).collect();
        assert_eq!(levels, original_levels);
        assert_eq!(restored.started_at(), t0());
        assert_eq!(restored.last_activity_at(), t0() + Duration::seconds(4));
    }

    #[test]
    fn record_uses_camel_case_wire_names() {
        let catalog = MenuCatalog::standard().unwrap();
        let session = fresh(&catalog);
        let value = serde_json::to_value(session.to_record()).unwrap();
        assert_eq!(value["callId"], "C1");
        assert_eq!(value["callerIdentity"], "+15551234567");
        assert_eq!(value["currentMenuId"], "MAIN");
        assert!(value["navigationStack"].is_array());
        assert!(value["startedAt"].is_string());
        assert!(value["lastActivityAt"].is_string());
    }

    #[test]
    fn rehydrate_rejects_empty_stack() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut record = fresh(&catalog).to_record();
        record.navigation_stack.clear();
        assert_eq!(
            CallSession::rehydrate(record),
            Err(SessionError::EmptyStack("C1".into()))
        );
    }

    #[test]
    fn rehydrate_rejects_mismatched_current_menu() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut record = fresh(&catalog).to_record();
        record.current_menu_id = "SALES".into();
        assert!(matches!(
            CallSession::rehydrate(record),
            Err(SessionError::CurrentMenuMismatch { .. })
        ));
    }

    #[test]
    fn rehydrate_rejects_adjacent_duplicates() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut record = fresh(&catalog).to_record();
        record.navigation_stack.push(catalog.root().clone());
        assert!(matches!(
            CallSession::rehydrate(record),
            Err(SessionError::AdjacentDuplicate { .. })
        ));
    }

    #[test]
    fn rehydrate_rejects_stack_without_root_at_bottom() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut record = fresh(&catalog).to_record();
        record.navigation_stack = vec![
            catalog.lookup("SALES").unwrap().clone(),
            catalog.lookup("SALES_ORDERS").unwrap().clone(),
        ];
        record.current_menu_id = "SALES_ORDERS".into();
        assert_eq!(
            CallSession::rehydrate(record),
            Err(SessionError::RootlessStack {
                call_id: "C1".into(),
                bottom: "SALES".into(),
            })
        );
    }

    #[test]
    fn rehydrate_rejects_nodes_out_of_parent_order() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut record = fresh(&catalog).to_record();
        record.navigation_stack.push(catalog.lookup("SUPPORT").unwrap().clone());
        record.navigation_stack.push(catalog.lookup("BILLING_INVOICE").unwrap().clone());
        record.current_menu_id = "BILLING_INVOICE".into();
        assert_eq!(
            CallSession::rehydrate(record),
            Err(SessionError::BrokenChain {
                call_id: "C1".into(),
                node: "BILLING_INVOICE".into(),
                below: "SUPPORT".into(),
            })
        );
    }

    #[test]
    fn rehydrate_rejects_bad_caller() {
        let catalog = MenuCatalog::standard().unwrap();
        let mut record = fresh(&catalog).to_record();
        record.caller_identity = "12".into();
        assert!(matches!(
            CallSession::rehydrate(record),
            Err(SessionError::InvalidCaller(_))
        ));
    }
}
