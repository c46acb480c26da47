//! Audit trail of caller interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::call::CallerIdentity;

/// `digit_pressed` value recorded when a call first arrives.
pub const CALL_STARTED_DIGIT: &str = "INCOMING";

/// One caller interaction: where they were, what they pressed, where they
/// ended up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    pub id: Uuid,
    pub call_id: String,
    pub caller_number: String,
    /// Root-to-current menu ids joined with `" > "`.
    pub menu_path: String,
    pub digit_pressed: String,
    pub current_menu_id: String,
    pub timestamp: DateTime<Utc>,
}

impl CallLog {
    pub fn new(
        call_id: &str,
        caller: &CallerIdentity,
        menu_path: String,
        digit_pressed: &str,
        current_menu_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            call_id: call_id.to_string(),
            caller_number: caller.as_str().to_string(),
            menu_path,
            digit_pressed: digit_pressed.to_string(),
            current_menu_id: current_menu_id.to_string(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogPage {
    pub call_logs: Vec<CallLog>,
    pub total_count: u64,
    pub skip: usize,
    pub take: usize,
}
