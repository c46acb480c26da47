use std::future::Future;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use log::{error, info, warn};
use serde::Deserialize;

use crate::AppState;

use super::controller::{NavigationOutcome, CALL_START_FAILED_MESSAGE, DIGIT_FAILED_MESSAGE};

/// Statuses after which the platform sends nothing more for a call.
const FINAL_CALL_STATUSES: &[&str] = &["completed", "busy", "no-answer", "canceled", "failed"];

/// Form fields the telephony platform posts. Absent fields come through
/// empty so validation can answer with a 400 instead of a rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CallWebhook {
    pub call_sid: String,
    pub from: String,
    pub digits: Option<String>,
    pub call_status: Option<String>,
}

impl CallWebhook {
    fn has_identity(&self) -> bool {
        !self.call_sid.trim().is_empty() && !self.from.trim().is_empty()
    }
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "CallSid and From are required").into_response()
}

async fn bounded<F>(state: &AppState, call_id: &str, fallback: &str, step: F) -> NavigationOutcome
where
    F: Future<Output = NavigationOutcome>,
{
    match tokio::time::timeout(state.request_timeout, step).await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(
                "call {call_id}: navigation exceeded {:?}, answering with error markup",
                state.request_timeout
            );
            NavigationOutcome::error(fallback)
        }
    }
}

pub async fn incoming_call(State(state): State<AppState>, Form(hook): Form<CallWebhook>) -> Response {
    info!("incoming call {} from {}", hook.call_sid, hook.from);
    if !hook.has_identity() {
        warn!("incoming call webhook missing CallSid or From");
        return bad_request();
    }

    let outcome = bounded(
        &state,
        &hook.call_sid,
        CALL_START_FAILED_MESSAGE,
        state.engine.handle_call_start(&hook.call_sid, &hook.from),
    )
    .await;
    xml(outcome.render(state.renderer.as_ref()))
}

pub async fn menu_selection(State(state): State<AppState>, Form(hook): Form<CallWebhook>) -> Response {
    let digits = hook.digits.as_deref().unwrap_or_default();
    info!("call {} pressed '{digits}'", hook.call_sid);
    if !hook.has_identity() {
        warn!("menu webhook missing CallSid or From");
        return bad_request();
    }

    let outcome = bounded(
        &state,
        &hook.call_sid,
        DIGIT_FAILED_MESSAGE,
        state.engine.handle_digit(&hook.call_sid, &hook.from, digits),
    )
    .await;
    xml(outcome.render(state.renderer.as_ref()))
}

pub async fn call_status(State(state): State<AppState>, Form(hook): Form<CallWebhook>) -> StatusCode {
    let status = hook.call_status.as_deref().unwrap_or_default();
    info!("call {} status {status}", hook.call_sid);

    if hook.call_sid.trim().is_empty() || !FINAL_CALL_STATUSES.contains(&status) {
        return StatusCode::OK;
    }

    if tokio::time::timeout(state.request_timeout, state.engine.handle_call_end(&hook.call_sid))
        .await
        .is_err()
    {
        error!("call {}: session cleanup timed out", hook.call_sid);
    }
    StatusCode::OK
}
