use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use log::{error, info};
use serde::Deserialize;

use crate::{
    db::{CallLog, CallLogPage},
    AppState,
};

const DEFAULT_TAKE: usize = 50;
const MAX_TAKE: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub take: Option<i64>,
}

impl PageQuery {
    /// Negative skips start at the beginning; takes outside 1..=100 fall
    /// back to the default page size.
    pub fn normalized(&self) -> (usize, usize) {
        let skip = self
            .skip
            .and_then(|skip| usize::try_from(skip).ok())
            .unwrap_or(0);
        let take = self
            .take
            .and_then(|take| usize::try_from(take).ok())
            .filter(|take| (1..=MAX_TAKE).contains(take))
            .unwrap_or(DEFAULT_TAKE);
        (skip, take)
    }
}

pub async fn list_call_logs(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CallLogPage>, StatusCode> {
    let (skip, take) = query.normalized();
    state
        .db
        .call_log_page(skip, take)
        .await
        .map(Json)
        .map_err(|err| {
            error!("failed to list call logs (skip {skip}, take {take}): {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

pub async fn call_logs_for_call(
    State(state): State<AppState>,
    Path(call_sid): Path<String>,
) -> Result<Json<Vec<CallLog>>, StatusCode> {
    info!("retrieving call logs for call {call_sid}");
    let logs = state.db.call_logs_for_call(&call_sid).await.map_err(|err| {
        error!("failed to load call logs for call {call_sid}: {err:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if logs.is_empty() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(logs))
}

pub async fn call_logs_for_caller(
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<Json<Vec<CallLog>>, StatusCode> {
    info!("retrieving call logs for caller {phone}");
    state
        .db
        .call_logs_for_caller(&phone)
        .await
        .map(Json)
        .map_err(|err| {
            error!("failed to load call logs for caller {phone}: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
