//! Handlers for the event, segmentation, and retrieval endpoints.
//!
//! Request DTOs reject unknown fields so that typos fail loudly instead of
//! being silently ignored. Domain errors from the memory core are mapped via
//! `ApiError`: duplicates become 409, everything else 400.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::body_rejection;
use crate::core::errors::ApiError;
use crate::memory::{build_events, Event, MemoryError, SegmentParams};
use crate::state::AppState;

const MAX_SEGMENT_SURPRISE_VALUES: usize = 8192;
const MAX_RETRIEVE_ANCHOR_EVENT_IDS: usize = 256;
const MAX_RETRIEVE_TOP_K: i64 = 256;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    tenant_id: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentRequest {
    tenant_id: String,
    session_id: String,
    #[serde(default)]
    start_token: i64,
    #[serde(default)]
    surprise: Vec<f64>,
    key_similarity: Vec<Vec<f64>>,
    #[serde(default)]
    threshold: f64,
    #[serde(default)]
    min_boundary_gap: i64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    event_id_prefix: String,
}

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    boundaries: Vec<i64>,
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrieveRequest {
    tenant_id: String,
    session_id: String,
    #[serde(default)]
    event_ids: Vec<String>,
    #[serde(default)]
    top_k: i64,
    #[serde(default)]
    buffer_before: i64,
    #[serde(default)]
    buffer_after: i64,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    events: Vec<Event>,
}

/// `POST /v1/events`: stores one caller-constructed event.
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<Event>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(event) = payload.map_err(body_rejection)?;

    state.store.append(event.clone())?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /v1/events`: lists one partition in span order.
pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<ListEventsQuery>, QueryRejection>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let Query(query) = query.map_err(|_| missing_partition_query())?;
    if query.tenant_id.trim().is_empty() || query.session_id.trim().is_empty() {
        return Err(missing_partition_query());
    }

    Ok(Json(
        state
            .store
            .list_by_session(&query.tenant_id, &query.session_id),
    ))
}

/// `POST /v1/segment`: segments a surprise window and stores the resulting
/// events atomically.
pub async fn segment(
    State(state): State<AppState>,
    payload: Result<Json<SegmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(body_rejection)?;

    if body.surprise.len() > MAX_SEGMENT_SURPRISE_VALUES {
        return Err(ApiError::BadRequest(format!(
            "surprise must contain at most {MAX_SEGMENT_SURPRISE_VALUES} values"
        )));
    }

    let min_boundary_gap = usize::try_from(body.min_boundary_gap)
        .map_err(|_| MemoryError::InvalidMinBoundaryGap)?;

    let outcome = build_events(&SegmentParams {
        tenant_id: &body.tenant_id,
        session_id: &body.session_id,
        start_token: body.start_token,
        surprise: &body.surprise,
        key_similarity: &body.key_similarity,
        threshold: body.threshold,
        min_boundary_gap,
        created_at: body.created_at,
        event_id_prefix: &body.event_id_prefix,
    })?;

    state.store.append_many(outcome.events.clone())?;

    Ok((
        StatusCode::CREATED,
        Json(SegmentResponse {
            boundaries: outcome.boundaries,
            events: outcome.events,
        }),
    ))
}

/// `POST /v1/retrieve`: anchor-neighborhood retrieval over one partition.
pub async fn retrieve(
    State(state): State<AppState>,
    payload: Result<Json<RetrieveRequest>, JsonRejection>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let Json(body) = payload.map_err(body_rejection)?;

    if body.tenant_id.trim().is_empty() || body.session_id.trim().is_empty() {
        return Err(missing_partition_query());
    }
    if body.event_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "event_ids must contain at least one event id".to_string(),
        ));
    }
    if body.event_ids.len() > MAX_RETRIEVE_ANCHOR_EVENT_IDS {
        return Err(ApiError::BadRequest(format!(
            "event_ids must contain at most {MAX_RETRIEVE_ANCHOR_EVENT_IDS} items"
        )));
    }
    if body.top_k > MAX_RETRIEVE_TOP_K {
        return Err(ApiError::BadRequest(format!(
            "top_k must be at most {MAX_RETRIEVE_TOP_K}"
        )));
    }
    if body.event_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "event_ids must not contain empty values".to_string(),
        ));
    }

    let events = state.store.retrieve_by_anchors(
        &body.tenant_id,
        &body.session_id,
        &body.event_ids,
        body.top_k,
        body.buffer_before,
        body.buffer_after,
    )?;

    Ok(Json(RetrieveResponse { events }))
}

fn missing_partition_query() -> ApiError {
    ApiError::BadRequest("tenant_id and session_id are required".to_string())
}
