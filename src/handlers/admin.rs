use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppResult;
use crate::handlers::{now, viewer_from_headers};
use crate::models::calendar::parse_date_input;
use crate::models::{
    BlockedDate, Booking, BookingTimeRule, DayType, RuleInput, SettingsPatch, SystemSettings,
};
use crate::services::blocked_dates::{self, NewBlockedDate};
use crate::services::{approval, settings, time_rules};
use crate::state::AppState;

// GET /api/admin/approvals
pub async fn list_approvals(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<Booking>>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    Ok(Json(approval::list_pending_approvals(&db, &viewer)?))
}

// POST /api/admin/bookings/:id/approve
pub async fn approve_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<Booking>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    Ok(Json(approval::approve(&db, &viewer, &id, &now())?))
}

// POST /api/admin/bookings/:id/reject
#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

pub async fn reject_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<RejectRequest>,
) -> AppResult<Json<Booking>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    Ok(Json(approval::reject(&db, &viewer, &id, &body.reason, &now())?))
}

// GET /api/admin/rules
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<BTreeMap<&'static str, Vec<BookingTimeRule>>>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let rules = {
        let db = state.db()?;
        time_rules::list_rules(&db, &viewer)?
    };

    let mut grouped: BTreeMap<&'static str, Vec<BookingTimeRule>> = DayType::ALL
        .iter()
        .map(|d| (d.as_str(), vec![]))
        .collect();
    for rule in rules {
        grouped.entry(rule.day_type.as_str()).or_default().push(rule);
    }
    for group in grouped.values_mut() {
        group.sort_by_key(|r| r.start_time);
    }
    Ok(Json(grouped))
}

// POST /api/admin/rules
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RuleInput>,
) -> AppResult<(StatusCode, Json<BookingTimeRule>)> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    let rule = time_rules::create_rule(&db, &viewer, body)?;
    Ok((StatusCode::CREATED, Json(rule)))
}

// PUT /api/admin/rules/:id
pub async fn update_rule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<RuleInput>,
) -> AppResult<Json<BookingTimeRule>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    Ok(Json(time_rules::update_rule(&db, &viewer, id, body)?))
}

// DELETE /api/admin/rules/:id
pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    time_rules::delete_rule(&db, &viewer, id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

// PUT /api/admin/rules/day-type/:day_type
pub async fn replace_rules(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(day_type): Path<String>,
    Json(body): Json<Vec<RuleInput>>,
) -> AppResult<Json<Vec<BookingTimeRule>>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let day_type = DayType::parse(&day_type)?;
    let db = state.db()?;
    Ok(Json(time_rules::replace_rules(&db, &viewer, day_type, body)?))
}

// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<SystemSettings>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    Ok(Json(settings::get_settings(&db, &viewer)?))
}

// POST /api/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SettingsPatch>,
) -> AppResult<Json<SystemSettings>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    Ok(Json(settings::update_settings(&db, &viewer, body)?))
}

// GET /api/admin/blocked-dates?from=
#[derive(Deserialize)]
pub struct BlockedQuery {
    pub from: Option<String>,
}

pub async fn list_blocked_dates(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BlockedQuery>,
) -> AppResult<Json<Vec<BlockedDate>>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let from = match query.from.as_deref() {
        Some(raw) => parse_date_input(raw)?,
        None => now().date(),
    };
    let db = state.db()?;
    Ok(Json(blocked_dates::list_blocked_dates(&db, &viewer, &from)?))
}

// POST /api/admin/blocked-dates
pub async fn create_blocked_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewBlockedDate>,
) -> AppResult<(StatusCode, Json<BlockedDate>)> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    let blocked = blocked_dates::create_blocked_date(&db, &viewer, body)?;
    Ok((StatusCode::CREATED, Json(blocked)))
}

// DELETE /api/admin/blocked-dates/:id
pub async fn delete_blocked_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    blocked_dates::delete_blocked_date(&db, &viewer, id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
