use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::errors::AppResult;
use crate::handlers::{now, viewer_from_headers};
use crate::models::Holiday;
use crate::services::holidays::{self, HolidayPatch, NewHoliday};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

// GET /api/holidays?year=
pub async fn list_holidays(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<Vec<Holiday>>> {
    viewer_from_headers(&headers, &state.config.admin_token)?;
    let now = now();
    let year = query.year.unwrap_or_else(|| now.year());
    if let (Some(first), Some(last)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        holidays::ensure_official_holidays(&state, &first, &last, now).await;
    }

    let db = state.db()?;
    Ok(Json(holidays::list_holidays(&db, year)?))
}

// POST /api/holidays
pub async fn create_holiday(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewHoliday>,
) -> AppResult<(StatusCode, Json<Holiday>)> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    let holiday = holidays::create_holiday(&db, &viewer, body)?;
    Ok((StatusCode::CREATED, Json(holiday)))
}

// PUT /api/holidays/:id
pub async fn update_holiday(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<HolidayPatch>,
) -> AppResult<Json<Holiday>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    Ok(Json(holidays::update_holiday(&db, &viewer, id, body)?))
}

// DELETE /api/holidays/:id
pub async fn delete_holiday(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let db = state.db()?;
    holidays::delete_holiday(&db, &viewer, id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}
