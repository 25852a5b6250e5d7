use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppResult;
use crate::handlers::calendar::RangeQuery;
use crate::handlers::{now, viewer_from_headers};
use crate::models::calendar::parse_date_input;
use crate::models::Booking;
use crate::services::approval::{self, NewBooking};
use crate::services::{availability, cancellation, holidays, settings};
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let date = parse_date_input(&body.date)?;
    let now = now();
    holidays::ensure_official_holidays(&state, &date, &date, now).await;

    let db = state.db()?;
    let settings = settings::load(&db)?;
    let booking = approval::create_booking(&db, &settings, &viewer, body, &now)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings/mine?from=&to=
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let from = parse_date_input(&query.from)?;
    let to = parse_date_input(&query.to)?;

    let db = state.db()?;
    Ok(Json(availability::my_bookings(&db, &viewer, &from, &to)?))
}

// POST /api/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<CancelRequest>>,
) -> AppResult<Json<Booking>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let reason = body.and_then(|Json(b)| b.reason);

    let db = state.db()?;
    let settings = settings::load(&db)?;
    let booking = cancellation::cancel(
        &db,
        &settings,
        &viewer,
        &id,
        reason.as_deref(),
        &now(),
    )?;
    Ok(Json(booking))
}
