use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;
use crate::handlers::{now, viewer_from_headers};
use crate::models::calendar::{hhmm, parse_date_input};
use crate::models::{BookingTimeRule, DayType, Holiday};
use crate::services::availability::{self, DayAvailability, DayOccupancy};
use crate::services::{holidays, settings, time_rules};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

// GET /api/calendar/classify?date=
#[derive(Serialize)]
pub struct ClassifyResponse {
    date: NaiveDate,
    day_type: DayType,
    holiday: Option<Holiday>,
}

pub async fn classify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<ClassifyResponse>> {
    viewer_from_headers(&headers, &state.config.admin_token)?;
    let date = parse_date_input(&query.date)?;
    holidays::ensure_official_holidays(&state, &date, &date, now()).await;

    let db = state.db()?;
    let holiday = holidays::is_holiday(&db, &date)?;
    Ok(Json(ClassifyResponse {
        date,
        day_type: holidays::classify(&date, holiday.is_some()),
        holiday,
    }))
}

// GET /api/calendar/slots?date=
#[derive(Serialize)]
pub struct SlotsResponse {
    date: NaiveDate,
    day_type: DayType,
    #[serde(serialize_with = "hhmm::serialize_list")]
    slots: Vec<NaiveTime>,
}

pub async fn slots(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<SlotsResponse>> {
    viewer_from_headers(&headers, &state.config.admin_token)?;
    let date = parse_date_input(&query.date)?;
    holidays::ensure_official_holidays(&state, &date, &date, now()).await;

    let db = state.db()?;
    let settings = settings::load(&db)?;
    let day_type = holidays::classify_date(&db, &date)?;
    let slots = time_rules::legal_slots(&db, day_type, &settings)?;
    Ok(Json(SlotsResponse {
        date,
        day_type,
        slots,
    }))
}

// GET /api/rules?date=
#[derive(Serialize)]
pub struct RulesForDateResponse {
    date: NaiveDate,
    day_type: DayType,
    rules: Vec<BookingTimeRule>,
}

pub async fn rules_for_date(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<RulesForDateResponse>> {
    viewer_from_headers(&headers, &state.config.admin_token)?;
    let date = parse_date_input(&query.date)?;
    holidays::ensure_official_holidays(&state, &date, &date, now()).await;

    let db = state.db()?;
    let (day_type, rules) = time_rules::rules_for_date(&db, &date)?;
    Ok(Json(RulesForDateResponse {
        date,
        day_type,
        rules,
    }))
}

// GET /api/dogs/:dog_id/availability?date=
pub async fn availability(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(dog_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> AppResult<Json<DayAvailability>> {
    let viewer = viewer_from_headers(&headers, &state.config.admin_token)?;
    let date = parse_date_input(&query.date)?;
    let now = now();
    holidays::ensure_official_holidays(&state, &date, &date, now).await;

    let db = state.db()?;
    let settings = settings::load(&db)?;
    let day = availability::available_slots(&db, &settings, dog_id, &date, &viewer, &now)?;
    Ok(Json(day))
}

// GET /api/dogs/:dog_id/occupancy?from=&to=
pub async fn occupancy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(dog_id): Path<i64>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<Vec<DayOccupancy>>> {
    viewer_from_headers(&headers, &state.config.admin_token)?;
    let from = parse_date_input(&query.from)?;
    let to = parse_date_input(&query.to)?;
    availability::check_range(&from, &to)?;
    holidays::ensure_official_holidays(&state, &from, &to, now()).await;

    let db = state.db()?;
    let settings = settings::load(&db)?;
    let days = availability::occupancy(&db, &settings, dog_id, &from, &to)?;
    Ok(Json(days))
}
