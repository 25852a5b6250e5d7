use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::calendar::parse_date_input;
use crate::models::{DayType, Holiday, HolidaySource, ViewerContext};
use crate::state::AppState;

/// Weekend/weekday from the calendar, with holidays taking precedence over both.
pub fn classify(date: &NaiveDate, is_holiday: bool) -> DayType {
    if is_holiday {
        return DayType::Holiday;
    }
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => DayType::Weekend,
        _ => DayType::Weekday,
    }
}

pub fn classify_date(conn: &Connection, date: &NaiveDate) -> AppResult<DayType> {
    let holiday = is_holiday(conn, date)?;
    Ok(classify(date, holiday.is_some()))
}

/// The winning active holiday record for `date`, if any.
pub fn is_holiday(conn: &Connection, date: &NaiveDate) -> AppResult<Option<Holiday>> {
    let records = queries::get_active_holidays_on(conn, date)?;
    Ok(merge(records).into_iter().next())
}

pub fn list_holidays(conn: &Connection, year: i32) -> AppResult<Vec<Holiday>> {
    let records = queries::get_active_holidays_in_year(conn, year)?;
    Ok(merge(records))
}

/// Keeps one active record per date, preferring the higher-priority source,
/// and returns them sorted by date.
pub fn merge(records: Vec<Holiday>) -> Vec<Holiday> {
    let mut merged: Vec<Holiday> = Vec::with_capacity(records.len());
    for h in records.into_iter().filter(|h| h.is_active) {
        match merged.iter_mut().find(|m| m.date == h.date) {
            Some(existing) if h.source.priority() > existing.source.priority() => *existing = h,
            Some(_) => {}
            None => merged.push(h),
        }
    }
    merged.sort_by_key(|h| h.date);
    merged
}

// ── Official calendar refresh ──

/// How long a failed fetch keeps the source from being asked again.
pub const FAILED_FETCH_RETRY_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Disabled,
    CacheFresh,
    Refreshed(usize),
    Failed,
}

/// Best-effort refresh of the official holidays for `year`. Never returns an
/// error: a failing or slow source leaves the cached data in place.
pub async fn refresh_official_holidays(
    state: &AppState,
    year: i32,
    now: NaiveDateTime,
) -> RefreshOutcome {
    let settings = {
        let prepared = state.db().and_then(|conn| {
            let settings = queries::get_settings(&conn)?;
            let expiry = queries::get_holiday_cache_expiry(&conn, year, &settings.holiday_region)?;
            Ok((settings, expiry))
        });
        match prepared {
            Ok((settings, _)) if !settings.use_official_holidays => return RefreshOutcome::Disabled,
            Ok((_, Some(expiry))) if expiry > now => return RefreshOutcome::CacheFresh,
            Ok((settings, _)) => settings,
            Err(e) => {
                tracing::warn!(error = %e, year, "could not read holiday cache state");
                return RefreshOutcome::Failed;
            }
        }
    };

    let timeout = Duration::from_secs(state.config.holiday_fetch_timeout_secs);
    let fetched = tokio::time::timeout(
        timeout,
        state
            .holiday_source
            .fetch_year(year, &settings.holiday_region),
    )
    .await;

    let holidays = match fetched {
        Ok(Ok(holidays)) => holidays,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, year, "holiday source failed, keeping cached holidays");
            hold_off(state, year, &settings.holiday_region, now);
            return RefreshOutcome::Failed;
        }
        Err(_) => {
            tracing::warn!(year, timeout_secs = timeout.as_secs(), "holiday source timed out");
            hold_off(state, year, &settings.holiday_region, now);
            return RefreshOutcome::Failed;
        }
    };

    let ttl = chrono::Duration::try_days(settings.holiday_cache_days.max(0));
    let expires_at = cache_expiry(now, ttl);
    let stored = state.db().and_then(|conn| {
        let count = queries::sync_official_holidays(&conn, year, &holidays)?;
        queries::set_holiday_cache(&conn, year, &settings.holiday_region, &now, &expires_at)?;
        Ok(count)
    });

    match stored {
        Ok(count) => {
            tracing::info!(year, region = %settings.holiday_region, count, "official holidays refreshed");
            RefreshOutcome::Refreshed(count)
        }
        Err(e) => {
            tracing::warn!(error = %e, year, "failed to store official holidays");
            RefreshOutcome::Failed
        }
    }
}

/// `now + ttl`, capped at the last instant a stored four-digit-year timestamp
/// can express. An overflowing sum caches until that cap.
pub fn cache_expiry(now: NaiveDateTime, ttl: Option<chrono::Duration>) -> NaiveDateTime {
    let cap = NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .unwrap_or(NaiveDateTime::MAX);
    ttl.and_then(|ttl| now.checked_add_signed(ttl))
        .map_or(cap, |expiry| expiry.min(cap))
}

/// Records a short-lived cache entry after a failed fetch so requests in the
/// meantime do not each wait on the source again.
fn hold_off(state: &AppState, year: i32, region: &str, now: NaiveDateTime) {
    let retry_at = cache_expiry(now, chrono::Duration::try_minutes(FAILED_FETCH_RETRY_MINUTES));
    let recorded = state
        .db()
        .and_then(|conn| Ok(queries::set_holiday_cache(&conn, year, region, &now, &retry_at)?));
    if let Err(e) = recorded {
        tracing::warn!(error = %e, year, "could not record failed holiday fetch");
    }
}

/// Refreshes every year touched by `[from, to]`.
pub async fn ensure_official_holidays(
    state: &AppState,
    from: &NaiveDate,
    to: &NaiveDate,
    now: NaiveDateTime,
) {
    for year in from.year()..=to.year() {
        refresh_official_holidays(state, year, now).await;
    }
}

// ── Administration ──

#[derive(Debug, Clone, Deserialize)]
pub struct NewHoliday {
    pub date: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolidayPatch {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

pub fn create_holiday(
    conn: &Connection,
    viewer: &ViewerContext,
    input: NewHoliday,
) -> AppResult<Holiday> {
    viewer.require_admin("create holidays")?;

    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidInput("holiday name is required".to_string()));
    }
    let mut holiday = Holiday {
        id: 0,
        date: parse_date_input(&input.date)?,
        name,
        source: HolidaySource::Custom,
        is_active: true,
        created_by: Some(viewer.user_id),
    };
    holiday.id = queries::insert_holiday(conn, &holiday)?;

    tracing::info!(date = %holiday.date, admin_id = viewer.user_id, "custom holiday created");
    Ok(holiday)
}

pub fn update_holiday(
    conn: &Connection,
    viewer: &ViewerContext,
    id: i64,
    patch: HolidayPatch,
) -> AppResult<Holiday> {
    viewer.require_admin("update holidays")?;

    let mut holiday = queries::get_holiday(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("holiday {id}")))?;
    if let Some(name) = patch.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("holiday name cannot be empty".to_string()));
        }
        holiday.name = name;
    }
    if let Some(active) = patch.is_active {
        holiday.is_active = active;
    }
    queries::update_holiday(conn, id, &holiday.name, holiday.is_active)?;
    Ok(holiday)
}

/// Only custom holidays can be deleted; official ones are deactivated instead,
/// otherwise the next refresh would bring them back.
pub fn delete_holiday(conn: &Connection, viewer: &ViewerContext, id: i64) -> AppResult<()> {
    viewer.require_admin("delete holidays")?;

    let holiday = queries::get_holiday(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("holiday {id}")))?;
    if holiday.source == HolidaySource::Official {
        return Err(AppError::InvalidState(
            "official holidays cannot be deleted, deactivate them instead".to_string(),
        ));
    }
    queries::delete_holiday(conn, id)?;
    Ok(())
}
