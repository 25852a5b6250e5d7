use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Booking, BookingStatus, SystemSettings, ViewerContext};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CancelCheck {
    pub allowed: bool,
    pub hours_remaining: f64,
    pub required_hours: i64,
}

/// Lead-time check. Exactly `cancellation_lead_hours` before the walk still
/// counts as in time; administrators may always cancel.
pub fn can_cancel(
    booking: &Booking,
    settings: &SystemSettings,
    viewer: &ViewerContext,
    now: &NaiveDateTime,
) -> CancelCheck {
    let hours_remaining = (booking.walk_start() - *now).num_seconds() as f64 / 3600.0;
    let required_hours = settings.cancellation_lead_hours;
    CancelCheck {
        allowed: viewer.is_admin || hours_remaining >= required_hours as f64,
        hours_remaining,
        required_hours,
    }
}

pub fn cancel(
    conn: &Connection,
    settings: &SystemSettings,
    viewer: &ViewerContext,
    id: &str,
    reason: Option<&str>,
    now: &NaiveDateTime,
) -> AppResult<Booking> {
    let booking = queries::get_booking_by_id(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if booking.user_id != viewer.user_id && !viewer.is_admin {
        return Err(AppError::Forbidden(
            "only the booking owner or an administrator can cancel".to_string(),
        ));
    }
    if booking.status != BookingStatus::Confirmed {
        return Err(AppError::InvalidState(format!(
            "booking {id} is already {}",
            booking.status.as_str()
        )));
    }

    let check = can_cancel(&booking, settings, viewer, now);
    if !check.allowed {
        return Err(AppError::LeadTimeViolation {
            hours_remaining: check.hours_remaining,
            required_hours: check.required_hours,
        });
    }

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    if !queries::mark_cancelled(conn, id, reason, now)? {
        return Err(AppError::InvalidState(format!(
            "booking {id} changed while cancelling"
        )));
    }

    tracing::info!(
        booking_id = %id,
        viewer_id = viewer.user_id,
        hours_remaining = check.hours_remaining,
        "booking cancelled"
    );
    queries::get_booking_by_id(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}
