use chrono::NaiveDateTime;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::calendar::{format_time, parse_date_input, parse_time_input};
use crate::models::{
    ApprovalStatus, Booking, BookingStatus, SystemSettings, ViewerContext, WalkType,
};
use crate::services::{availability, holidays, time_rules};

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub dog_id: i64,
    /// Defaults to the caller; only administrators may book for someone else.
    pub user_id: Option<i64>,
    pub date: String,
    pub time: String,
    pub walk_type: Option<String>,
}

/// Creates a confirmed booking. All checks and the insert run inside one
/// IMMEDIATE transaction so two callers cannot both take the same slot.
pub fn create_booking(
    conn: &Connection,
    settings: &SystemSettings,
    viewer: &ViewerContext,
    input: NewBooking,
    now: &NaiveDateTime,
) -> AppResult<Booking> {
    let date = parse_date_input(&input.date)?;
    let time = parse_time_input(&input.time)?;
    let walk_type = match input.walk_type.as_deref() {
        Some(raw) => WalkType::parse(raw)?,
        None => WalkType::for_time(&time),
    };
    let user_id = input.user_id.unwrap_or(viewer.user_id);
    if user_id != viewer.user_id && !viewer.is_admin {
        return Err(AppError::Forbidden(
            "cannot book walks on behalf of another user".to_string(),
        ));
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let day_type = holidays::classify_date(&tx, &date)?;
    let rules = queries::get_rules_by_day_type(&tx, day_type)?;
    if !time_rules::is_legal_start(&rules, &time, settings.effective_granularity()) {
        return Err(AppError::InvalidInput(format!(
            "{} is not a bookable time on {} ({})",
            format_time(&time),
            date,
            day_type.as_str()
        )));
    }
    if date.and_time(time) <= *now {
        return Err(AppError::InvalidInput(
            "cannot book a walk in the past".to_string(),
        ));
    }
    if availability::beyond_horizon(&date, &now.date(), settings, viewer) {
        return Err(AppError::InvalidInput(format!(
            "walks can be booked at most {} days ahead",
            settings.booking_advance_days
        )));
    }
    if let Some(reason) = queries::blocked_reason(&tx, &date, input.dog_id)? {
        return Err(AppError::InvalidInput(format!(
            "{date} is blocked for this dog: {reason}"
        )));
    }
    if queries::confirmed_times(&tx, input.dog_id, &date)?.contains(&time) {
        return Err(AppError::SlotTaken(format!(
            "dog {} is already booked on {} at {}",
            input.dog_id,
            date,
            format_time(&time)
        )));
    }

    let approval_status =
        if time_rules::rules_require_approval(&rules, &time, walk_type, settings) {
            ApprovalStatus::Pending
        } else {
            ApprovalStatus::None
        };

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        dog_id: input.dog_id,
        user_id,
        date,
        scheduled_time: time,
        walk_type,
        status: BookingStatus::Confirmed,
        approval_status,
        rejection_reason: None,
        cancellation_reason: None,
        approved_by: None,
        approved_at: None,
        created_at: *now,
        updated_at: *now,
    };
    queries::insert_booking(&tx, &booking)?;
    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        dog_id = booking.dog_id,
        user_id,
        date = %booking.date,
        time = %format_time(&booking.scheduled_time),
        approval = booking.approval_status.as_str(),
        "booking created"
    );
    Ok(booking)
}

fn load_booking(conn: &Connection, id: &str) -> AppResult<Booking> {
    queries::get_booking_by_id(conn, id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

pub fn list_pending_approvals(
    conn: &Connection,
    viewer: &ViewerContext,
) -> AppResult<Vec<Booking>> {
    viewer.require_admin("list pending approvals")?;
    Ok(queries::get_pending_approvals(conn)?)
}

/// pending → approved. Approving an already approved booking is a no-op.
pub fn approve(
    conn: &Connection,
    viewer: &ViewerContext,
    id: &str,
    now: &NaiveDateTime,
) -> AppResult<Booking> {
    viewer.require_admin("approve bookings")?;

    let booking = load_booking(conn, id)?;
    if booking.status == BookingStatus::Confirmed
        && booking.approval_status == ApprovalStatus::Approved
    {
        return Ok(booking);
    }
    if !queries::mark_approved(conn, id, viewer.user_id, now)? {
        let current = load_booking(conn, id)?;
        return Err(AppError::InvalidState(format!(
            "booking {id} is {} with approval {}, cannot approve",
            current.status.as_str(),
            current.approval_status.as_str()
        )));
    }

    tracing::info!(booking_id = %id, admin_id = viewer.user_id, "booking approved");
    load_booking(conn, id)
}

/// pending → rejected. The booking is cancelled in the same step, which
/// frees its slot.
pub fn reject(
    conn: &Connection,
    viewer: &ViewerContext,
    id: &str,
    reason: &str,
    now: &NaiveDateTime,
) -> AppResult<Booking> {
    viewer.require_admin("reject bookings")?;

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::InvalidInput(
            "a rejection reason is required".to_string(),
        ));
    }
    load_booking(conn, id)?;
    if !queries::mark_rejected(conn, id, reason, now)? {
        let current = load_booking(conn, id)?;
        return Err(AppError::InvalidState(format!(
            "booking {id} is {} with approval {}, cannot reject",
            current.status.as_str(),
            current.approval_status.as_str()
        )));
    }

    tracing::info!(booking_id = %id, admin_id = viewer.user_id, "booking rejected");
    load_booking(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::{NaiveDate, NaiveTime};

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    fn request(dog_id: i64, date: &str, time: &str) -> NewBooking {
        NewBooking {
            dog_id,
            user_id: None,
            date: date.to_string(),
            time: time.to_string(),
            walk_type: None,
        }
    }

    fn now() -> NaiveDateTime {
        at("2025-01-20", "08:00")
    }

    #[test]
    fn test_morning_walk_needs_approval_by_default() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let user = ViewerContext::user(100);

        let morning =
            create_booking(&conn, &settings, &user, request(7, "2025-01-27", "10:00"), &now()).unwrap();
        assert_eq!(morning.walk_type, WalkType::Morning);
        assert_eq!(morning.approval_status, ApprovalStatus::Pending);
        assert_eq!(morning.status, BookingStatus::Confirmed);

        let afternoon =
            create_booking(&conn, &settings, &user, request(7, "2025-01-27", "15:00"), &now()).unwrap();
        assert_eq!(afternoon.walk_type, WalkType::Evening);
        assert_eq!(afternoon.approval_status, ApprovalStatus::None);
    }

    #[test]
    fn test_morning_walk_without_approval_when_disabled() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings {
            require_approval_for_morning_walks: false,
            ..SystemSettings::default()
        };
        let booking = create_booking(
            &conn,
            &settings,
            &ViewerContext::user(100),
            request(7, "2025-01-27", "10:00"),
            &now(),
        )
        .unwrap();
        assert_eq!(booking.approval_status, ApprovalStatus::None);
    }

    #[test]
    fn test_create_rejects_illegal_and_taken_slots() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let user = ViewerContext::user(100);

        let lunch = create_booking(&conn, &settings, &user, request(7, "2025-01-27", "13:15"), &now());
        assert!(matches!(lunch, Err(AppError::InvalidInput(_))));

        let off_grid = create_booking(&conn, &settings, &user, request(7, "2025-01-27", "15:05"), &now());
        assert!(matches!(off_grid, Err(AppError::InvalidInput(_))));

        create_booking(&conn, &settings, &user, request(7, "2025-01-27", "15:00"), &now()).unwrap();
        let again = create_booking(
            &conn,
            &settings,
            &ViewerContext::user(200),
            request(7, "2025-01-27", "15:00"),
            &now(),
        );
        assert!(matches!(again, Err(AppError::SlotTaken(_))));
    }

    #[test]
    fn test_create_rejects_past_and_far_dates() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let user = ViewerContext::user(100);

        let past = create_booking(&conn, &settings, &user, request(7, "2025-01-17", "15:00"), &now());
        assert!(matches!(past, Err(AppError::InvalidInput(_))));

        let far = create_booking(&conn, &settings, &user, request(7, "2025-02-10", "15:00"), &now());
        assert!(matches!(far, Err(AppError::InvalidInput(_))));

        let admin_far = create_booking(
            &conn,
            &settings,
            &ViewerContext::admin(1),
            request(7, "2025-02-10", "15:00"),
            &now(),
        );
        assert!(admin_far.is_ok());
    }

    #[test]
    fn test_booking_for_others_requires_admin() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let mut input = request(7, "2025-01-27", "15:00");
        input.user_id = Some(999);

        let denied = create_booking(&conn, &settings, &ViewerContext::user(100), input.clone(), &now());
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let booking = create_booking(&conn, &settings, &ViewerContext::admin(1), input, &now()).unwrap();
        assert_eq!(booking.user_id, 999);
    }

    #[test]
    fn test_approve_is_idempotent() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let admin = ViewerContext::admin(1);
        let booking = create_booking(
            &conn,
            &settings,
            &ViewerContext::user(100),
            request(7, "2025-01-27", "10:00"),
            &now(),
        )
        .unwrap();

        let pending = list_pending_approvals(&conn, &admin).unwrap();
        assert_eq!(pending.len(), 1);

        let approved = approve(&conn, &admin, &booking.id, &now()).unwrap();
        assert_eq!(approved.approval_status, ApprovalStatus::Approved);
        assert_eq!(approved.approved_by, Some(1));

        let again = approve(&conn, &admin, &booking.id, &now()).unwrap();
        assert_eq!(again.approval_status, ApprovalStatus::Approved);
        assert!(list_pending_approvals(&conn, &admin).unwrap().is_empty());
    }

    #[test]
    fn test_bookings_without_approval_cannot_be_approved() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let admin = ViewerContext::admin(1);
        let afternoon = create_booking(
            &conn,
            &settings,
            &ViewerContext::user(100),
            request(7, "2025-01-27", "15:00"),
            &now(),
        )
        .unwrap();
        assert_eq!(afternoon.approval_status, ApprovalStatus::None);

        assert!(matches!(
            approve(&conn, &admin, &afternoon.id, &now()),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            reject(&conn, &admin, &afternoon.id, "no", &now()),
            Err(AppError::InvalidState(_))
        ));

        let unchanged = queries::get_booking_by_id(&conn, &afternoon.id).unwrap().unwrap();
        assert_eq!(unchanged.approval_status, ApprovalStatus::None);
        assert_eq!(unchanged.approved_by, None);
    }

    #[test]
    fn test_reject_frees_the_slot() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let admin = ViewerContext::admin(1);
        let booking = create_booking(
            &conn,
            &settings,
            &ViewerContext::user(100),
            request(7, "2025-01-27", "10:00"),
            &now(),
        )
        .unwrap();

        assert!(matches!(
            reject(&conn, &admin, &booking.id, "  ", &now()),
            Err(AppError::InvalidInput(_))
        ));

        let rejected = reject(&conn, &admin, &booking.id, "dog is unwell", &now()).unwrap();
        assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
        assert_eq!(rejected.status, BookingStatus::Cancelled);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("dog is unwell"));

        assert!(matches!(
            reject(&conn, &admin, &booking.id, "again", &now()),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            approve(&conn, &admin, &booking.id, &now()),
            Err(AppError::InvalidState(_))
        ));

        let rebooked = create_booking(
            &conn,
            &settings,
            &ViewerContext::user(200),
            request(7, "2025-01-27", "10:00"),
            &now(),
        );
        assert!(rebooked.is_ok());
    }

    #[test]
    fn test_approval_actions_require_admin() {
        let conn = db::init_db(":memory:").unwrap();
        let user = ViewerContext::user(100);
        assert!(matches!(
            approve(&conn, &user, "missing", &now()),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            reject(&conn, &user, "missing", "no", &now()),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            approve(&conn, &ViewerContext::admin(1), "missing", &now()),
            Err(AppError::NotFound(_))
        ));
    }
}
