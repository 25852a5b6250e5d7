use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::calendar::hhmm;
use crate::models::{Booking, DayType, SystemSettings, ViewerContext};
use crate::services::{holidays, time_rules};

/// Longest window a range query may span.
pub const MAX_RANGE_DAYS: i64 = 62;

#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub day_type: DayType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    #[serde(serialize_with = "hhmm::serialize_list")]
    pub slots: Vec<NaiveTime>,
}

/// Aggregate view of a dog's day: which legal slots are taken, never by whom.
#[derive(Debug, Clone, Serialize)]
pub struct DayOccupancy {
    pub date: NaiveDate,
    pub day_type: DayType,
    pub blocked: bool,
    pub slots: Vec<SlotOccupancy>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotOccupancy {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub taken: bool,
}

/// Whether `date` lies beyond the booking horizon for this viewer.
/// Administrators are not bound by the horizon. A horizon past the end of the
/// calendar bounds nothing.
pub fn beyond_horizon(
    date: &NaiveDate,
    today: &NaiveDate,
    settings: &SystemSettings,
    viewer: &ViewerContext,
) -> bool {
    if viewer.is_admin {
        return false;
    }
    Duration::try_days(settings.booking_advance_days)
        .and_then(|ahead| today.checked_add_signed(ahead))
        .is_some_and(|last| *date > last)
}

/// Free slots for one dog on one date. Past slots, dates past the horizon and
/// blocked dates yield an empty list, never an error.
pub fn available_slots(
    conn: &Connection,
    settings: &SystemSettings,
    dog_id: i64,
    date: &NaiveDate,
    viewer: &ViewerContext,
    now: &NaiveDateTime,
) -> AppResult<DayAvailability> {
    let today = now.date();
    let day_type = holidays::classify_date(conn, date)?;
    let mut day = DayAvailability {
        date: *date,
        day_type,
        blocked_reason: None,
        slots: vec![],
    };

    if *date < today || beyond_horizon(date, &today, settings, viewer) {
        return Ok(day);
    }
    if let Some(reason) = queries::blocked_reason(conn, date, dog_id)? {
        day.blocked_reason = Some(reason);
        return Ok(day);
    }

    let legal = time_rules::legal_slots(conn, day_type, settings)?;
    let taken = queries::confirmed_times(conn, dog_id, date)?;
    day.slots = legal
        .into_iter()
        .filter(|t| !taken.contains(t))
        .filter(|t| date.and_time(*t) > *now)
        .collect();

    tracing::debug!(dog_id, date = %date, free = day.slots.len(), "computed available slots");
    Ok(day)
}

/// Validates an inclusive date range used by the listing views.
pub fn check_range(from: &NaiveDate, to: &NaiveDate) -> AppResult<()> {
    if to < from {
        return Err(AppError::InvalidInput(
            "range end must not be before range start".to_string(),
        ));
    }
    if (*to - *from).num_days() >= MAX_RANGE_DAYS {
        return Err(AppError::InvalidInput(format!(
            "range may span at most {MAX_RANGE_DAYS} days"
        )));
    }
    Ok(())
}

/// Private view: every booking the viewer made in `[from, to]`, any status.
pub fn my_bookings(
    conn: &Connection,
    viewer: &ViewerContext,
    from: &NaiveDate,
    to: &NaiveDate,
) -> AppResult<Vec<Booking>> {
    check_range(from, to)?;
    Ok(queries::get_bookings_for_user(conn, viewer.user_id, from, to)?)
}

/// Aggregate view over `[from, to]` for one dog. Carries no booking
/// identities, so it is safe to show to any signed-in user.
pub fn occupancy(
    conn: &Connection,
    settings: &SystemSettings,
    dog_id: i64,
    from: &NaiveDate,
    to: &NaiveDate,
) -> AppResult<Vec<DayOccupancy>> {
    check_range(from, to)?;

    let taken = queries::confirmed_slots_in_range(conn, dog_id, from, to)?;
    let mut days = vec![];
    for date in from.iter_days().take_while(|d| d <= to) {
        let day_type = holidays::classify_date(conn, &date)?;
        let blocked = queries::blocked_reason(conn, &date, dog_id)?.is_some();
        let slots = if blocked {
            vec![]
        } else {
            time_rules::legal_slots(conn, day_type, settings)?
                .into_iter()
                .map(|time| SlotOccupancy {
                    time,
                    taken: taken.contains(&(date, time)),
                })
                .collect()
        };
        days.push(DayOccupancy {
            date,
            day_type,
            blocked,
            slots,
        });
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{ApprovalStatus, BlockedDate, BookingStatus, WalkType};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        d(date).and_time(t(time))
    }

    fn book(conn: &Connection, id: &str, dog_id: i64, user_id: i64, date: &str, time: &str) {
        let now = at("2025-01-20", "08:00");
        queries::insert_booking(
            conn,
            &Booking {
                id: id.to_string(),
                dog_id,
                user_id,
                date: d(date),
                scheduled_time: t(time),
                walk_type: WalkType::for_time(&t(time)),
                status: BookingStatus::Confirmed,
                approval_status: ApprovalStatus::None,
                rejection_reason: None,
                cancellation_reason: None,
                approved_by: None,
                approved_at: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    // Monday 2025-01-27 with the seeded weekday rules.
    #[test]
    fn test_available_slots_excludes_confirmed() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        book(&conn, "b1", 7, 100, "2025-01-27", "10:00");

        let day = available_slots(
            &conn,
            &settings,
            7,
            &d("2025-01-27"),
            &ViewerContext::user(200),
            &at("2025-01-20", "08:00"),
        )
        .unwrap();
        assert_eq!(day.day_type, DayType::Weekday);
        assert!(!day.slots.contains(&t("10:00")));
        assert!(day.slots.contains(&t("10:15")));

        // other dogs are unaffected
        let other = available_slots(
            &conn,
            &settings,
            8,
            &d("2025-01-27"),
            &ViewerContext::user(200),
            &at("2025-01-20", "08:00"),
        )
        .unwrap();
        assert!(other.slots.contains(&t("10:00")));
    }

    #[test]
    fn test_past_dates_and_past_times_are_empty() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let viewer = ViewerContext::user(1);
        let now = at("2025-01-27", "11:00");

        let yesterday = available_slots(&conn, &settings, 7, &d("2025-01-26"), &viewer, &now).unwrap();
        assert!(yesterday.slots.is_empty());

        let today = available_slots(&conn, &settings, 7, &d("2025-01-27"), &viewer, &now).unwrap();
        assert!(!today.slots.contains(&t("10:45")));
        assert!(!today.slots.contains(&t("11:00")));
        assert!(today.slots.contains(&t("11:15")));
    }

    #[test]
    fn test_horizon_applies_to_users_only() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        let now = at("2025-01-20", "08:00");
        let far = d("2025-02-10");

        let user = available_slots(&conn, &settings, 7, &far, &ViewerContext::user(1), &now).unwrap();
        assert!(user.slots.is_empty());

        let admin = available_slots(&conn, &settings, 7, &far, &ViewerContext::admin(1), &now).unwrap();
        assert!(!admin.slots.is_empty());
    }

    #[test]
    fn test_oversized_horizon_does_not_overflow() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings {
            booking_advance_days: 1_000_000_000,
            ..SystemSettings::default()
        };
        let now = at("2025-01-20", "08:00");
        let viewer = ViewerContext::user(1);

        let day = available_slots(&conn, &settings, 7, &d("2025-02-10"), &viewer, &now).unwrap();
        assert!(!day.slots.is_empty());

        let unbounded = SystemSettings {
            booking_advance_days: i64::MAX,
            ..SystemSettings::default()
        };
        assert!(!beyond_horizon(&NaiveDate::MAX, &now.date(), &unbounded, &viewer));
        assert!(beyond_horizon(&d("2025-02-10"), &now.date(), &SystemSettings::default(), &viewer));
    }

    #[test]
    fn test_blocked_date_has_no_slots() {
        let conn = db::init_db(":memory:").unwrap();
        queries::insert_blocked_date(
            &conn,
            &BlockedDate {
                id: 0,
                date: d("2025-01-28"),
                dog_id: Some(7),
                reason: "vet appointment".to_string(),
                created_by: 1,
            },
        )
        .unwrap();

        let settings = SystemSettings::default();
        let now = at("2025-01-20", "08:00");
        let viewer = ViewerContext::user(1);
        let day = available_slots(&conn, &settings, 7, &d("2025-01-28"), &viewer, &now).unwrap();
        assert!(day.slots.is_empty());
        assert_eq!(day.blocked_reason.as_deref(), Some("vet appointment"));

        let other = available_slots(&conn, &settings, 8, &d("2025-01-28"), &viewer, &now).unwrap();
        assert!(!other.slots.is_empty());
    }

    #[test]
    fn test_views_separate_identity_from_occupancy() {
        let conn = db::init_db(":memory:").unwrap();
        let settings = SystemSettings::default();
        book(&conn, "mine", 7, 100, "2025-01-27", "10:00");
        book(&conn, "theirs", 7, 200, "2025-01-27", "15:00");

        let mine = my_bookings(&conn, &ViewerContext::user(100), &d("2025-01-27"), &d("2025-01-27")).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "mine");

        let days = occupancy(&conn, &settings, 7, &d("2025-01-27"), &d("2025-01-28")).unwrap();
        assert_eq!(days.len(), 2);
        let taken: Vec<NaiveTime> = days[0]
            .slots
            .iter()
            .filter(|s| s.taken)
            .map(|s| s.time)
            .collect();
        assert_eq!(taken, vec![t("10:00"), t("15:00")]);
        assert!(days[1].slots.iter().all(|s| !s.taken));
    }

    #[test]
    fn test_range_bounds() {
        assert!(check_range(&d("2025-01-01"), &d("2025-03-03")).is_ok());
        assert!(matches!(
            check_range(&d("2025-01-01"), &d("2025-03-04")),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            check_range(&d("2025-01-02"), &d("2025-01-01")),
            Err(AppError::InvalidInput(_))
        ));
    }
}
