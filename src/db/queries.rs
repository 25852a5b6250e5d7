use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{ffi, params, Connection, OptionalExtension};

use crate::errors::AppError;
use crate::models::calendar::{format_time, parse_stored_date, parse_stored_time, DATE_FORMAT};
use crate::models::{
    ApprovalStatus, BlockedDate, Booking, BookingStatus, BookingTimeRule, DayType, Holiday,
    HolidaySource, OfficialHoliday, SystemSettings, WalkType,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Every date column is written as plain `YYYY-MM-DD`, which the unique slot
/// index relies on. Reads compare the first ten characters so rows written as
/// timestamps by older tooling still match.
fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

fn fmt_ts(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| anyhow::anyhow!("malformed timestamp '{s}': {e}"))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// ── Settings ──

pub fn get_settings(conn: &Connection) -> anyhow::Result<SystemSettings> {
    let mut stmt = conn.prepare("SELECT key, value FROM system_settings")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

    let mut pairs = HashMap::new();
    for row in rows {
        let (key, value) = row?;
        pairs.insert(key, value);
    }
    Ok(SystemSettings::from_pairs(&pairs))
}

pub fn save_settings(conn: &Connection, settings: &SystemSettings) -> anyhow::Result<()> {
    let tx = conn.unchecked_transaction()?;
    for (key, value) in settings.to_pairs() {
        tx.execute(
            "INSERT INTO system_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            params![key, value],
        )?;
    }
    tx.commit()?;
    Ok(())
}

// ── Time Rules ──

const RULE_COLUMNS: &str =
    "id, day_type, rule_name, start_time, end_time, is_blocked, requires_approval";

fn parse_rule_row(row: &rusqlite::Row) -> anyhow::Result<BookingTimeRule> {
    let day_type: String = row.get(1)?;
    let start: String = row.get(3)?;
    let end: String = row.get(4)?;

    Ok(BookingTimeRule {
        id: row.get(0)?,
        day_type: DayType::parse(&day_type)?,
        rule_name: row.get(2)?,
        start_time: parse_stored_time(&start)?,
        end_time: parse_stored_time(&end)?,
        is_blocked: row.get::<_, i32>(5)? != 0,
        requires_approval: row.get::<_, i32>(6)? != 0,
    })
}

pub fn get_rules_by_day_type(
    conn: &Connection,
    day_type: DayType,
) -> anyhow::Result<Vec<BookingTimeRule>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RULE_COLUMNS} FROM booking_time_rules WHERE day_type = ?1 ORDER BY start_time ASC"
    ))?;
    let rows = stmt.query_map(params![day_type.as_str()], |row| Ok(parse_rule_row(row)))?;

    let mut rules = vec![];
    for row in rows {
        rules.push(row??);
    }
    Ok(rules)
}

pub fn get_all_rules(conn: &Connection) -> anyhow::Result<Vec<BookingTimeRule>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RULE_COLUMNS} FROM booking_time_rules ORDER BY day_type, start_time ASC"
    ))?;
    let rows = stmt.query_map([], |row| Ok(parse_rule_row(row)))?;

    let mut rules = vec![];
    for row in rows {
        rules.push(row??);
    }
    Ok(rules)
}

pub fn get_rule(conn: &Connection, id: i64) -> anyhow::Result<Option<BookingTimeRule>> {
    let result = conn
        .query_row(
            &format!("SELECT {RULE_COLUMNS} FROM booking_time_rules WHERE id = ?1"),
            params![id],
            |row| Ok(parse_rule_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn insert_rule(conn: &Connection, rule: &BookingTimeRule) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO booking_time_rules (day_type, rule_name, start_time, end_time, is_blocked, requires_approval)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            rule.day_type.as_str(),
            rule.rule_name,
            format_time(&rule.start_time),
            format_time(&rule.end_time),
            rule.is_blocked as i32,
            rule.requires_approval as i32,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_rule(conn: &Connection, rule: &BookingTimeRule) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE booking_time_rules
         SET day_type = ?1, rule_name = ?2, start_time = ?3, end_time = ?4,
             is_blocked = ?5, requires_approval = ?6, updated_at = datetime('now')
         WHERE id = ?7",
        params![
            rule.day_type.as_str(),
            rule.rule_name,
            format_time(&rule.start_time),
            format_time(&rule.end_time),
            rule.is_blocked as i32,
            rule.requires_approval as i32,
            rule.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_rule(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM booking_time_rules WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn delete_rules_for_day_type(conn: &Connection, day_type: DayType) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM booking_time_rules WHERE day_type = ?1",
        params![day_type.as_str()],
    )?;
    Ok(count)
}

// ── Holidays ──

const HOLIDAY_COLUMNS: &str = "id, date, name, source, is_active, created_by";

fn parse_holiday_row(row: &rusqlite::Row) -> anyhow::Result<Holiday> {
    let date: String = row.get(1)?;
    let source: String = row.get(3)?;
    Ok(Holiday {
        id: row.get(0)?,
        date: parse_stored_date(&date)?,
        name: row.get(2)?,
        source: HolidaySource::parse(&source),
        is_active: row.get::<_, i32>(4)? != 0,
        created_by: row.get(5)?,
    })
}

fn collect_holidays(
    stmt: &mut rusqlite::Statement,
    params: impl rusqlite::Params,
) -> anyhow::Result<Vec<Holiday>> {
    let rows = stmt.query_map(params, |row| Ok(parse_holiday_row(row)))?;
    let mut holidays = vec![];
    for row in rows {
        holidays.push(row??);
    }
    Ok(holidays)
}

/// Active holiday records for one date, from every source.
pub fn get_active_holidays_on(conn: &Connection, date: &NaiveDate) -> anyhow::Result<Vec<Holiday>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE substr(date, 1, 10) = ?1 AND is_active = 1"
    ))?;
    collect_holidays(&mut stmt, params![fmt_date(date)])
}

pub fn get_active_holidays_in_year(conn: &Connection, year: i32) -> anyhow::Result<Vec<Holiday>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HOLIDAY_COLUMNS} FROM holidays
         WHERE is_active = 1 AND date LIKE ?1 ORDER BY date ASC, source ASC"
    ))?;
    collect_holidays(&mut stmt, params![format!("{year:04}-%")])
}

pub fn get_holiday(conn: &Connection, id: i64) -> anyhow::Result<Option<Holiday>> {
    let result = conn
        .query_row(
            &format!("SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE id = ?1"),
            params![id],
            |row| Ok(parse_holiday_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn insert_holiday(conn: &Connection, holiday: &Holiday) -> anyhow::Result<i64> {
    let result = conn.execute(
        "INSERT INTO holidays (date, name, source, is_active, created_by) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fmt_date(&holiday.date),
            holiday.name,
            holiday.source.as_str(),
            holiday.is_active as i32,
            holiday.created_by,
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(AppError::InvalidInput(format!(
            "a {} holiday already exists on {}",
            holiday.source.as_str(),
            fmt_date(&holiday.date)
        ))
        .into()),
        Err(e) => Err(e.into()),
    }
}

pub fn update_holiday(
    conn: &Connection,
    id: i64,
    name: &str,
    is_active: bool,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE holidays SET name = ?1, is_active = ?2 WHERE id = ?3",
        params![name, is_active as i32, id],
    )?;
    Ok(count > 0)
}

pub fn delete_holiday(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM holidays WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Replaces the official holidays of `year` with `fresh`. Existing rows keep
/// their `is_active` flag; official rows no longer listed are dropped. Custom
/// rows are never touched.
pub fn sync_official_holidays(
    conn: &Connection,
    year: i32,
    fresh: &[OfficialHoliday],
) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let year_pattern = format!("{year:04}-%");

    let mut keep = Vec::with_capacity(fresh.len());
    for h in fresh.iter().filter(|h| h.date.year() == year) {
        let date = fmt_date(&h.date);
        tx.execute(
            "INSERT INTO holidays (date, name, source, is_active) VALUES (?1, ?2, 'official', 1)
             ON CONFLICT(date, source) DO UPDATE SET name = excluded.name",
            params![date, h.name],
        )?;
        keep.push(date);
    }

    let existing: Vec<(i64, String)> = {
        let mut stmt = tx.prepare(
            "SELECT id, date FROM holidays WHERE source = 'official' AND date LIKE ?1",
        )?;
        let rows = stmt.query_map(params![year_pattern], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<_, _>>()?
    };
    for (id, date) in existing {
        if !keep.contains(&date) {
            tx.execute("DELETE FROM holidays WHERE id = ?1", params![id])?;
        }
    }

    tx.commit()?;
    Ok(keep.len())
}

pub fn get_holiday_cache_expiry(
    conn: &Connection,
    year: i32,
    region: &str,
) -> anyhow::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT expires_at FROM official_holiday_cache WHERE year = ?1 AND region = ?2",
            params![year, region],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|s| parse_ts(&s)).transpose()
}

pub fn set_holiday_cache(
    conn: &Connection,
    year: i32,
    region: &str,
    fetched_at: &NaiveDateTime,
    expires_at: &NaiveDateTime,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO official_holiday_cache (year, region, fetched_at, expires_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(year, region) DO UPDATE SET fetched_at = excluded.fetched_at, expires_at = excluded.expires_at",
        params![year, region, fmt_ts(fetched_at), fmt_ts(expires_at)],
    )?;
    Ok(())
}

// ── Blocked Dates ──

fn parse_blocked_row(row: &rusqlite::Row) -> anyhow::Result<BlockedDate> {
    let date: String = row.get(1)?;
    Ok(BlockedDate {
        id: row.get(0)?,
        date: parse_stored_date(&date)?,
        dog_id: row.get(2)?,
        reason: row.get(3)?,
        created_by: row.get(4)?,
    })
}

pub fn insert_blocked_date(conn: &Connection, blocked: &BlockedDate) -> anyhow::Result<i64> {
    let result = conn.execute(
        "INSERT INTO blocked_dates (date, dog_id, reason, created_by) VALUES (?1, ?2, ?3, ?4)",
        params![
            fmt_date(&blocked.date),
            blocked.dog_id,
            blocked.reason,
            blocked.created_by
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(AppError::InvalidInput(format!(
            "{} is already blocked",
            fmt_date(&blocked.date)
        ))
        .into()),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_blocked_date(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM blocked_dates WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn list_blocked_dates(conn: &Connection, from: &NaiveDate) -> anyhow::Result<Vec<BlockedDate>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, dog_id, reason, created_by FROM blocked_dates
         WHERE substr(date, 1, 10) >= ?1 ORDER BY date ASC, dog_id ASC",
    )?;
    let rows = stmt.query_map(params![fmt_date(from)], |row| Ok(parse_blocked_row(row)))?;

    let mut blocked = vec![];
    for row in rows {
        blocked.push(row??);
    }
    Ok(blocked)
}

/// Reason the date is closed for this dog, either globally or for the dog alone.
pub fn blocked_reason(
    conn: &Connection,
    date: &NaiveDate,
    dog_id: i64,
) -> anyhow::Result<Option<String>> {
    let reason = conn
        .query_row(
            "SELECT reason FROM blocked_dates
             WHERE substr(date, 1, 10) = ?1 AND (dog_id IS NULL OR dog_id = ?2)
             ORDER BY dog_id IS NULL DESC LIMIT 1",
            params![fmt_date(date), dog_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(reason)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, dog_id, user_id, date, scheduled_time, walk_type, status, \
     approval_status, rejection_reason, cancellation_reason, approved_by, approved_at, \
     created_at, updated_at";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date: String = row.get(3)?;
    let scheduled_time: String = row.get(4)?;
    let walk_type: String = row.get(5)?;
    let status: String = row.get(6)?;
    let approval_status: String = row.get(7)?;
    let approved_at: Option<String> = row.get(11)?;
    let created_at: String = row.get(12)?;
    let updated_at: String = row.get(13)?;

    Ok(Booking {
        id: row.get(0)?,
        dog_id: row.get(1)?,
        user_id: row.get(2)?,
        date: parse_stored_date(&date)?,
        scheduled_time: parse_stored_time(&scheduled_time)?,
        walk_type: WalkType::parse(&walk_type)
            .map_err(|_| AppError::InvalidState(format!("unknown walk type '{walk_type}'")))?,
        status: BookingStatus::parse(&status)?,
        approval_status: ApprovalStatus::parse(&approval_status)?,
        rejection_reason: row.get(8)?,
        cancellation_reason: row.get(9)?,
        approved_by: row.get(10)?,
        approved_at: approved_at.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn collect_bookings(
    stmt: &mut rusqlite::Statement,
    params: impl rusqlite::Params,
) -> anyhow::Result<Vec<Booking>> {
    let rows = stmt.query_map(params, |row| Ok(parse_booking_row(row)))?;
    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Inserts a booking. A clash on the confirmed-slot unique index surfaces as
/// `AppError::SlotTaken`.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let result = conn.execute(
        "INSERT INTO bookings (id, dog_id, user_id, date, scheduled_time, walk_type, status,
             approval_status, rejection_reason, cancellation_reason, approved_by, approved_at,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            booking.id,
            booking.dog_id,
            booking.user_id,
            fmt_date(&booking.date),
            format_time(&booking.scheduled_time),
            booking.walk_type.as_str(),
            booking.status.as_str(),
            booking.approval_status.as_str(),
            booking.rejection_reason,
            booking.cancellation_reason,
            booking.approved_by,
            booking.approved_at.as_ref().map(fmt_ts),
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(AppError::SlotTaken(format!(
            "dog {} is already booked on {} at {}",
            booking.dog_id,
            fmt_date(&booking.date),
            format_time(&booking.scheduled_time)
        ))
        .into()),
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;
    result.transpose()
}

/// Scheduled times held by confirmed bookings of a dog on one date.
pub fn confirmed_times(
    conn: &Connection,
    dog_id: i64,
    date: &NaiveDate,
) -> anyhow::Result<Vec<NaiveTime>> {
    let mut stmt = conn.prepare(
        "SELECT scheduled_time FROM bookings
         WHERE dog_id = ?1 AND substr(date, 1, 10) = ?2 AND status = 'confirmed'
         ORDER BY scheduled_time ASC",
    )?;
    let rows = stmt.query_map(params![dog_id, fmt_date(date)], |row| row.get::<_, String>(0))?;

    let mut times = vec![];
    for row in rows {
        times.push(parse_stored_time(&row?)?);
    }
    Ok(times)
}

pub fn confirmed_slots_in_range(
    conn: &Connection,
    dog_id: i64,
    from: &NaiveDate,
    to: &NaiveDate,
) -> anyhow::Result<Vec<(NaiveDate, NaiveTime)>> {
    let mut stmt = conn.prepare(
        "SELECT date, scheduled_time FROM bookings
         WHERE dog_id = ?1 AND substr(date, 1, 10) BETWEEN ?2 AND ?3 AND status = 'confirmed'
         ORDER BY date ASC, scheduled_time ASC",
    )?;
    let rows = stmt.query_map(params![dog_id, fmt_date(from), fmt_date(to)], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut slots = vec![];
    for row in rows {
        let (date, time) = row?;
        slots.push((parse_stored_date(&date)?, parse_stored_time(&time)?));
    }
    Ok(slots)
}

pub fn get_bookings_for_user(
    conn: &Connection,
    user_id: i64,
    from: &NaiveDate,
    to: &NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE user_id = ?1 AND substr(date, 1, 10) BETWEEN ?2 AND ?3
         ORDER BY date ASC, scheduled_time ASC"
    ))?;
    collect_bookings(&mut stmt, params![user_id, fmt_date(from), fmt_date(to)])
}

pub fn get_pending_approvals(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE approval_status = 'pending' AND status = 'confirmed'
         ORDER BY date ASC, scheduled_time ASC"
    ))?;
    collect_bookings(&mut stmt, [])
}

/// pending → approved, only while the booking still holds its slot.
pub fn mark_approved(
    conn: &Connection,
    id: &str,
    admin_id: i64,
    at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings
         SET approval_status = 'approved', approved_by = ?1, approved_at = ?2, updated_at = ?2
         WHERE id = ?3 AND approval_status = 'pending' AND status = 'confirmed'",
        params![admin_id, fmt_ts(at), id],
    )?;
    Ok(count > 0)
}

/// pending → rejected; releases the slot in the same statement.
pub fn mark_rejected(
    conn: &Connection,
    id: &str,
    reason: &str,
    at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings
         SET approval_status = 'rejected', status = 'cancelled', rejection_reason = ?1, updated_at = ?2
         WHERE id = ?3 AND approval_status = 'pending' AND status = 'confirmed'",
        params![reason, fmt_ts(at), id],
    )?;
    Ok(count > 0)
}

pub fn mark_cancelled(
    conn: &Connection,
    id: &str,
    reason: Option<&str>,
    at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'cancelled', cancellation_reason = ?1, updated_at = ?2
         WHERE id = ?3 AND status = 'confirmed'",
        params![reason, fmt_ts(at), id],
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_only_unique_violations_count_as_conflicts() {
        let conn = db::init_db(":memory:").unwrap();

        let bad_walk_type = conn
            .execute(
                "INSERT INTO bookings (id, dog_id, user_id, date, scheduled_time, walk_type)
                 VALUES ('b1', 7, 1, '2025-01-27', '10:00', 'midday')",
                [],
            )
            .unwrap_err();
        assert!(!is_unique_violation(&bad_walk_type));

        let missing_reason = conn
            .execute(
                "INSERT INTO blocked_dates (date, created_by) VALUES ('2025-01-27', 1)",
                [],
            )
            .unwrap_err();
        assert!(!is_unique_violation(&missing_reason));

        let block = "INSERT INTO blocked_dates (date, dog_id, reason, created_by)
                     VALUES ('2025-01-27', 7, 'vet', 1)";
        conn.execute(block, []).unwrap();
        let duplicate = conn.execute(block, []).unwrap_err();
        assert!(is_unique_violation(&duplicate));
    }

    #[test]
    fn test_timestamp_dates_still_match_slot_queries() {
        let conn = db::init_db(":memory:").unwrap();
        conn.execute(
            "INSERT INTO bookings (id, dog_id, user_id, date, scheduled_time, walk_type)
             VALUES ('legacy', 7, 1, '2025-01-27T00:00:00Z', '10:00', 'morning')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO blocked_dates (date, dog_id, reason, created_by)
             VALUES ('2025-01-28 00:00:00', 7, 'vet', 1)",
            [],
        )
        .unwrap();

        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert_eq!(confirmed_times(&conn, 7, &d("2025-01-27")).unwrap(), vec![ten]);
        assert_eq!(
            confirmed_slots_in_range(&conn, 7, &d("2025-01-27"), &d("2025-01-27")).unwrap(),
            vec![(d("2025-01-27"), ten)]
        );
        let mine = get_bookings_for_user(&conn, 1, &d("2025-01-27"), &d("2025-01-27")).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].date, d("2025-01-27"));

        assert_eq!(
            blocked_reason(&conn, &d("2025-01-28"), 7).unwrap().as_deref(),
            Some("vet")
        );
        assert_eq!(list_blocked_dates(&conn, &d("2025-01-28")).unwrap().len(), 1);
    }
}
