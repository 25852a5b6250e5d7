use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::calendar::parse_date_input;
use crate::models::{BlockedDate, ViewerContext};

#[derive(Debug, Clone, Deserialize)]
pub struct NewBlockedDate {
    pub date: String,
    /// `None` closes the date for every dog.
    pub dog_id: Option<i64>,
    pub reason: String,
}

pub fn create_blocked_date(
    conn: &Connection,
    viewer: &ViewerContext,
    input: NewBlockedDate,
) -> AppResult<BlockedDate> {
    viewer.require_admin("block dates")?;

    let reason = input.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::InvalidInput("a reason is required".to_string()));
    }
    let mut blocked = BlockedDate {
        id: 0,
        date: parse_date_input(&input.date)?,
        dog_id: input.dog_id,
        reason,
        created_by: viewer.user_id,
    };
    blocked.id = queries::insert_blocked_date(conn, &blocked)?;

    tracing::info!(date = %blocked.date, dog_id = ?blocked.dog_id, "date blocked");
    Ok(blocked)
}

pub fn delete_blocked_date(conn: &Connection, viewer: &ViewerContext, id: i64) -> AppResult<()> {
    viewer.require_admin("unblock dates")?;
    if !queries::delete_blocked_date(conn, id)? {
        return Err(AppError::NotFound(format!("blocked date {id}")));
    }
    Ok(())
}

/// Blocked dates from `from` onwards.
pub fn list_blocked_dates(
    conn: &Connection,
    viewer: &ViewerContext,
    from: &NaiveDate,
) -> AppResult<Vec<BlockedDate>> {
    viewer.require_admin("list blocked dates")?;
    Ok(queries::list_blocked_dates(conn, from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn input(date: &str, dog_id: Option<i64>) -> NewBlockedDate {
        NewBlockedDate {
            date: date.to_string(),
            dog_id,
            reason: "shelter open day".to_string(),
        }
    }

    #[test]
    fn test_global_block_covers_every_dog() {
        let conn = db::init_db(":memory:").unwrap();
        let admin = ViewerContext::admin(1);
        create_blocked_date(&conn, &admin, input("2025-03-01", None)).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(queries::blocked_reason(&conn, &date, 7).unwrap().is_some());
        assert!(queries::blocked_reason(&conn, &date, 8).unwrap().is_some());
    }

    #[test]
    fn test_duplicate_block_is_rejected() {
        let conn = db::init_db(":memory:").unwrap();
        let admin = ViewerContext::admin(1);
        create_blocked_date(&conn, &admin, input("2025-03-01", Some(7))).unwrap();
        assert!(matches!(
            create_blocked_date(&conn, &admin, input("2025-03-01", Some(7))),
            Err(AppError::InvalidInput(_))
        ));
        // a different dog on the same date is fine
        create_blocked_date(&conn, &admin, input("2025-03-01", Some(8))).unwrap();
    }

    #[test]
    fn test_list_and_delete() {
        let conn = db::init_db(":memory:").unwrap();
        let admin = ViewerContext::admin(1);
        let old = create_blocked_date(&conn, &admin, input("2025-01-01", None)).unwrap();
        let new = create_blocked_date(&conn, &admin, input("2025-03-01", None)).unwrap();

        let from = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let listed = list_blocked_dates(&conn, &admin, &from).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, new.id);

        delete_blocked_date(&conn, &admin, old.id).unwrap();
        assert!(matches!(
            delete_blocked_date(&conn, &admin, old.id),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete_blocked_date(&conn, &ViewerContext::user(3), new.id),
            Err(AppError::Forbidden(_))
        ));
    }
}
