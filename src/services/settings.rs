use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppResult;
use crate::models::{SettingsPatch, SystemSettings, ViewerContext};

/// Current settings as every operation sees them.
pub fn load(conn: &Connection) -> AppResult<SystemSettings> {
    Ok(queries::get_settings(conn)?)
}

pub fn get_settings(conn: &Connection, viewer: &ViewerContext) -> AppResult<SystemSettings> {
    viewer.require_admin("view system settings")?;
    load(conn)
}

/// Applies `patch` on top of the stored settings. Existing bookings are not
/// re-evaluated.
pub fn update_settings(
    conn: &Connection,
    viewer: &ViewerContext,
    patch: SettingsPatch,
) -> AppResult<SystemSettings> {
    viewer.require_admin("update system settings")?;

    let updated = patch.apply(load(conn)?);
    updated.validate()?;
    queries::save_settings(conn, &updated)?;

    tracing::info!(admin_id = viewer.user_id, ?updated, "system settings updated");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::errors::AppError;

    #[test]
    fn test_update_persists_and_validates() {
        let conn = db::init_db(":memory:").unwrap();
        let admin = ViewerContext::admin(1);

        let updated = update_settings(
            &conn,
            &admin,
            SettingsPatch {
                slot_granularity_minutes: Some(30),
                require_approval_for_morning_walks: Some(false),
                ..SettingsPatch::default()
            },
        )
        .unwrap();
        assert_eq!(updated.slot_granularity_minutes, 30);
        assert_eq!(load(&conn).unwrap(), updated);

        let bad = update_settings(
            &conn,
            &admin,
            SettingsPatch {
                slot_granularity_minutes: Some(7),
                ..SettingsPatch::default()
            },
        );
        assert!(matches!(bad, Err(AppError::InvalidInput(_))));
        assert_eq!(load(&conn).unwrap().slot_granularity_minutes, 30);
    }

    #[test]
    fn test_update_rejects_unbounded_horizon() {
        let conn = db::init_db(":memory:").unwrap();
        let admin = ViewerContext::admin(1);

        let result = update_settings(
            &conn,
            &admin,
            SettingsPatch {
                booking_advance_days: Some(1_000_000_000),
                ..SettingsPatch::default()
            },
        );
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(load(&conn).unwrap().booking_advance_days, 14);
    }

    #[test]
    fn test_settings_are_admin_only() {
        let conn = db::init_db(":memory:").unwrap();
        let user = ViewerContext::user(5);
        assert!(matches!(get_settings(&conn, &user), Err(AppError::Forbidden(_))));
        assert!(matches!(
            update_settings(&conn, &user, SettingsPatch::default()),
            Err(AppError::Forbidden(_))
        ));
    }
}
