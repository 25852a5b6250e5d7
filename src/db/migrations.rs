use anyhow::Context;
use rusqlite::Connection;

/// Schema files, applied in order. Embedded so in-memory databases and
/// relocated binaries get the same schema.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial.sql",
        include_str!("../../migrations/001_initial.sql"),
    ),
    (
        "002_default_data.sql",
        include_str!("../../migrations/002_default_data.sql"),
    ),
    (
        "003_plain_dates.sql",
        include_str!("../../migrations/003_plain_dates.sql"),
    ),
];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);

        let rules: i64 = conn
            .query_row("SELECT COUNT(*) FROM booking_time_rules", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rules, 13);
    }

    #[test]
    fn test_timestamp_dates_are_rewritten_as_plain_dates() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute("DELETE FROM _migrations WHERE name = '003_plain_dates.sql'", [])
            .unwrap();
        conn.execute(
            "INSERT INTO blocked_dates (date, dog_id, reason, created_by)
             VALUES ('2025-01-28T00:00:00Z', 7, 'vet', 1)",
            [],
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let date: String = conn
            .query_row("SELECT date FROM blocked_dates", [], |row| row.get(0))
            .unwrap();
        assert_eq!(date, "2025-01-28");
    }
}
