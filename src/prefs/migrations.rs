use rusqlite::Connection;

use super::PrefError;

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: r#"
CREATE TABLE view_prefs (
    view_key     TEXT PRIMARY KEY,
    columns_json TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);
"#,
}];

pub fn run_migrations(conn: &Connection) -> Result<(), PrefError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY)",
        [],
    )?;

    let applied: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        conn.execute_batch(migration.sql)
            .map_err(|e| PrefError::Migration(format!("version {}: {e}", migration.version)))?;
        conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [migration.version],
        )?;
    }

    Ok(())
}
