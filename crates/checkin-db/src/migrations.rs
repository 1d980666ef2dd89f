use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (guests)");
        conn.execute_batch(
            "
            CREATE TABLE guests (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                email           TEXT NOT NULL DEFAULT '',
                phone           TEXT NOT NULL DEFAULT '',
                confirmation    TEXT NOT NULL DEFAULT '',
                message         TEXT,
                confirmed_at    TEXT,
                checked_in_at   TEXT,
                category        TEXT
            );

            CREATE INDEX idx_guests_name ON guests(name);
            CREATE INDEX idx_guests_checked_in ON guests(checked_in_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
