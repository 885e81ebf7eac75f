use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, messages)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                name                TEXT NOT NULL,
                email               TEXT NOT NULL UNIQUE,
                password            TEXT NOT NULL,
                role                TEXT NOT NULL DEFAULT 'user'
                                    CHECK (role IN ('admin', 'user')),
                email_verified_at   TEXT,
                created_at          TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title           TEXT NOT NULL,
                message         TEXT NOT NULL,
                is_spam         INTEGER NOT NULL DEFAULT 0,
                is_real_spam    INTEGER NOT NULL DEFAULT 0,
                emotion         TEXT NOT NULL DEFAULT 'neutral'
                                CHECK (emotion IN ('anger', 'joy', 'sadness', 'neutral', 'fear', 'surprise')),
                emotion_real    TEXT NOT NULL DEFAULT 'neutral'
                                CHECK (emotion_real IN ('anger', 'joy', 'sadness', 'neutral', 'fear', 'surprise')),
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_messages_user
                ON messages(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
