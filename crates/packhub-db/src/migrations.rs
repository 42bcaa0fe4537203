use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            username      TEXT NOT NULL UNIQUE,
            display_name  TEXT NOT NULL DEFAULT '',
            token         TEXT NOT NULL UNIQUE,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS packs (
            id            TEXT PRIMARY KEY,
            kind          TEXT NOT NULL,
            name          TEXT NOT NULL,
            description   TEXT NOT NULL DEFAULT '',
            author_id     TEXT NOT NULL REFERENCES users(id),
            author_name   TEXT NOT NULL DEFAULT '',
            version       TEXT NOT NULL DEFAULT '1.0.0',
            system_prompt TEXT NOT NULL DEFAULT '',
            rules         TEXT NOT NULL DEFAULT '[]',
            memos         TEXT NOT NULL DEFAULT '[]',
            tags          TEXT NOT NULL DEFAULT '[]',
            downloads     INTEGER NOT NULL DEFAULT 0,
            published     INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_packs_kind_published
            ON packs(kind, published);

        CREATE INDEX IF NOT EXISTS idx_packs_author
            ON packs(author_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
