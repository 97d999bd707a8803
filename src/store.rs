use std::{path::Path, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::error::Error;

/// Open (or create) the course database.
pub async fn connect(path: impl AsRef<Path>) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create the schema if it does not exist yet. Safe to run on every
/// startup.
///
/// `chapter_completion` is keyed on `(user_id, chapter_number)`;
/// completion inserts go through `INSERT OR IGNORE` against that key.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), Error> {
    const SCHEMA: &[&str] = &[
        r"
        CREATE TABLE IF NOT EXISTS chapter (
            id INTEGER PRIMARY KEY,
            chapter_number INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            content TEXT,
            pdf_url TEXT,
            release_date INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );
        ",
        r"
        CREATE INDEX IF NOT EXISTS idx_chapter_active_release
            ON chapter (is_active, release_date);
        ",
        r"
        CREATE TABLE IF NOT EXISTS test (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            questions TEXT NOT NULL,
            chapters_covered TEXT NOT NULL,
            time_limit INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );
        ",
        r"
        CREATE TABLE IF NOT EXISTS chapter_completion (
            user_id TEXT NOT NULL,
            chapter_number INTEGER NOT NULL,
            completed_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, chapter_number)
        );
        ",
        r"
        CREATE TABLE IF NOT EXISTS test_score (
            user_id TEXT NOT NULL,
            test_id INTEGER NOT NULL,
            score INTEGER NOT NULL,
            date_taken INTEGER NOT NULL
        );
        ",
    ];
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
