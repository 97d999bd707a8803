use serde::Serialize;
use sqlx::{FromRow, Row, SqlitePool, sqlite::SqliteRow};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{
    error::Error,
    utils::{from_timestamp_millis, timestamp_millis},
};

/// A recorded test result. Readable as part of the progress record;
/// nothing writes these yet because grading happens outside the
/// server for now.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestScore {
    pub test_id: i64,
    pub score: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub date_taken: OffsetDateTime,
}

/// Per-user progress, assembled on read from the completion and score
/// tables. There is no stored progress row to get out of sync, so the
/// one-record-per-user invariant holds by construction.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub chapters_completed: Vec<i64>,
    pub test_scores: Vec<TestScore>,
}

impl<'r> FromRow<'r, SqliteRow> for TestScore {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let date_taken: i64 = row.try_get("date_taken")?;
        let date_taken =
            from_timestamp_millis(date_taken).map_err(|e| sqlx::Error::ColumnDecode {
                index: "date_taken".into(),
                source: Box::new(e),
            })?;
        Ok(TestScore {
            test_id: row.try_get("test_id")?,
            score: row.try_get("score")?,
            date_taken,
        })
    }
}

/// Record that a user finished a chapter. The insert is a single
/// atomic set-add against the `(user_id, chapter_number)` key, so the
/// call is idempotent and concurrent completions cannot clobber each
/// other.
pub async fn mark_chapter_completed(
    db: &SqlitePool,
    user_id: &str,
    chapter_number: i64,
) -> Result<(), Error> {
    sqlx::query(
        r"
        INSERT OR IGNORE INTO chapter_completion (user_id, chapter_number, completed_at)
        VALUES (?1, ?2, ?3)
        ",
    )
    .bind(user_id)
    .bind(chapter_number)
    .bind(timestamp_millis(OffsetDateTime::now_utc()))
    .execute(db)
    .await?;
    Ok(())
}

/// Read-only: a user with no history gets an empty record, never a
/// freshly persisted one.
pub async fn get_progress(db: &SqlitePool, user_id: &str) -> Result<UserProgress, Error> {
    let chapters_completed = sqlx::query_scalar::<_, i64>(
        r"
        SELECT chapter_number FROM chapter_completion
        WHERE user_id = ?1
        ORDER BY completed_at, chapter_number
        ",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    let test_scores = sqlx::query_as::<_, TestScore>(
        r"
        SELECT test_id, score, date_taken FROM test_score
        WHERE user_id = ?1
        ORDER BY date_taken
        ",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(UserProgress {
        user_id: user_id.to_string(),
        chapters_completed,
        test_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_pool;

    #[tokio::test]
    async fn fresh_user_has_empty_record() {
        let db = test_pool().await;
        let progress = get_progress(&db, "demo-user").await.unwrap();
        assert!(progress.chapters_completed.is_empty());
        assert!(progress.test_scores.is_empty());
    }

    #[tokio::test]
    async fn marking_twice_keeps_a_single_entry() {
        let db = test_pool().await;
        mark_chapter_completed(&db, "demo-user", 1).await.unwrap();
        mark_chapter_completed(&db, "demo-user", 1).await.unwrap();
        let progress = get_progress(&db, "demo-user").await.unwrap();
        assert_eq!(progress.chapters_completed, vec![1]);
    }

    #[tokio::test]
    async fn users_do_not_share_completions() {
        let db = test_pool().await;
        mark_chapter_completed(&db, "alice", 1).await.unwrap();
        mark_chapter_completed(&db, "alice", 2).await.unwrap();
        mark_chapter_completed(&db, "bob", 3).await.unwrap();
        let alice = get_progress(&db, "alice").await.unwrap();
        let bob = get_progress(&db, "bob").await.unwrap();
        assert_eq!(alice.chapters_completed, vec![1, 2]);
        assert_eq!(bob.chapters_completed, vec![3]);
    }

    #[tokio::test]
    async fn get_progress_does_not_create_rows() {
        let db = test_pool().await;
        get_progress(&db, "demo-user").await.unwrap();
        let rows =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chapter_completion")
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(rows, 0);
    }
}
