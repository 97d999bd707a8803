use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::{content, error::Error, progress};

/// Completion summary shown on the front page: completed chapters out
/// of all active ones, as a rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProgressSummary {
    pub completed: i64,
    pub total: i64,
    pub progress: i64,
}

/// Percentage is computed on the real-valued ratio and rounded
/// half-away-from-zero (`f64::round`); a course with no active
/// chapters reads as 0%, not a division error.
pub async fn progress_summary(db: &SqlitePool, user_id: &str) -> Result<ProgressSummary, Error> {
    let completed = progress::get_progress(db, user_id)
        .await?
        .chapters_completed
        .len() as i64;
    let total = content::count_active_chapters(db).await?;
    let percent = if total > 0 {
        ((completed as f64 / total as f64) * 100.0).round() as i64
    } else {
        0
    };
    Ok(ProgressSummary {
        completed,
        total,
        progress: percent,
    })
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::{
        content::{NewChapter, create_chapter},
        progress::mark_chapter_completed,
        store::test_pool,
    };

    async fn seed_chapters(db: &SqlitePool, count: i64) {
        for n in 1..=count {
            create_chapter(
                db,
                NewChapter {
                    chapter_number: Some(n),
                    title: Some(format!("Chapter {n}")),
                    release_date: Some(OffsetDateTime::now_utc()),
                    ..NewChapter::default()
                },
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn zero_active_chapters_means_zero_percent() {
        let db = test_pool().await;
        let summary = progress_summary(&db, "demo-user").await.unwrap();
        assert_eq!(
            summary,
            ProgressSummary {
                completed: 0,
                total: 0,
                progress: 0
            }
        );
    }

    #[tokio::test]
    async fn fresh_user_with_chapters_is_zero_of_total() {
        let db = test_pool().await;
        seed_chapters(&db, 4).await;
        let summary = progress_summary(&db, "demo-user").await.unwrap();
        assert_eq!(
            summary,
            ProgressSummary {
                completed: 0,
                total: 4,
                progress: 0
            }
        );
    }

    #[tokio::test]
    async fn percent_rounds_the_ratio() {
        let db = test_pool().await;
        seed_chapters(&db, 3).await;
        mark_chapter_completed(&db, "demo-user", 1).await.unwrap();
        // 1/3 -> 33.33 -> 33
        let summary = progress_summary(&db, "demo-user").await.unwrap();
        assert_eq!(summary.progress, 33);
        mark_chapter_completed(&db, "demo-user", 2).await.unwrap();
        // 2/3 -> 66.67 -> 67
        let summary = progress_summary(&db, "demo-user").await.unwrap();
        assert_eq!(summary.progress, 67);
        mark_chapter_completed(&db, "demo-user", 3).await.unwrap();
        let summary = progress_summary(&db, "demo-user").await.unwrap();
        assert_eq!(
            summary,
            ProgressSummary {
                completed: 3,
                total: 3,
                progress: 100
            }
        );
    }

    #[tokio::test]
    async fn duplicate_completion_does_not_inflate_percent() {
        let db = test_pool().await;
        seed_chapters(&db, 2).await;
        mark_chapter_completed(&db, "demo-user", 1).await.unwrap();
        mark_chapter_completed(&db, "demo-user", 1).await.unwrap();
        let summary = progress_summary(&db, "demo-user").await.unwrap();
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.progress, 50);
    }
}
