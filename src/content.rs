use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, SqlitePool, sqlite::SqliteRow};
use time::OffsetDateTime;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::Error,
    utils::{from_timestamp_millis, timestamp_millis},
};

/// A weekly chapter release. Wire names are camelCase because the
/// front-end page consumes these records directly.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: i64,
    pub chapter_number: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub release_date: OffsetDateTime,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_text: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub chapters_covered: Vec<i64>,
    /// Minutes allowed.
    pub time_limit: i64,
    pub is_active: bool,
}

/// Creation request for a chapter. Required fields are checked here at
/// the store boundary rather than by the deserializer, so a missing
/// title comes back as a 400 with a message instead of a body
/// rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewChapter {
    pub chapter_number: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub pdf_url: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub release_date: Option<OffsetDateTime>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub chapters_covered: Vec<i64>,
    pub time_limit: Option<i64>,
}

impl<'r> FromRow<'r, SqliteRow> for Chapter {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let release_date: i64 = row.try_get("release_date")?;
        let release_date =
            from_timestamp_millis(release_date).map_err(|e| sqlx::Error::ColumnDecode {
                index: "release_date".into(),
                source: Box::new(e),
            })?;
        Ok(Chapter {
            id: row.try_get("id")?,
            chapter_number: row.try_get("chapter_number")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            content: row.try_get("content")?,
            pdf_url: row.try_get("pdf_url")?,
            release_date,
            is_active: row.try_get("is_active")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for Test {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let questions: String = row.try_get("questions")?;
        let questions = serde_json::from_str(&questions).map_err(|e| sqlx::Error::ColumnDecode {
            index: "questions".into(),
            source: Box::new(e),
        })?;
        let chapters_covered: String = row.try_get("chapters_covered")?;
        let chapters_covered =
            serde_json::from_str(&chapters_covered).map_err(|e| sqlx::Error::ColumnDecode {
                index: "chapters_covered".into(),
                source: Box::new(e),
            })?;
        Ok(Test {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            questions,
            chapters_covered,
            time_limit: row.try_get("time_limit")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

const CHAPTER_COLUMNS: &str =
    "id, chapter_number, title, description, content, pdf_url, release_date, is_active";

/// Persist a new chapter. Chapters are born active; the release date
/// defaults to now when the request leaves it out.
pub async fn create_chapter(db: &SqlitePool, new: NewChapter) -> Result<Chapter, Error> {
    let title = match new.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(Error::Validation("chapter title is required".into())),
    };
    let chapter_number = new
        .chapter_number
        .ok_or_else(|| Error::Validation("chapterNumber is required".into()))?;
    let release_date = new.release_date.unwrap_or_else(OffsetDateTime::now_utc);
    let result = sqlx::query(
        r"
        INSERT INTO chapter (chapter_number, title, description, content, pdf_url, release_date, is_active)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
        ",
    )
    .bind(chapter_number)
    .bind(&title)
    .bind(&new.description)
    .bind(&new.content)
    .bind(&new.pdf_url)
    .bind(timestamp_millis(release_date))
    .execute(db)
    .await?;
    let id = result.last_insert_rowid();
    info!("created chapter {id} ({chapter_number}: {title})");
    Ok(Chapter {
        id,
        chapter_number,
        title,
        description: new.description,
        content: new.content,
        pdf_url: new.pdf_url,
        release_date,
        is_active: true,
    })
}

/// Persist a new test. Every question's answer index must point into
/// its own options list, otherwise the whole request is rejected and
/// nothing is stored.
pub async fn create_test(db: &SqlitePool, new: NewTest) -> Result<Test, Error> {
    let title = match new.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(Error::Validation("test title is required".into())),
    };
    let time_limit = match new.time_limit {
        Some(minutes) if minutes > 0 => minutes,
        Some(_) => return Err(Error::Validation("timeLimit must be positive".into())),
        None => return Err(Error::Validation("timeLimit is required".into())),
    };
    for (i, question) in new.questions.iter().enumerate() {
        if question.correct_answer >= question.options.len() {
            return Err(Error::Validation(format!(
                "question {}: correctAnswer {} is out of range for {} options",
                i + 1,
                question.correct_answer,
                question.options.len()
            )));
        }
    }
    let questions = serde_json::to_string(&new.questions)
        .map_err(|e| Error::Validation(format!("invalid questions: {e}")))?;
    let chapters_covered = serde_json::to_string(&new.chapters_covered)
        .map_err(|e| Error::Validation(format!("invalid chaptersCovered: {e}")))?;
    let result = sqlx::query(
        r"
        INSERT INTO test (title, description, questions, chapters_covered, time_limit, is_active)
        VALUES (?1, ?2, ?3, ?4, ?5, 1)
        ",
    )
    .bind(&title)
    .bind(&new.description)
    .bind(&questions)
    .bind(&chapters_covered)
    .bind(time_limit)
    .execute(db)
    .await?;
    let id = result.last_insert_rowid();
    info!("created test {id} ({title})");
    Ok(Test {
        id,
        title,
        description: new.description,
        questions: new.questions,
        chapters_covered: new.chapters_covered,
        time_limit,
        is_active: true,
    })
}

/// The active chapter with the most recent release date, future ones
/// included. Equal release dates fall back to rowid order so the
/// result stays stable.
pub async fn current_chapter(db: &SqlitePool) -> Result<Option<Chapter>, Error> {
    let chapter = sqlx::query_as::<_, Chapter>(&format!(
        r"
        SELECT {CHAPTER_COLUMNS} FROM chapter
        WHERE is_active = 1
        ORDER BY release_date DESC, id DESC
        LIMIT 1
        "
    ))
    .fetch_optional(db)
    .await?;
    Ok(chapter)
}

/// The next test to sit. Tests carry no release date of their own, so
/// the newest active test (by rowid) deterministically stands in for
/// "upcoming".
pub async fn upcoming_test(db: &SqlitePool) -> Result<Option<Test>, Error> {
    let test = sqlx::query_as::<_, Test>(
        r"
        SELECT id, title, description, questions, chapters_covered, time_limit, is_active
        FROM test
        WHERE is_active = 1
        ORDER BY id DESC
        LIMIT 1
        ",
    )
    .fetch_optional(db)
    .await?;
    Ok(test)
}

/// Active chapters released strictly before `now`, newest first.
pub async fn previous_chapters(
    db: &SqlitePool,
    now: OffsetDateTime,
) -> Result<Vec<Chapter>, Error> {
    let chapters = sqlx::query_as::<_, Chapter>(&format!(
        r"
        SELECT {CHAPTER_COLUMNS} FROM chapter
        WHERE is_active = 1 AND release_date < ?1
        ORDER BY release_date DESC
        "
    ))
    .bind(timestamp_millis(now))
    .fetch_all(db)
    .await?;
    Ok(chapters)
}

pub async fn count_active_chapters(db: &SqlitePool) -> Result<i64, Error> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chapter WHERE is_active = 1")
        .fetch_one(db)
        .await?;
    Ok(count)
}
