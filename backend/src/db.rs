use crate::errors::ApiError;
use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use uuid::Uuid;

pub type Db = Pool<Sqlite>;

pub async fn connect(db_url: &str) -> Result<Db, ApiError> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(|e| ApiError::Store(e.to_string()))
}

pub async fn init_schema(db: &Db) -> Result<(), ApiError> {
    // NOTE: Submissions are append-only facts. No UPDATE or DELETE exists in
    // this crate, and (subject_id, digest_hex) is deliberately not unique:
    // identical digests from different participants are expected and counted.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS submissions (
  id TEXT PRIMARY KEY,
  subject_id TEXT NOT NULL,
  digest_hex TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_submissions_subject ON submissions (subject_id);
"#,
    )
    .execute(db)
    .await
    .map_err(|e| ApiError::Store(e.to_string()))?;

    Ok(())
}

/// Append one verified submission. The only mutation in the crate.
///
/// Callers must have verified the proof already; the store never calls back
/// into the verifier.
pub async fn insert_submission(
    db: &Db,
    submission_id: Uuid,
    subject_id: &str,
    digest_hex: &str,
) -> Result<(), ApiError> {
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO submissions (id, subject_id, digest_hex, created_at)
           VALUES (?, ?, ?, ?)"#,
    )
    .bind(submission_id.to_string())
    .bind(subject_id)
    .bind(digest_hex)
    .bind(created_at)
    .execute(db)
    .await
    .map_err(|e| ApiError::Store(e.to_string()))?;

    Ok(())
}

pub async fn list_digests_by_subject(db: &Db, subject_id: &str) -> Result<Vec<String>, ApiError> {
    let rows = sqlx::query(r#"SELECT digest_hex FROM submissions WHERE subject_id = ?"#)
        .bind(subject_id)
        .fetch_all(db)
        .await
        .map_err(|e| ApiError::Store(e.to_string()))?;

    Ok(rows.into_iter().map(|row| row.get(0)).collect())
}

/// Per-digest frequency counts for one subject.
///
/// A subject with no submissions yields an empty vector, not an error.
pub async fn count_by_digest(db: &Db, subject_id: &str) -> Result<Vec<(String, u64)>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT digest_hex, COUNT(*) AS c
           FROM submissions
           WHERE subject_id = ?
           GROUP BY digest_hex"#,
    )
    .bind(subject_id)
    .fetch_all(db)
    .await
    .map_err(|e| ApiError::Store(e.to_string()))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let digest_hex: String = row.get(0);
        let count: i64 = row.get(1);
        out.push((digest_hex, count as u64));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Db {
        // One connection: a pooled in-memory sqlite gets a fresh database
        // per connection otherwise.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn append_is_visible_to_subsequent_lists() {
        let db = test_db().await;

        insert_submission(&db, Uuid::new_v4(), "1", "aa").await.unwrap();
        let digests = list_digests_by_subject(&db, "1").await.unwrap();
        assert_eq!(digests, vec!["aa".to_string()]);
    }

    #[tokio::test]
    async fn counts_group_by_digest_per_subject() {
        let db = test_db().await;

        // Two participants agree on d1, one says d2; another subject is untouched.
        insert_submission(&db, Uuid::new_v4(), "2", "d1").await.unwrap();
        insert_submission(&db, Uuid::new_v4(), "2", "d1").await.unwrap();
        insert_submission(&db, Uuid::new_v4(), "2", "d2").await.unwrap();
        insert_submission(&db, Uuid::new_v4(), "3", "d1").await.unwrap();

        let mut counts = count_by_digest(&db, "2").await.unwrap();
        counts.sort();
        assert_eq!(counts, vec![("d1".to_string(), 2), ("d2".to_string(), 1)]);

        // Sum of counts equals the submission count for the subject.
        let total: u64 = counts.iter().map(|(_, c)| *c).sum();
        assert_eq!(total as usize, list_digests_by_subject(&db, "2").await.unwrap().len());
    }

    #[tokio::test]
    async fn empty_subject_yields_empty_results() {
        let db = test_db().await;
        assert!(count_by_digest(&db, "404").await.unwrap().is_empty());
        assert!(list_digests_by_subject(&db, "404").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_identical_digests_are_all_kept() {
        let db = test_db().await;
        for _ in 0..3 {
            insert_submission(&db, Uuid::new_v4(), "1", "same").await.unwrap();
        }
        let counts = count_by_digest(&db, "1").await.unwrap();
        assert_eq!(counts, vec![("same".to_string(), 3)]);
    }
}
