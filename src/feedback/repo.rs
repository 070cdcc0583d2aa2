use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub email: String,
    pub message: String,
    pub rating: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    email: &str,
    message: &str,
    rating: i32,
) -> anyhow::Result<Feedback> {
    let row = sqlx::query_as::<_, Feedback>(
        r#"
        INSERT INTO feedbacks (id, email, message, rating)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, message, rating, submitted_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(message)
    .bind(rating)
    .fetch_one(db)
    .await
    .context("insert feedback")?;
    Ok(row)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Feedback>> {
    let row = sqlx::query_as::<_, Feedback>(
        r#"
        SELECT id, email, message, rating, submitted_at
          FROM feedbacks
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("get feedback")?;
    Ok(row)
}

/// Returns whether a row was removed.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(r#"DELETE FROM feedbacks WHERE id = $1"#)
        .bind(id)
        .execute(db)
        .await
        .context("delete feedback")?;
    Ok(res.rows_affected() > 0)
}

/// Filtered page plus the total count of matching rows. The email filter is
/// a substring match.
pub async fn list(
    db: &PgPool,
    rating: Option<i32>,
    email: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<(Vec<Feedback>, i64)> {
    let pattern = email.map(|e| format!("%{}%", escape_like(e)));

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
          FROM feedbacks
         WHERE ($1::INT IS NULL OR rating = $1)
           AND ($2::TEXT IS NULL OR email LIKE $2 ESCAPE '\')
        "#,
    )
    .bind(rating)
    .bind(pattern.as_deref())
    .fetch_one(db)
    .await
    .context("count feedback")?;

    let rows = sqlx::query_as::<_, Feedback>(
        r#"
        SELECT id, email, message, rating, submitted_at
          FROM feedbacks
         WHERE ($1::INT IS NULL OR rating = $1)
           AND ($2::TEXT IS NULL OR email LIKE $2 ESCAPE '\')
         ORDER BY submitted_at DESC
         LIMIT $3 OFFSET $4
        "#,
    )
    .bind(rating)
    .bind(pattern.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list feedback")?;

    Ok((rows, total))
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
