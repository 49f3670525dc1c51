use sqlx::{Pool, Postgres};

use super::error::Result;
use crate::models::CommentView;

/// Appends a comment. There is no update or delete path.
pub async fn add_comment(
    pool: &Pool<Postgres>,
    message: &str,
    specialist_id: i32,
    request_id: i32,
) -> Result<bool> {
    let rows = sqlx::query(
        r#"
        INSERT INTO comments (message, specialist_id, request_id, created_at)
        VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(message)
    .bind(specialist_id)
    .bind(request_id)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows > 0)
}

/// Comments on one request, newest first.
pub async fn list_by_request(pool: &Pool<Postgres>, request_id: i32) -> Result<Vec<CommentView>> {
    let comments = sqlx::query_as::<_, CommentView>(
        r#"
        SELECT c.comment_id, c.message, c.created_at,
               u.full_name AS specialist_name
        FROM comments c
        JOIN users u ON c.specialist_id = u.user_id
        WHERE c.request_id = $1
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(request_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}
