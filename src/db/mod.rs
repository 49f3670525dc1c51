use log::info;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub mod comments;
pub mod error;
pub mod requests;
pub mod users;

pub use error::{DbError, Result};

/// Opens a bounded pool and applies the embedded migrations.
///
/// Connection failures propagate; per-operation failures are the caller's
/// to handle via [`DbError`].
pub async fn connect(database_url: &str) -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let _: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
    info!("database ready");

    Ok(pool)
}
