use thiserror::Error;

/// Storage-layer failures, split so callers can tell a missing row from a
/// violated constraint from a dead connection.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found")]
    NotFound,

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("query error: {0}")]
    Query(String),
}

// Postgres SQLSTATE classes: 23505 unique_violation, 23503 foreign_key_violation.
impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("23505") => DbError::Duplicate(db.to_string()),
                Some("23503") | Some("23502") | Some("23514") => {
                    DbError::Constraint(db.to_string())
                }
                _ => DbError::Query(db.to_string()),
            },
            sqlx::Error::Io(e) => DbError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => DbError::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut => DbError::Connection("pool timed out".into()),
            sqlx::Error::PoolClosed => DbError::Connection("pool closed".into()),
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }

    #[test]
    fn pool_errors_map_to_connection() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::Connection(_)
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::Connection(_)
        ));
    }
}
