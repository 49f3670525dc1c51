use sqlx::{Pool, Postgres};

use super::error::{DbError, Result};
use crate::auth;
use crate::models::{Specialist, UserAccount, ROLE_SPECIALIST};

#[derive(sqlx::FromRow)]
struct AccountRow {
    user_id: i32,
    full_name: String,
    phone: String,
    login: String,
    role: String,
    password: String,
}

/// Inserts a user with a freshly hashed password and returns the new id.
///
/// Login is the natural key: if it is already taken, the existing row's id
/// is returned instead and no fields are updated.
pub async fn add_user(
    pool: &Pool<Postgres>,
    full_name: &str,
    phone: &str,
    login: &str,
    password: &str,
    role: &str,
) -> Result<i32> {
    let hash = auth::hash_password(password).map_err(|e| DbError::Query(e.to_string()))?;

    let inserted = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO users (full_name, phone, login, password, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING user_id
        "#,
    )
    .bind(full_name)
    .bind(phone)
    .bind(login)
    .bind(&hash)
    .bind(role)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(user_id) => Ok(user_id),
        Err(e) => match DbError::from(e) {
            DbError::Duplicate(_) => {
                sqlx::query_scalar::<_, i32>("SELECT user_id FROM users WHERE login = $1")
                    .bind(login)
                    .fetch_optional(pool)
                    .await?
                    .ok_or(DbError::NotFound)
            }
            other => Err(other),
        },
    }
}

/// Fetches the row by login and checks the password against the stored
/// hash. Returns the public fields only; unknown login and bad password
/// are both `None`.
pub async fn authenticate(
    pool: &Pool<Postgres>,
    login: &str,
    password: &str,
) -> Result<Option<UserAccount>> {
    let row = sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT user_id, full_name, phone, login, role, password
        FROM users
        WHERE login = $1
        "#,
    )
    .bind(login)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|r| {
        if auth::verify_password(&r.password, password) {
            Some(UserAccount {
                user_id: r.user_id,
                full_name: r.full_name,
                phone: r.phone,
                login: r.login,
                role: r.role,
            })
        } else {
            None
        }
    }))
}

pub async fn list_users(pool: &Pool<Postgres>) -> Result<Vec<UserAccount>> {
    let users = sqlx::query_as::<_, UserAccount>(
        r#"
        SELECT user_id, full_name, phone, login, role
        FROM users
        ORDER BY user_id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn delete_user(pool: &Pool<Postgres>, user_id: i32) -> Result<bool> {
    let rows = sqlx::query("DELETE FROM users WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn set_role(pool: &Pool<Postgres>, user_id: i32, role: &str) -> Result<bool> {
    let rows = sqlx::query("UPDATE users SET role = $1 WHERE user_id = $2")
        .bind(role)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

/// Specialists eligible for assignment, ordered by name.
pub async fn list_specialists(pool: &Pool<Postgres>) -> Result<Vec<Specialist>> {
    let specialists = sqlx::query_as::<_, Specialist>(
        r#"
        SELECT user_id, full_name, phone
        FROM users
        WHERE role = $1
        ORDER BY full_name
        "#,
    )
    .bind(ROLE_SPECIALIST)
    .fetch_all(pool)
    .await?;
    Ok(specialists)
}
