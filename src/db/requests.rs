use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use super::error::Result;
use crate::models::{
    RequestDetail, RequestStatus, RequestSummary, SearchHit, Statistics, StatusCount, TypeCount,
};

/// Inserts a request with status `new`, `start_date` today and `due_date`
/// a week out. Returns the new id.
pub async fn add_request(
    pool: &Pool<Postgres>,
    equipment_type: &str,
    equipment_model: &str,
    problem_description: &str,
    client_id: i32,
) -> Result<i32> {
    let request_id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO requests (
            equipment_type,
            equipment_model,
            problem_description,
            client_id,
            status,
            start_date,
            due_date
        )
        VALUES ($1, $2, $3, $4, $5, CURRENT_DATE, CURRENT_DATE + 7)
        RETURNING request_id
        "#,
    )
    .bind(equipment_type)
    .bind(equipment_model)
    .bind(problem_description)
    .bind(client_id)
    .bind(RequestStatus::New.as_str())
    .fetch_one(pool)
    .await?;

    Ok(request_id)
}

const LIST_SELECT: &str = r#"
    SELECT r.request_id, r.start_date, r.equipment_type,
           r.equipment_model, r.problem_description, r.status,
           u_client.full_name AS client_name,
           u_specialist.full_name AS specialist_name
    FROM requests r
    JOIN users u_client ON r.client_id = u_client.user_id
    LEFT JOIN users u_specialist ON r.specialist_id = u_specialist.user_id
"#;

/// Lists requests newest first, optionally filtered to one status label.
pub async fn list_requests(
    pool: &Pool<Postgres>,
    status: Option<&str>,
) -> Result<Vec<RequestSummary>> {
    let requests = match status {
        Some(status) => {
            let query = format!("{LIST_SELECT} WHERE r.status = $1 ORDER BY r.request_id DESC");
            sqlx::query_as::<_, RequestSummary>(&query)
                .bind(status)
                .fetch_all(pool)
                .await?
        }
        None => {
            let query = format!("{LIST_SELECT} ORDER BY r.request_id DESC");
            sqlx::query_as::<_, RequestSummary>(&query)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(requests)
}

pub async fn get_request(pool: &Pool<Postgres>, request_id: i32) -> Result<Option<RequestDetail>> {
    let request = sqlx::query_as::<_, RequestDetail>(
        r#"
        SELECT r.request_id, r.start_date, r.equipment_type,
               r.equipment_model, r.problem_description, r.status,
               r.due_date, r.completion_date,
               u_client.full_name AS client_name,
               u_specialist.full_name AS specialist_name
        FROM requests r
        JOIN users u_client ON r.client_id = u_client.user_id
        LEFT JOIN users u_specialist ON r.specialist_id = u_specialist.user_id
        WHERE r.request_id = $1
        "#,
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Assigns a specialist and moves the request into repair. A request that
/// is already ready for pickup is left untouched (zero rows affected).
pub async fn assign_specialist(
    pool: &Pool<Postgres>,
    request_id: i32,
    specialist_id: i32,
) -> Result<bool> {
    let rows = sqlx::query(
        r#"
        UPDATE requests
        SET specialist_id = $1,
            status = $2
        WHERE request_id = $3
          AND status != $4
        "#,
    )
    .bind(specialist_id)
    .bind(RequestStatus::InRepair.as_str())
    .bind(request_id)
    .bind(RequestStatus::ReadyForPickup.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows > 0)
}

/// Sets the status label. Moving into `ready for pickup` also stamps the
/// completion date; any other label leaves it as is. Labels are not
/// validated here: the import path replays historical ones verbatim.
pub async fn update_status(pool: &Pool<Postgres>, request_id: i32, status: &str) -> Result<bool> {
    let rows = sqlx::query(
        r#"
        UPDATE requests
        SET status = $1,
            completion_date = CASE
                WHEN $1 = $2 THEN CURRENT_DATE
                ELSE completion_date
            END
        WHERE request_id = $3
        "#,
    )
    .bind(status)
    .bind(RequestStatus::ReadyForPickup.as_str())
    .bind(request_id)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows > 0)
}

/// Moves the due date. Fails (zero rows affected) once the request is
/// ready for pickup.
pub async fn extend_due_date(
    pool: &Pool<Postgres>,
    request_id: i32,
    new_due_date: NaiveDate,
) -> Result<bool> {
    let rows = sqlx::query(
        r#"
        UPDATE requests
        SET due_date = $1
        WHERE request_id = $2
          AND status != $3
        "#,
    )
    .bind(new_due_date)
    .bind(request_id)
    .bind(RequestStatus::ReadyForPickup.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows > 0)
}

/// Case-insensitive substring search across equipment type, model and
/// problem text plus client name; the id (as text) and client phone match
/// the raw substring. One wildcarded term, bound six times.
pub async fn search(pool: &Pool<Postgres>, term: &str) -> Result<Vec<SearchHit>> {
    let pattern = format!("%{term}%");

    let hits = sqlx::query_as::<_, SearchHit>(
        r#"
        SELECT r.request_id, r.start_date, r.equipment_type,
               r.equipment_model, r.problem_description, r.status,
               u_client.full_name AS client_name,
               u_client.phone AS client_phone,
               u_specialist.full_name AS specialist_name
        FROM requests r
        JOIN users u_client ON r.client_id = u_client.user_id
        LEFT JOIN users u_specialist ON r.specialist_id = u_specialist.user_id
        WHERE
            r.request_id::TEXT LIKE $1 OR
            r.equipment_type ILIKE $2 OR
            r.equipment_model ILIKE $3 OR
            r.problem_description ILIKE $4 OR
            u_client.full_name ILIKE $5 OR
            u_client.phone LIKE $6
        ORDER BY r.request_id DESC
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;

    Ok(hits)
}

/// Aggregates the reporting numbers. An empty requests table yields zero
/// counts and a zero average rather than an error.
pub async fn statistics(pool: &Pool<Postgres>) -> Result<Statistics> {
    let total_requests: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests")
        .fetch_one(pool)
        .await?;

    let completed_requests: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM requests WHERE status = $1")
            .bind(RequestStatus::ReadyForPickup.as_str())
            .fetch_one(pool)
            .await?;

    let avg_days: Option<f64> = sqlx::query_scalar(
        r#"
        SELECT AVG(completion_date - start_date)::FLOAT8
        FROM requests
        WHERE completion_date IS NOT NULL
        "#,
    )
    .fetch_one(pool)
    .await?;
    let avg_completion_days = avg_days.map(|d| (d * 10.0).round() / 10.0).unwrap_or(0.0);

    let by_equipment_type = sqlx::query_as::<_, TypeCount>(
        r#"
        SELECT equipment_type, COUNT(*) AS count
        FROM requests
        GROUP BY equipment_type
        ORDER BY COUNT(*) DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let by_status = sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT status, COUNT(*) AS count
        FROM requests
        GROUP BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(Statistics {
        total_requests,
        completed_requests,
        avg_completion_days,
        by_equipment_type,
        by_status,
    })
}
