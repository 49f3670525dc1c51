use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use serde::Deserialize;
use sqlx::{Pool, Postgres};
use std::path::Path;

use crate::db;

/// Legacy user row: `fio;phone;login;password;type`.
#[derive(Debug, Deserialize)]
struct UserRow {
    fio: String,
    phone: String,
    login: String,
    password: String,
    #[serde(rename = "type")]
    role: String,
}

/// Legacy request row. `completionDate` and `masterID` carry a literal
/// `"null"` when absent; `repairParts` is simply empty.
#[derive(Debug, Deserialize)]
struct RequestRow {
    #[serde(rename = "startDate")]
    start_date: String,
    #[serde(rename = "climateTechType")]
    equipment_type: String,
    #[serde(rename = "climateTechModel")]
    equipment_model: String,
    problem_description: String,
    #[serde(rename = "requestStatus")]
    status: String,
    #[serde(rename = "completionDate")]
    completion_date: String,
    #[serde(rename = "repairParts")]
    repair_parts: String,
    #[serde(rename = "masterID")]
    specialist_id: String,
    #[serde(rename = "clientID")]
    client_id: i32,
}

/// Legacy comment row: `message;masterID;requestID`.
#[derive(Debug, Deserialize)]
struct CommentRow {
    message: String,
    #[serde(rename = "masterID")]
    specialist_id: i32,
    #[serde(rename = "requestID")]
    request_id: i32,
}

fn reader_for(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Bad date '{s}'"))
}

fn parse_nullable_date(s: &str) -> Result<Option<NaiveDate>> {
    if s.trim() == "null" {
        Ok(None)
    } else {
        parse_date(s).map(Some)
    }
}

fn parse_nullable_id(s: &str) -> Result<Option<i32>> {
    if s.trim() == "null" {
        Ok(None)
    } else {
        s.trim()
            .parse()
            .with_context(|| format!("Bad id '{s}'"))
            .map(Some)
    }
}

fn nullable_text(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Replays user rows through the normal insert path; duplicate logins
/// resolve to the existing id and still count as imported.
pub async fn import_users(pool: &Pool<Postgres>, path: &Path) -> Result<usize> {
    let mut reader = reader_for(path)?;
    let mut count = 0usize;

    for row in reader.deserialize::<UserRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping malformed user row: {e}");
                continue;
            }
        };
        match db::users::add_user(
            pool,
            &row.fio,
            &row.phone,
            &row.login,
            &row.password,
            &row.role,
        )
        .await
        {
            Ok(user_id) => {
                count += 1;
                println!("Imported user #{user_id}: {} ({})", row.fio, row.role);
            }
            Err(e) => warn!("skipping user '{}': {e}", row.login),
        }
    }

    println!("Imported {count} users");
    Ok(count)
}

/// Replays request rows through a wider insert than the normal path: the
/// historical completion date, repair parts and specialist are set too.
/// Each row commits in its own transaction; failures skip the row only.
pub async fn import_requests(pool: &Pool<Postgres>, path: &Path) -> Result<usize> {
    let mut reader = reader_for(path)?;
    let mut count = 0usize;

    for row in reader.deserialize::<RequestRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping malformed request row: {e}");
                continue;
            }
        };
        match insert_historical_request(pool, &row).await {
            Ok(request_id) => {
                count += 1;
                println!(
                    "Imported request #{request_id}: {} - {}",
                    row.equipment_type, row.status
                );
            }
            Err(e) => warn!("skipping request for client {}: {e}", row.client_id),
        }
    }

    println!("Imported {count} requests");
    Ok(count)
}

async fn insert_historical_request(pool: &Pool<Postgres>, row: &RequestRow) -> Result<i32> {
    let start_date = parse_date(&row.start_date)?;
    let completion_date = parse_nullable_date(&row.completion_date)?;
    let specialist_id = parse_nullable_id(&row.specialist_id)?;

    let mut tx = pool.begin().await?;
    let request_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO requests (
            start_date, equipment_type, equipment_model,
            problem_description, status, completion_date,
            repair_parts, specialist_id, client_id, due_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $1 + 7)
        RETURNING request_id
        "#,
    )
    .bind(start_date)
    .bind(&row.equipment_type)
    .bind(&row.equipment_model)
    .bind(&row.problem_description)
    .bind(&row.status)
    .bind(completion_date)
    .bind(nullable_text(&row.repair_parts))
    .bind(specialist_id)
    .bind(row.client_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(request_id)
}

pub async fn import_comments(pool: &Pool<Postgres>, path: &Path) -> Result<usize> {
    let mut reader = reader_for(path)?;
    let mut count = 0usize;

    for row in reader.deserialize::<CommentRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping malformed comment row: {e}");
                continue;
            }
        };
        match db::comments::add_comment(pool, &row.message, row.specialist_id, row.request_id)
            .await
        {
            Ok(true) => {
                count += 1;
                println!("Imported comment for request #{}", row.request_id);
            }
            Ok(false) => warn!("comment for request #{} not inserted", row.request_id),
            Err(e) => warn!("skipping comment for request #{}: {e}", row.request_id),
        }
    }

    println!("Imported {count} comments");
    Ok(count)
}

/// Runs the requested imports in dependency order (users, then requests,
/// then comments). A missing or unreadable file is reported and the run
/// continues with the remaining files.
pub async fn run(
    pool: &Pool<Postgres>,
    users: Option<&Path>,
    requests: Option<&Path>,
    comments: Option<&Path>,
) -> Result<()> {
    if let Some(path) = users {
        if let Err(e) = import_users(pool, path).await {
            eprintln!("User import failed: {e:#}");
        }
    }
    if let Some(path) = requests {
        if let Err(e) = import_requests(pool, path).await {
            eprintln!("Request import failed: {e:#}");
        }
    }
    if let Some(path) = comments {
        if let Err(e) = import_comments(pool, path).await {
            eprintln!("Comment import failed: {e:#}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows<T: for<'de> Deserialize<'de>>(data: &str) -> Vec<T> {
        csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(data.as_bytes())
            .deserialize::<T>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn user_rows_parse_with_renamed_headers() {
        let parsed: Vec<UserRow> = rows(
            "fio;phone;login;password;type\n\
             Иванов Иван;89991234567;ivanov;secret;client\n",
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].fio, "Иванов Иван");
        assert_eq!(parsed[0].role, "client");
    }

    #[test]
    fn request_rows_keep_null_sentinels_as_text() {
        let parsed: Vec<RequestRow> = rows(
            "startDate;climateTechType;climateTechModel;problem_description;requestStatus;completionDate;repairParts;masterID;clientID\n\
             2024-01-10;Кондиционер;AC-2000;не охлаждает;new;null;;null;7\n",
        );
        let row = &parsed[0];
        assert_eq!(row.completion_date, "null");
        assert_eq!(row.specialist_id, "null");
        assert_eq!(row.repair_parts, "");
        assert_eq!(row.client_id, 7);
    }

    #[test]
    fn nullable_sentinels_map_to_none() {
        assert_eq!(parse_nullable_date("null").unwrap(), None);
        assert_eq!(
            parse_nullable_date("2024-02-01").unwrap(),
            Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );
        assert_eq!(parse_nullable_id("null").unwrap(), None);
        assert_eq!(parse_nullable_id("14").unwrap(), Some(14));
        assert!(parse_nullable_id("fourteen").is_err());
        assert_eq!(nullable_text(""), None);
        assert_eq!(nullable_text("compressor"), Some("compressor"));
    }

    #[test]
    fn comment_rows_parse() {
        let parsed: Vec<CommentRow> = rows(
            "message;masterID;requestID\n\
             replaced the fan;2;15\n",
        );
        assert_eq!(parsed[0].specialist_id, 2);
        assert_eq!(parsed[0].request_id, 15);
    }
}
