use anyhow::Result;
use chrono::Duration;

use crate::db;
use crate::models::{RequestStatus, ROLE_CLIENT, ROLE_SPECIALIST};

const PROBE_CLIENT_LOGIN: &str = "smoke_client_001";
const PROBE_CLIENT_PASSWORD: &str = "smoke123";
const PROBE_SPECIALIST_LOGIN: &str = "smoke_specialist_001";

fn step(results: &mut Vec<(&'static str, bool)>, name: &'static str, ok: bool) {
    println!("{}: {}", if ok { "PASSED" } else { "FAILED" }, name);
    results.push((name, ok));
}

/// Sequential walk over every data-access operation against a live
/// database. Prints one line per step and a summary count. Reruns create
/// new requests and comments each time; the probe users are fixed so a
/// rerun also exercises the insert-or-fetch path.
pub async fn run(database_url: &str) -> Result<()> {
    println!("==== climate-service smoke test ====");
    let mut results: Vec<(&'static str, bool)> = Vec::new();

    let pool = match db::connect(database_url).await {
        Ok(pool) => {
            step(&mut results, "database connection", true);
            pool
        }
        Err(e) => {
            step(&mut results, "database connection", false);
            println!("Cannot continue without a database: {e}");
            return summarize(&results);
        }
    };

    // Probe users. Fixed logins, so the second call must return the same id
    // instead of creating a duplicate row.
    let client_id = db::users::add_user(
        &pool,
        "Smoke Test Client",
        "89991234567",
        PROBE_CLIENT_LOGIN,
        PROBE_CLIENT_PASSWORD,
        ROLE_CLIENT,
    )
    .await;
    step(&mut results, "create probe client", client_id.is_ok());
    let Ok(client_id) = client_id else {
        return summarize(&results);
    };

    let repeat_id = db::users::add_user(
        &pool,
        "Different Name",
        "80000000000",
        PROBE_CLIENT_LOGIN,
        "different-password",
        ROLE_CLIENT,
    )
    .await;
    step(
        &mut results,
        "duplicate login resolves to existing id",
        matches!(repeat_id, Ok(id) if id == client_id),
    );

    let good = db::users::authenticate(&pool, PROBE_CLIENT_LOGIN, PROBE_CLIENT_PASSWORD).await;
    step(
        &mut results,
        "authentication with valid credentials",
        matches!(&good, Ok(Some(user)) if user.user_id == client_id),
    );

    let bad = db::users::authenticate(&pool, PROBE_CLIENT_LOGIN, "wrong_pass").await;
    let unknown = db::users::authenticate(&pool, "no_such_login", "wrong_pass").await;
    step(
        &mut results,
        "authentication rejects bad credentials",
        matches!(bad, Ok(None)) && matches!(unknown, Ok(None)),
    );

    let request_id = db::requests::add_request(
        &pool,
        "Кондиционер",
        "Test Model AC-2000",
        "Smoke test request",
        client_id,
    )
    .await;
    step(&mut results, "create probe request", request_id.is_ok());
    let Ok(request_id) = request_id else {
        return summarize(&results);
    };

    let fresh = db::requests::get_request(&pool, request_id).await;
    let fresh_ok = match &fresh {
        Ok(Some(r)) => {
            r.status == RequestStatus::New.as_str()
                && (r.due_date - r.start_date).num_days() == 7
                && r.specialist_name.is_none()
                && r.completion_date.is_none()
        }
        _ => false,
    };
    step(
        &mut results,
        "new request has status 'new', week-out due date, no specialist",
        fresh_ok,
    );

    let all = db::requests::list_requests(&pool, None).await;
    let new_only = db::requests::list_requests(&pool, Some(RequestStatus::New.as_str())).await;
    step(
        &mut results,
        "list requests (all and by status)",
        matches!(&all, Ok(list) if !list.is_empty())
            && matches!(&new_only, Ok(list) if list.iter().any(|r| r.request_id == request_id)),
    );

    let specialist_id = db::users::add_user(
        &pool,
        "Smoke Test Specialist",
        "89997654321",
        PROBE_SPECIALIST_LOGIN,
        "smoke456",
        ROLE_SPECIALIST,
    )
    .await;
    let listed = db::users::list_specialists(&pool).await;
    step(
        &mut results,
        "specialist listed by role",
        matches!((&specialist_id, &listed), (Ok(id), Ok(list)) if list.iter().any(|s| s.user_id == *id)),
    );
    let Ok(specialist_id) = specialist_id else {
        return summarize(&results);
    };

    let assigned = db::requests::assign_specialist(&pool, request_id, specialist_id).await;
    let in_repair = db::requests::get_request(&pool, request_id).await;
    step(
        &mut results,
        "assignment moves request into repair",
        matches!(assigned, Ok(true))
            && matches!(&in_repair, Ok(Some(r)) if r.status == RequestStatus::InRepair.as_str()
                && r.specialist_name.is_some()),
    );

    let commented =
        db::comments::add_comment(&pool, "Smoke test comment", specialist_id, request_id).await;
    let comments = db::comments::list_by_request(&pool, request_id).await;
    step(
        &mut results,
        "add and list comments",
        matches!(commented, Ok(true)) && matches!(&comments, Ok(list) if !list.is_empty()),
    );

    let extended = match db::requests::get_request(&pool, request_id).await {
        Ok(Some(r)) => {
            let new_due = r.start_date + Duration::days(10);
            matches!(
                db::requests::extend_due_date(&pool, request_id, new_due).await,
                Ok(true)
            )
        }
        _ => false,
    };
    step(&mut results, "extend due date while in repair", extended);

    let completed =
        db::requests::update_status(&pool, request_id, RequestStatus::ReadyForPickup.as_str())
            .await;
    let stamped = db::requests::get_request(&pool, request_id).await;
    step(
        &mut results,
        "'ready for pickup' stamps the completion date",
        matches!(completed, Ok(true))
            && matches!(&stamped, Ok(Some(r)) if r.status == RequestStatus::ReadyForPickup.as_str()
                && r.completion_date.is_some()),
    );

    let locked_due = db::requests::extend_due_date(
        &pool,
        request_id,
        chrono::NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
    )
    .await;
    let locked_assign = db::requests::assign_specialist(&pool, request_id, specialist_id).await;
    step(
        &mut results,
        "completed request refuses reassignment and due-date changes",
        matches!(locked_due, Ok(false)) && matches!(locked_assign, Ok(false)),
    );

    let hits = db::requests::search(&pool, "Кондиционер").await;
    let misses = db::requests::search(&pool, "NO_SUCH_TERM_12345").await;
    step(
        &mut results,
        "search finds the probe request and returns nothing for nonsense",
        matches!(&hits, Ok(list) if list.iter().any(|h| h.request_id == request_id))
            && matches!(&misses, Ok(list) if list.is_empty()),
    );

    match db::requests::statistics(&pool).await {
        Ok(stats) => {
            println!("  total requests:    {}", stats.total_requests);
            println!("  ready for pickup:  {}", stats.completed_requests);
            println!("  avg repair days:   {:.1}", stats.avg_completion_days);
            let ok = stats.total_requests >= 1
                && stats.completed_requests >= 1
                && stats.avg_completion_days >= 0.0
                && !stats.by_equipment_type.is_empty()
                && !stats.by_status.is_empty();
            step(&mut results, "statistics", ok);
        }
        Err(_) => step(&mut results, "statistics", false),
    }

    summarize(&results)
}

fn summarize(results: &[(&'static str, bool)]) -> Result<()> {
    let passed = results.iter().filter(|(_, ok)| *ok).count();
    println!("------------------------------------");
    for (name, ok) in results {
        println!("{}: {}", if *ok { "PASSED" } else { "FAILED" }, name);
    }
    println!("{passed}/{} steps passed", results.len());
    if passed == results.len() {
        println!("All smoke steps passed.");
    } else {
        println!("{} step(s) failed.", results.len() - passed);
    }
    Ok(())
}
