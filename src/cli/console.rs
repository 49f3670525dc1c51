use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rustyline::DefaultEditor;
use sqlx::{Pool, Postgres};
use std::path::PathBuf;

use crate::db;
use crate::models::{RequestStatus, ROLE_CLIENT};
use crate::qr;
use crate::session::Session;

fn check_login() -> Result<Session> {
    Session::load().ok_or_else(|| anyhow!("Please login first."))
}

fn check_admin() -> Result<Session> {
    let session = check_login()?;
    if session.is_admin() {
        Ok(session)
    } else {
        Err(anyhow!("This command needs an administrator session."))
    }
}

fn print_help() {
    println!("Commands:");
    println!("  signup <login> <phone> <password> <full name...>");
    println!("  login <login> <password>");
    println!("  whoami | logout");
    println!("  add-request <type> <model> <description...>");
    println!("  requests [status...]");
    println!("  request <id>");
    println!("  assign <request_id> <specialist_id>");
    println!("  status <request_id> <new|in repair|ready for pickup>");
    println!("  due-date <request_id> <YYYY-MM-DD>");
    println!("  comment <request_id> <text...>");
    println!("  comments <request_id>");
    println!("  search <term...>");
    println!("  stats");
    println!("  users | specialists");
    println!("  set-role <user_id> <role>        (administrator)");
    println!("  delete-user <user_id>            (administrator)");
    println!("  qr [request_id]");
    println!("  exit");
}

/// Interactive operator console over the data-access layer. Failed
/// operations are printed and the loop carries on.
pub async fn run(pool: &Pool<Postgres>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("Climate service console. Type 'help' for commands, 'exit' to quit.");

    loop {
        let line = match rl.readline("climate> ") {
            Ok(line) => line,
            Err(_) => break,
        };
        let _ = rl.add_history_entry(line.as_str());
        let args: Vec<&str> = line.split_whitespace().collect();
        if args.is_empty() {
            continue;
        }

        match args[0] {
            "exit" => break,
            "help" => print_help(),
            "signup" => {
                if args.len() < 5 {
                    println!("Usage: signup <login> <phone> <password> <full name...>");
                    continue;
                }
                let full_name = args[4..].join(" ");
                match db::users::add_user(pool, &full_name, args[2], args[1], args[3], ROLE_CLIENT)
                    .await
                {
                    Ok(user_id) => println!("Account ready with id {user_id}."),
                    Err(e) => println!("Signup failed: {e}"),
                }
            }
            "login" => {
                if args.len() < 3 {
                    println!("Usage: login <login> <password>");
                    continue;
                }
                match db::users::authenticate(pool, args[1], args[2]).await {
                    Ok(Some(user)) => {
                        let session = Session {
                            user_id: user.user_id,
                            full_name: user.full_name.clone(),
                            login: user.login.clone(),
                            role: user.role.clone(),
                        };
                        if let Err(e) = session.save() {
                            println!("Could not save session: {e}");
                            continue;
                        }
                        println!("Logged in as {} ({})", user.full_name, user.role);
                    }
                    Ok(None) => println!("Login failed."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "whoami" => match Session::load() {
                Some(s) => println!("{} ({}), login '{}'", s.full_name, s.role, s.login),
                None => println!("Not logged in."),
            },
            "logout" => {
                Session::clear();
                println!("Logged out.");
            }
            "add-request" => {
                let session = match check_login() {
                    Ok(s) => s,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                if args.len() < 4 {
                    println!("Usage: add-request <type> <model> <description...>");
                    continue;
                }
                let description = args[3..].join(" ");
                match db::requests::add_request(pool, args[1], args[2], &description, session.user_id)
                    .await
                {
                    Ok(request_id) => println!("Request #{request_id} created."),
                    Err(e) => println!("Could not create request: {e}"),
                }
            }
            "requests" => {
                let status_arg = if args.len() > 1 {
                    Some(args[1..].join(" "))
                } else {
                    None
                };
                match db::requests::list_requests(pool, status_arg.as_deref()).await {
                    Ok(requests) => {
                        for r in &requests {
                            println!(
                                "#{} [{}] {} {} - {} (client: {}, specialist: {})",
                                r.request_id,
                                r.status,
                                r.equipment_type,
                                r.equipment_model,
                                r.problem_description,
                                r.client_name,
                                r.specialist_name.as_deref().unwrap_or("-"),
                            );
                        }
                        println!("{} request(s)", requests.len());
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "request" => {
                let Some(request_id) = args.get(1).and_then(|a| a.parse::<i32>().ok()) else {
                    println!("Usage: request <id>");
                    continue;
                };
                match db::requests::get_request(pool, request_id).await {
                    Ok(Some(r)) => {
                        println!("#{} [{}] {} {}", r.request_id, r.status, r.equipment_type, r.equipment_model);
                        println!("  problem:    {}", r.problem_description);
                        println!("  client:     {}", r.client_name);
                        println!("  specialist: {}", r.specialist_name.as_deref().unwrap_or("-"));
                        println!("  started:    {}", r.start_date);
                        println!("  due:        {}", r.due_date);
                        match r.completion_date {
                            Some(d) => println!("  completed:  {d}"),
                            None => println!("  completed:  -"),
                        }
                    }
                    Ok(None) => println!("No request with id {request_id}."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "assign" => {
                let (Some(request_id), Some(specialist_id)) = (
                    args.get(1).and_then(|a| a.parse::<i32>().ok()),
                    args.get(2).and_then(|a| a.parse::<i32>().ok()),
                ) else {
                    println!("Usage: assign <request_id> <specialist_id>");
                    continue;
                };
                match db::requests::assign_specialist(pool, request_id, specialist_id).await {
                    Ok(true) => println!("Specialist {specialist_id} assigned to request #{request_id}."),
                    Ok(false) => println!("Nothing changed (completed request or unknown id)."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "status" => {
                let Some(request_id) = args.get(1).and_then(|a| a.parse::<i32>().ok()) else {
                    println!("Usage: status <request_id> <new|in repair|ready for pickup>");
                    continue;
                };
                let label = args[2..].join(" ");
                let Some(status) = RequestStatus::parse(&label) else {
                    println!("Unknown status '{label}'.");
                    continue;
                };
                match db::requests::update_status(pool, request_id, status.as_str()).await {
                    Ok(true) => println!("Request #{request_id} is now '{status}'."),
                    Ok(false) => println!("No request with id {request_id}."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "due-date" => {
                let (Some(request_id), Some(date_arg)) =
                    (args.get(1).and_then(|a| a.parse::<i32>().ok()), args.get(2))
                else {
                    println!("Usage: due-date <request_id> <YYYY-MM-DD>");
                    continue;
                };
                let new_date = match NaiveDate::parse_from_str(date_arg, "%Y-%m-%d") {
                    Ok(d) => d,
                    Err(_) => {
                        println!("Bad date '{date_arg}', expected YYYY-MM-DD.");
                        continue;
                    }
                };
                match db::requests::extend_due_date(pool, request_id, new_date).await {
                    Ok(true) => println!("Due date of request #{request_id} moved to {new_date}."),
                    Ok(false) => println!("Not updated (completed request or unknown id)."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "comment" => {
                let session = match check_login() {
                    Ok(s) => s,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                let Some(request_id) = args.get(1).and_then(|a| a.parse::<i32>().ok()) else {
                    println!("Usage: comment <request_id> <text...>");
                    continue;
                };
                if args.len() < 3 {
                    println!("Usage: comment <request_id> <text...>");
                    continue;
                }
                let message = args[2..].join(" ");
                match db::comments::add_comment(pool, &message, session.user_id, request_id).await {
                    Ok(true) => println!("Comment added to request #{request_id}."),
                    Ok(false) => println!("Comment was not added."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "comments" => {
                let Some(request_id) = args.get(1).and_then(|a| a.parse::<i32>().ok()) else {
                    println!("Usage: comments <request_id>");
                    continue;
                };
                match db::comments::list_by_request(pool, request_id).await {
                    Ok(comments) => {
                        for c in &comments {
                            println!("[{}] {}: {}", c.created_at, c.specialist_name, c.message);
                        }
                        println!("{} comment(s)", comments.len());
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "search" => {
                if args.len() < 2 {
                    println!("Usage: search <term...>");
                    continue;
                }
                let term = args[1..].join(" ");
                match db::requests::search(pool, &term).await {
                    Ok(hits) => {
                        for h in &hits {
                            println!(
                                "#{} [{}] {} {} - {} (client: {} {})",
                                h.request_id,
                                h.status,
                                h.equipment_type,
                                h.equipment_model,
                                h.problem_description,
                                h.client_name,
                                h.client_phone,
                            );
                        }
                        println!("{} match(es) for '{term}'", hits.len());
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "stats" => match db::requests::statistics(pool).await {
                Ok(stats) => {
                    println!("Total requests:      {}", stats.total_requests);
                    println!("Ready for pickup:    {}", stats.completed_requests);
                    println!("Avg repair days:     {:.1}", stats.avg_completion_days);
                    println!("By equipment type:");
                    for t in &stats.by_equipment_type {
                        println!("  {} - {}", t.equipment_type, t.count);
                    }
                    println!("By status:");
                    for s in &stats.by_status {
                        println!("  {} - {}", s.status, s.count);
                    }
                }
                Err(e) => println!("Error: {e}"),
            },
            "users" => match db::users::list_users(pool).await {
                Ok(users) => {
                    for u in &users {
                        println!("#{} {} ({}) login '{}' phone {}", u.user_id, u.full_name, u.role, u.login, u.phone);
                    }
                    println!("{} user(s)", users.len());
                }
                Err(e) => println!("Error: {e}"),
            },
            "specialists" => match db::users::list_specialists(pool).await {
                Ok(specialists) => {
                    for s in &specialists {
                        println!("#{} {} phone {}", s.user_id, s.full_name, s.phone);
                    }
                    println!("{} specialist(s)", specialists.len());
                }
                Err(e) => println!("Error: {e}"),
            },
            "set-role" => {
                if let Err(e) = check_admin() {
                    println!("{e}");
                    continue;
                }
                let (Some(user_id), Some(role)) =
                    (args.get(1).and_then(|a| a.parse::<i32>().ok()), args.get(2))
                else {
                    println!("Usage: set-role <user_id> <role>");
                    continue;
                };
                match db::users::set_role(pool, user_id, role).await {
                    Ok(true) => println!("User #{user_id} is now a {role}."),
                    Ok(false) => println!("No user with id {user_id}."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "delete-user" => {
                if let Err(e) = check_admin() {
                    println!("{e}");
                    continue;
                }
                let Some(user_id) = args.get(1).and_then(|a| a.parse::<i32>().ok()) else {
                    println!("Usage: delete-user <user_id>");
                    continue;
                };
                match db::users::delete_user(pool, user_id).await {
                    Ok(true) => println!("User #{user_id} deleted."),
                    Ok(false) => println!("No user with id {user_id}."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "qr" => {
                let request_id = args.get(1).and_then(|a| a.parse::<i32>().ok());
                let path = PathBuf::from(qr::default_filename(request_id));
                match qr::save_png(qr::FEEDBACK_FORM_URL, &path) {
                    Ok(()) => println!("QR code saved to {}", path.display()),
                    Err(e) => println!("Error: {e:#}"),
                }
            }
            other => println!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }

    Ok(())
}
