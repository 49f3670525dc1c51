use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request lifecycle labels as stored in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    New,
    InRepair,
    ReadyForPickup,
}

impl RequestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::InRepair => "in repair",
            RequestStatus::ReadyForPickup => "ready for pickup",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "new" => Some(RequestStatus::New),
            "in repair" => Some(RequestStatus::InRepair),
            "ready for pickup" => Some(RequestStatus::ReadyForPickup),
            _ => None,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ROLE_CLIENT: &str = "client";
pub const ROLE_SPECIALIST: &str = "specialist";
pub const ROLE_ADMINISTRATOR: &str = "administrator";

/// Public user fields. The password hash never leaves the db layer.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: i32,
    pub full_name: String,
    pub phone: String,
    pub login: String,
    pub role: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Specialist {
    pub user_id: i32,
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RequestSummary {
    pub request_id: i32,
    pub start_date: NaiveDate,
    pub equipment_type: String,
    pub equipment_model: String,
    pub problem_description: String,
    pub status: String,
    pub client_name: String,
    pub specialist_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct RequestDetail {
    pub request_id: i32,
    pub start_date: NaiveDate,
    pub equipment_type: String,
    pub equipment_model: String,
    pub problem_description: String,
    pub status: String,
    pub due_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub client_name: String,
    pub specialist_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct SearchHit {
    pub request_id: i32,
    pub start_date: NaiveDate,
    pub equipment_type: String,
    pub equipment_model: String,
    pub problem_description: String,
    pub status: String,
    pub client_name: String,
    pub client_phone: String,
    pub specialist_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CommentView {
    pub comment_id: i32,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub specialist_name: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TypeCount {
    pub equipment_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub total_requests: i64,
    pub completed_requests: i64,
    /// Average of `completion_date - start_date` in days, one decimal.
    /// 0 when no request has a completion date.
    pub avg_completion_days: f64,
    pub by_equipment_type: Vec<TypeCount>,
    pub by_status: Vec<StatusCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip() {
        for status in [
            RequestStatus::New,
            RequestStatus::InRepair,
            RequestStatus::ReadyForPickup,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(
            RequestStatus::parse("Ready For Pickup"),
            Some(RequestStatus::ReadyForPickup)
        );
        assert_eq!(RequestStatus::parse("  NEW "), Some(RequestStatus::New));
    }

    #[test]
    fn status_parse_rejects_unknown_labels() {
        assert_eq!(RequestStatus::parse("scrapped"), None);
        assert_eq!(RequestStatus::parse(""), None);
    }
}
