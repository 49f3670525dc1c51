use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::ROLE_ADMINISTRATOR;

const SESSION_FILE: &str = ".session.json";

/// Console login session, persisted next to the working directory so a
/// restart keeps the operator logged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i32,
    pub full_name: String,
    pub login: String,
    pub role: String,
}

impl Session {
    pub fn load() -> Option<Self> {
        if Path::new(SESSION_FILE).exists() {
            let data = fs::read_to_string(SESSION_FILE).ok()?;
            serde_json::from_str(&data).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Serialize session")?;
        fs::write(SESSION_FILE, data).context("Write session")?;
        Ok(())
    }

    pub fn clear() {
        let _ = fs::remove_file(SESSION_FILE);
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMINISTRATOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trips_through_json() {
        let session = Session {
            user_id: 7,
            full_name: "Test Operator".into(),
            login: "operator".into(),
            role: "administrator".into(),
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_id, 7);
        assert_eq!(back.login, "operator");
        assert!(back.is_admin());
    }

    #[test]
    fn non_admin_roles_are_not_admin() {
        let session = Session {
            user_id: 1,
            full_name: "Client".into(),
            login: "client1".into(),
            role: "client".into(),
        };
        assert!(!session.is_admin());
    }
}
