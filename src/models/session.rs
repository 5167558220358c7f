//! Login-session audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;
use crate::db::Record;

pub const SESSIONS_KEY: &str = "user_sessions";

/// Entries kept under [`SESSIONS_KEY`]; older ones are dropped.
pub const MAX_SESSION_RECORDS: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Record for UserSession {
    const KEY: &'static str = SESSIONS_KEY;
    const LABEL: &'static str = "Sessão";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
