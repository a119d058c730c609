//! Member domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Member account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Member response (without password hash)
#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            email: member.email,
            name: member.name,
            role: member.role.to_lowercase(),
        }
    }
}

#[cfg(test)]
impl Member {
    pub(crate) fn test_member(id: i64, email: &str, role: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            name: "Test Member".to_string(),
            password_hash: String::new(),
            role: role.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
