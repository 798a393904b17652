use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "access_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessRole {
    Owner,
    Manager,
}

/// Links a user to a property they may manage. Unique per (user, property).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub property_id: Uuid,
    pub role: AccessRole,
    pub created_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn new(user_id: Uuid, property_id: Uuid, role: AccessRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            property_id,
            role,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccessGrant {
    pub user_id: Uuid,
    #[serde(default = "default_role")]
    pub role: AccessRole,
}

fn default_role() -> AccessRole {
    AccessRole::Manager
}
