use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A picture attached to either a property or one of its accommodations.
/// Only the URL is stored; file hosting is someone else's job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub property_id: Option<Uuid>,
    pub accommodation_id: Option<Uuid>,
    pub url: String,
    pub caption: String,
    pub position: i32,
    pub is_cover: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateImage {
    pub property_id: Option<Uuid>,
    pub accommodation_id: Option<Uuid>,
    pub url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub is_cover: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ImageFilter {
    pub property_id: Option<Uuid>,
    pub accommodation_id: Option<Uuid>,
}
