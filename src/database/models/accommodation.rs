use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "accommodation_kind", rename_all = "snake_case")]
pub enum AccommodationKind {
    #[default]
    Room,
    Suite,
    Apartment,
    House,
    Cabin,
    Other,
}

/// A bookable unit type inside a property.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Accommodation {
    pub id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "accommodation_type")]
    pub kind: AccommodationKind,
    pub max_guests: i32,
    pub beds: i32,
    pub bathrooms: i32,
    pub base_price: Decimal,
    pub cleaning_fee: Decimal,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccommodation {
    pub property_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "accommodation_type")]
    pub kind: AccommodationKind,
    #[serde(default = "default_max_guests")]
    pub max_guests: i32,
    #[serde(default = "one")]
    pub beds: i32,
    #[serde(default = "one")]
    pub bathrooms: i32,
    pub base_price: Decimal,
    #[serde(default)]
    pub cleaning_fee: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccommodation {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "accommodation_type")]
    pub kind: Option<AccommodationKind>,
    pub max_guests: Option<i32>,
    pub beds: Option<i32>,
    pub bathrooms: Option<i32>,
    pub base_price: Option<Decimal>,
    pub cleaning_fee: Option<Decimal>,
}

fn default_max_guests() -> i32 {
    2
}

fn one() -> i32 {
    1
}
