use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::image::Image;

/// A bookable establishment (pousada, hotel, holiday house).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: String,

    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,

    pub phone: String,
    pub email: String,
    pub website: String,
    pub whatsapp: String,
    pub instagram: String,

    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub custom_domain: Option<String>,

    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProperty {
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    pub country: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub instagram: String,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub custom_domain: Option<String>,
}

/// Partial update. `custom_domain: Some(None)` clears the domain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProperty {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub custom_domain: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Owner-facing detail view.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub accommodations_count: i64,
    pub images: Vec<Image>,
}

/// Public landing-page view. Leaves out owner and tenant references.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProperty {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub phone: String,
    pub website: String,
    pub whatsapp: String,
    pub instagram: String,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
}

impl From<&Property> for PublicProperty {
    fn from(p: &Property) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            slug: p.slug.clone(),
            description: p.description.clone(),
            address: p.address.clone(),
            city: p.city.clone(),
            state: p.state.clone(),
            country: p.country.clone(),
            phone: p.phone.clone(),
            website: p.website.clone(),
            whatsapp: p.whatsapp.clone(),
            instagram: p.instagram.clone(),
            logo_url: p.logo_url.clone(),
            primary_color: p.primary_color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicPropertyDetail {
    #[serde(flatten)]
    pub property: PublicProperty,
    pub accommodations_count: i64,
    pub images: Vec<Image>,
}
