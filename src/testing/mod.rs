//! Test fixtures over [`MemoryStore`].

use chrono::Utc;
use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::{
    AccessGrant, AccessRole, Accommodation, AccommodationKind, Property, User,
};
use crate::database::{AccessGrantStore, AccommodationStore, MemoryStore, PropertyStore, UserStore};
use crate::tenancy::slug::slugify;

pub struct Fixtures<'a> {
    store: &'a MemoryStore,
}

impl<'a> Fixtures<'a> {
    pub fn new(store: &'a MemoryStore) -> Self {
        Self { store }
    }

    pub async fn user(&self, username: &str) -> Principal {
        let user = User {
            id: Uuid::new_v4(),
            username: format!("{}-{}", username, Uuid::new_v4().simple()),
            email: format!("{}@example.com", username),
            is_staff: false,
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.insert_user(&user).await.expect("insert user");
        Principal {
            user_id: user.id,
            username: user.username,
            is_staff: false,
        }
    }

    /// Active property owned by `owner`, with its OWNER grant. The slug is
    /// the slugified name, so names must be unique within one test.
    pub async fn property(&self, owner: &Principal, name: &str) -> Property {
        let now = Utc::now();
        let property = Property {
            id: Uuid::new_v4(),
            owner_id: owner.user_id,
            tenant_id: None,
            name: name.to_string(),
            slug: slugify(name).expect("sluggable name"),
            description: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            country: "Brasil".to_string(),
            phone: String::new(),
            email: String::new(),
            website: String::new(),
            whatsapp: String::new(),
            instagram: String::new(),
            logo_url: None,
            primary_color: None,
            custom_domain: None,
            is_active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        let grant = AccessGrant::new(owner.user_id, property.id, AccessRole::Owner);
        self.store.insert_property(&property, &grant, None).await.expect("insert property");
        property
    }

    pub async fn accommodation(&self, property: &Property, name: &str) -> Accommodation {
        let now = Utc::now();
        let accommodation = Accommodation {
            id: Uuid::new_v4(),
            property_id: property.id,
            name: name.to_string(),
            description: String::new(),
            kind: AccommodationKind::Suite,
            max_guests: 2,
            beds: 1,
            bathrooms: 1,
            base_price: "350.00".parse().expect("decimal"),
            cleaning_fee: "50.00".parse().expect("decimal"),
            is_active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_accommodation(&accommodation, None).await.expect("insert accommodation");
        accommodation
    }

    pub async fn grant(&self, user: &Principal, property: &Property, role: AccessRole) {
        self.store
            .insert_grant(&AccessGrant::new(user.user_id, property.id, role), None)
            .await
            .expect("insert grant");
    }
}
