use chrono::Utc;
use uuid::Uuid;

use super::{validate, ServiceResult};
use crate::auth::Principal;
use crate::database::models::{Accommodation, CreateAccommodation, UpdateAccommodation};
use crate::database::{AccommodationStore, Store};
use crate::tenancy::scope::{found, visible_property};
use crate::tenancy::Visibility;

pub struct AccommodationService<'a> {
    store: &'a dyn Store,
}

fn check(a: &Accommodation) -> ServiceResult<()> {
    validate::required("name", &a.name)?;
    validate::positive("base_price", a.base_price)?;
    validate::non_negative("cleaning_fee", a.cleaning_fee)?;
    validate::at_least("max_guests", a.max_guests, 1)?;
    validate::at_least("beds", a.beds, 0)?;
    validate::at_least("bathrooms", a.bathrooms, 0)
}

impl<'a> AccommodationService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, principal: &Principal, input: CreateAccommodation) -> ServiceResult<Accommodation> {
        let property = visible_property(self.store, principal, input.property_id).await?;

        let now = Utc::now();
        let accommodation = Accommodation {
            id: Uuid::new_v4(),
            property_id: property.id,
            name: input.name.trim().to_string(),
            description: input.description,
            kind: input.kind,
            max_guests: input.max_guests,
            beds: input.beds,
            bathrooms: input.bathrooms,
            base_price: input.base_price,
            cleaning_fee: input.cleaning_fee,
            is_active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        check(&accommodation)?;

        self.store.insert_accommodation(&accommodation, Some(principal.user_id)).await?;
        tracing::info!("Accommodation created: '{}' ({}) in property {}", accommodation.name, accommodation.id, property.id);
        Ok(accommodation)
    }

    pub async fn list(&self, principal: &Principal, property_id: Option<Uuid>) -> ServiceResult<Vec<Accommodation>> {
        Ok(self.store.list_accommodations(Visibility::of(principal), property_id).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> ServiceResult<Accommodation> {
        found(self.store.get_accommodation(Visibility::of(principal), id).await?, "Accommodation")
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, input: UpdateAccommodation) -> ServiceResult<Accommodation> {
        let mut accommodation = self.get(principal, id).await?;

        if let Some(name) = input.name {
            accommodation.name = name.trim().to_string();
        }
        if let Some(description) = input.description {
            accommodation.description = description;
        }
        if let Some(kind) = input.kind {
            accommodation.kind = kind;
        }
        if let Some(max_guests) = input.max_guests {
            accommodation.max_guests = max_guests;
        }
        if let Some(beds) = input.beds {
            accommodation.beds = beds;
        }
        if let Some(bathrooms) = input.bathrooms {
            accommodation.bathrooms = bathrooms;
        }
        if let Some(base_price) = input.base_price {
            accommodation.base_price = base_price;
        }
        if let Some(cleaning_fee) = input.cleaning_fee {
            accommodation.cleaning_fee = cleaning_fee;
        }
        check(&accommodation)?;

        accommodation.updated_at = Utc::now();
        self.store.update_accommodation(&accommodation, Some(principal.user_id)).await?;
        Ok(accommodation)
    }

    pub async fn soft_delete(&self, principal: &Principal, id: Uuid) -> ServiceResult<()> {
        let accommodation = self.get(principal, id).await?;
        self.store.soft_delete_accommodation(accommodation.id, Utc::now(), Some(principal.user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{AccessRole, AccommodationKind};
    use crate::database::MemoryStore;
    use crate::error::ApiError;
    use crate::testing::Fixtures;
    use rust_decimal::Decimal;

    fn suite(property_id: Uuid, price: &str) -> CreateAccommodation {
        CreateAccommodation {
            property_id,
            name: "Suíte Master".to_string(),
            description: String::new(),
            kind: AccommodationKind::Suite,
            max_guests: 2,
            beds: 1,
            bathrooms: 1,
            base_price: price.parse().unwrap(),
            cleaning_fee: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn price_must_be_positive() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let property = fx.property(&owner, "Pousada").await;
        let service = AccommodationService::new(&store);

        let err = service.create(&owner, suite(property.id, "0")).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));
        assert!(service.create(&owner, suite(property.id, "420.00")).await.is_ok());
    }

    #[tokio::test]
    async fn manager_grant_reaches_accommodations() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let manager = fx.user("manager").await;
        let stranger = fx.user("stranger").await;
        let property = fx.property(&owner, "Pousada").await;
        let room = fx.accommodation(&property, "Quarto 1").await;
        fx.grant(&manager, &property, AccessRole::Manager).await;

        let service = AccommodationService::new(&store);
        assert_eq!(service.get(&manager, room.id).await.unwrap().id, room.id);
        assert_eq!(service.list(&manager, None).await.unwrap().len(), 1);

        assert!(matches!(service.get(&stranger, room.id).await, Err(ApiError::NotFound(_))));
        assert!(service.list(&stranger, Some(property.id)).await.unwrap().is_empty());
        assert!(matches!(
            service.create(&stranger, suite(property.id, "100")).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn soft_deleted_accommodation_disappears() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let property = fx.property(&owner, "Pousada").await;
        let room = fx.accommodation(&property, "Quarto 1").await;
        let service = AccommodationService::new(&store);

        service.soft_delete(&owner, room.id).await.unwrap();
        assert!(matches!(service.get(&owner, room.id).await, Err(ApiError::NotFound(_))));
        assert_eq!(store.count_active_accommodations(property.id).await.unwrap(), 0);
    }
}
