use chrono::Utc;
use uuid::Uuid;

use super::{validate, ServiceResult};
use crate::auth::Principal;
use crate::database::models::{CreateImage, Image, ImageFilter};
use crate::database::{AccommodationStore, ImageStore, Store};
use crate::error::ApiError;
use crate::tenancy::scope::{found, visible_property};
use crate::tenancy::Visibility;

pub struct ImageService<'a> {
    store: &'a dyn Store,
}

impl<'a> ImageService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Attaches an image URL to exactly one parent the principal can reach.
    pub async fn create(&self, principal: &Principal, input: CreateImage) -> ServiceResult<Image> {
        validate::required("url", &input.url)?;

        match (input.property_id, input.accommodation_id) {
            (Some(property_id), None) => {
                visible_property(self.store, principal, property_id).await?;
            }
            (None, Some(accommodation_id)) => {
                let accommodation = self
                    .store
                    .get_accommodation(Visibility::of(principal), accommodation_id)
                    .await?;
                found(accommodation, "Accommodation")?;
            }
            _ => {
                return Err(ApiError::validation_error(
                    "An image belongs to either a property or an accommodation",
                    None,
                ))
            }
        }

        let image = Image {
            id: Uuid::new_v4(),
            property_id: input.property_id,
            accommodation_id: input.accommodation_id,
            url: input.url.trim().to_string(),
            caption: input.caption,
            position: input.position,
            is_cover: input.is_cover,
            created_at: Utc::now(),
        };
        self.store.insert_image(&image, Some(principal.user_id)).await?;
        Ok(image)
    }

    pub async fn list(&self, principal: &Principal, filter: ImageFilter) -> ServiceResult<Vec<Image>> {
        Ok(self.store.list_images(Visibility::of(principal), filter).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> ServiceResult<Image> {
        found(self.store.get_image(Visibility::of(principal), id).await?, "Image")
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> ServiceResult<()> {
        let image = self.get(principal, id).await?;
        self.store.delete_image(image.id, Some(principal.user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::Fixtures;

    fn image(property_id: Option<Uuid>, accommodation_id: Option<Uuid>) -> CreateImage {
        CreateImage {
            property_id,
            accommodation_id,
            url: "https://cdn.example.com/fachada.jpg".to_string(),
            caption: String::new(),
            position: 0,
            is_cover: true,
        }
    }

    #[tokio::test]
    async fn requires_exactly_one_parent() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let property = fx.property(&owner, "Pousada").await;
        let room = fx.accommodation(&property, "Quarto").await;
        let service = ImageService::new(&store);

        assert!(matches!(
            service.create(&owner, image(None, None)).await,
            Err(ApiError::ValidationError { .. })
        ));
        assert!(matches!(
            service.create(&owner, image(Some(property.id), Some(room.id))).await,
            Err(ApiError::ValidationError { .. })
        ));
        assert!(service.create(&owner, image(None, Some(room.id))).await.is_ok());
    }

    #[tokio::test]
    async fn accommodation_images_follow_property_scope() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let stranger = fx.user("stranger").await;
        let property = fx.property(&owner, "Pousada").await;
        let room = fx.accommodation(&property, "Quarto").await;
        let service = ImageService::new(&store);

        let img = service.create(&owner, image(None, Some(room.id))).await.unwrap();
        assert!(matches!(service.get(&stranger, img.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(service.delete(&stranger, img.id).await, Err(ApiError::NotFound(_))));
        assert_eq!(service.list(&owner, ImageFilter::default()).await.unwrap().len(), 1);

        service.delete(&owner, img.id).await.unwrap();
        assert!(matches!(service.get(&owner, img.id).await, Err(ApiError::NotFound(_))));
    }
}
