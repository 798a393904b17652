//! Property lifecycle: creation with slug and owner grant, partial updates,
//! one-way soft delete, and the public views.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{validate, ServiceResult};
use crate::auth::Principal;
use crate::config;
use crate::database::models::{
    AccessGrant, AccessRole, AuditEntity, AuditEntry, CreateProperty, ImageFilter, Property, PropertyDetail,
    PublicProperty, PublicPropertyDetail, UpdateProperty,
};
use crate::database::{
    AccommodationStore, AuditStore, Constraint, ImageStore, Page, PropertyQuery, PropertyStore, Store,
    StoreResult, TenantStore,
};
use crate::error::ApiError;
use crate::tenancy::scope::{found, require_owner, visible_property};
use crate::tenancy::slug::{self, SlugLookup};
use crate::tenancy::Visibility;

struct PropertySlugs<'a>(&'a dyn Store);

#[async_trait]
impl SlugLookup for PropertySlugs<'_> {
    async fn slug_taken(&self, slug: &str) -> StoreResult<bool> {
        self.0.property_slug_exists(slug).await
    }
}

pub struct PropertyService<'a> {
    store: &'a dyn Store,
}

impl<'a> PropertyService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Creates the property and, in the same store call, the creator's OWNER
    /// grant.
    pub async fn create(&self, principal: &Principal, input: CreateProperty) -> ServiceResult<Property> {
        validate::required("name", &input.name)?;
        validate::zip_code(&input.zip_code)?;
        if let Some(color) = &input.primary_color {
            validate::color(color)?;
        }
        let custom_domain = match input.custom_domain.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => Some(self.check_domain(d, None).await?),
            _ => None,
        };
        if let Some(tenant_id) = input.tenant_id {
            let tenant = self.store.get_tenant(tenant_id).await?;
            found(tenant.filter(|t| t.owner_id == principal.user_id), "Tenant")?;
        }

        let now = Utc::now();
        let template = Property {
            id: Uuid::new_v4(),
            owner_id: principal.user_id,
            tenant_id: input.tenant_id,
            name: input.name.trim().to_string(),
            slug: String::new(),
            description: input.description,
            address: input.address,
            city: input.city,
            state: input.state,
            zip_code: input.zip_code,
            country: input.country.unwrap_or_else(|| "Brasil".to_string()),
            phone: input.phone,
            email: input.email,
            website: input.website,
            whatsapp: input.whatsapp,
            instagram: input.instagram,
            logo_url: input.logo_url,
            primary_color: input.primary_color,
            custom_domain,
            is_active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        let owner_grant = AccessGrant::new(principal.user_id, template.id, AccessRole::Owner);
        let store = self.store;

        let property = match input.slug {
            Some(requested) => {
                let requested = self.check_explicit_slug(&requested).await?;
                let property = Property { slug: requested, ..template };
                store.insert_property(&property, &owner_grant, Some(principal.user_id)).await?;
                property
            }
            None => {
                let base = slug::slugify(&template.name)
                    .ok_or_else(|| ApiError::invalid_field("name", "Name must contain letters or digits"))?;
                slug::insert_with_unique_slug(&PropertySlugs(store), &base, Constraint::PropertySlug, |slug| {
                    let property = Property { slug, ..template.clone() };
                    let grant = owner_grant.clone();
                    let actor = Some(principal.user_id);
                    async move { store.insert_property(&property, &grant, actor).await.map(|()| property) }
                })
                .await?
            }
        };

        info!("Property created: '{}' ({}) slug={} owner={}", property.name, property.id, property.slug, principal.user_id);
        Ok(property)
    }

    pub async fn list(&self, principal: &Principal, query: &PropertyQuery) -> ServiceResult<Page<Property>> {
        Ok(self.store.list_properties(Visibility::of(principal), query).await?)
    }

    pub async fn detail(&self, principal: &Principal, id: Uuid) -> ServiceResult<PropertyDetail> {
        let property = visible_property(self.store, principal, id).await?;
        let accommodations_count = self.store.count_active_accommodations(property.id).await?;
        let images = self
            .store
            .list_images(Visibility::of(principal), ImageFilter { property_id: Some(property.id), accommodation_id: None })
            .await?;
        Ok(PropertyDetail { property, accommodations_count, images })
    }

    pub async fn update(&self, principal: &Principal, id: Uuid, input: UpdateProperty) -> ServiceResult<Property> {
        let mut property = visible_property(self.store, principal, id).await?;

        if let Some(name) = input.name {
            validate::required("name", &name)?;
            property.name = name.trim().to_string();
        }
        if let Some(requested) = input.slug {
            if requested != property.slug {
                property.slug = self.check_explicit_slug(&requested).await?;
            }
        }
        if let Some(zip_code) = input.zip_code {
            validate::zip_code(&zip_code)?;
            property.zip_code = zip_code;
        }
        if let Some(color) = input.primary_color {
            validate::color(&color)?;
            property.primary_color = Some(color);
        }
        if let Some(domain) = input.custom_domain {
            property.custom_domain = match domain.as_deref().map(str::trim) {
                Some(d) if !d.is_empty() => Some(self.check_domain(d, Some(property.id)).await?),
                _ => None,
            };
        }

        macro_rules! assign {
            ($($field:ident),*) => {
                $(if let Some(v) = input.$field { property.$field = v; })*
            };
        }
        assign!(description, address, city, state, country, phone, email, website, whatsapp, instagram);
        if let Some(logo_url) = input.logo_url {
            property.logo_url = Some(logo_url);
        }

        property.updated_at = Utc::now();
        self.store.update_property(&property, Some(principal.user_id)).await?;
        Ok(property)
    }

    /// Deactivates the property and every accommodation it owns.
    pub async fn soft_delete(&self, principal: &Principal, id: Uuid) -> ServiceResult<()> {
        let property = visible_property(self.store, principal, id).await?;
        self.store.soft_delete_property(property.id, Utc::now(), Some(principal.user_id)).await?;
        info!("Property soft-deleted: '{}' ({}) by {}", property.name, property.id, principal.user_id);
        Ok(())
    }

    /// Recorded changes to the property row, oldest first. Owner only.
    pub async fn history(&self, principal: &Principal, id: Uuid) -> ServiceResult<Vec<AuditEntry>> {
        let property = visible_property(self.store, principal, id).await?;
        require_owner(self.store, principal, &property).await?;
        Ok(self.store.list_audit(AuditEntity::Property, property.id).await?)
    }

    pub async fn public_list(&self, query: &PropertyQuery) -> ServiceResult<Page<PublicProperty>> {
        let page = self.store.list_properties(Visibility::Public, query).await?;
        Ok(page.map(|p| PublicProperty::from(&p)))
    }

    pub async fn public_detail(&self, slug: &str) -> ServiceResult<PublicPropertyDetail> {
        let property = found(self.store.find_by_slug(Visibility::Public, slug).await?, "Property")?;
        self.public_view(property).await
    }

    /// The property a landing page is served for: the one resolved from the
    /// host, else the one named by `slug`.
    pub async fn current(&self, resolved: Option<Property>, slug: Option<&str>) -> ServiceResult<PublicPropertyDetail> {
        let property = match (resolved, slug) {
            (Some(property), _) => property,
            (None, Some(slug)) => self.store.find_by_slug(Visibility::Public, slug).await?.ok_or_else(no_property)?,
            (None, None) => return Err(no_property()),
        };
        self.public_view(property).await
    }

    async fn public_view(&self, property: Property) -> ServiceResult<PublicPropertyDetail> {
        let accommodations_count = self.store.count_active_accommodations(property.id).await?;
        let images = self
            .store
            .list_images(Visibility::Public, ImageFilter { property_id: Some(property.id), accommodation_id: None })
            .await?;
        Ok(PublicPropertyDetail {
            property: PublicProperty::from(&property),
            accommodations_count,
            images,
        })
    }

    async fn check_explicit_slug(&self, requested: &str) -> ServiceResult<String> {
        if !slug::is_valid_slug(requested) {
            return Err(ApiError::invalid_field(
                "slug",
                "Use lowercase letters, digits and hyphens only",
            ));
        }
        if self.store.property_slug_exists(requested).await? {
            return Err(ApiError::invalid_field("slug", "This slug is already in use"));
        }
        Ok(requested.to_string())
    }

    async fn check_domain(&self, raw: &str, except: Option<Uuid>) -> ServiceResult<String> {
        let domain = validate::custom_domain(raw, &config::config().tenancy)?;
        if self.store.custom_domain_taken(&domain, except).await? {
            return Err(ApiError::invalid_field("custom_domain", "This domain is already in use"));
        }
        Ok(domain)
    }
}

fn no_property() -> ApiError {
    ApiError::not_found("No property found for this domain")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::AuditAction;
    use crate::database::{AccessGrantStore, MemoryStore};
    use crate::testing::Fixtures;

    fn named(name: &str) -> CreateProperty {
        CreateProperty {
            name: name.to_string(),
            ..CreateProperty::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_suffixed_slug_and_owner_grant() {
        let store = MemoryStore::new();
        let owner = Fixtures::new(&store).user("owner").await;
        let service = PropertyService::new(&store);

        let first = service.create(&owner, named("Pousada Vista Linda")).await.unwrap();
        let second = service.create(&owner, named("Pousada Vista Linda")).await.unwrap();
        let third = service.create(&owner, named("Pousada  Vista Linda!")).await.unwrap();

        assert_eq!(first.slug, "pousada-vista-linda");
        assert_eq!(second.slug, "pousada-vista-linda-1");
        assert_eq!(third.slug, "pousada-vista-linda-2");

        let grant = store.find_grant(owner.user_id, first.id).await.unwrap().unwrap();
        assert_eq!(grant.role, AccessRole::Owner);
    }

    #[tokio::test]
    async fn explicit_slug_collision_is_a_validation_error() {
        let store = MemoryStore::new();
        let owner = Fixtures::new(&store).user("owner").await;
        let service = PropertyService::new(&store);
        service.create(&owner, named("Pousada Sol")).await.unwrap();

        let err = service
            .create(&owner, CreateProperty { slug: Some("pousada-sol".to_string()), ..named("Outra") })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn duplicate_domain_is_rejected() {
        let store = MemoryStore::new();
        let owner = Fixtures::new(&store).user("owner").await;
        let service = PropertyService::new(&store);
        let with_domain = |name: &str| CreateProperty {
            custom_domain: Some("pousadasol.com.br".to_string()),
            ..named(name)
        };

        service.create(&owner, with_domain("Pousada Sol")).await.unwrap();
        let err = service.create(&owner, with_domain("Pousada Lua")).await.unwrap_err();
        assert_eq!(err.message(), "This domain is already in use");
    }

    #[tokio::test]
    async fn strangers_get_not_found() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let stranger = fx.user("stranger").await;
        let property = fx.property(&owner, "Pousada Privada").await;
        let service = PropertyService::new(&store);

        assert!(matches!(service.detail(&stranger, property.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(
            service.update(&stranger, property.id, UpdateProperty::default()).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(service.soft_delete(&stranger, property.id).await, Err(ApiError::NotFound(_))));

        let page = service.list(&stranger, &PropertyQuery::paged(None, None, 20, 100)).await.unwrap();
        assert_eq!(page.count, 0);
    }

    #[tokio::test]
    async fn soft_delete_cascades_to_accommodations_only_of_that_property() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let doomed = fx.property(&owner, "Pousada A").await;
        let kept = fx.property(&owner, "Pousada B").await;
        let a1 = fx.accommodation(&doomed, "Suite 1").await;
        let a2 = fx.accommodation(&doomed, "Suite 2").await;
        let b1 = fx.accommodation(&kept, "Suite 1").await;

        PropertyService::new(&store).soft_delete(&owner, doomed.id).await.unwrap();

        let deleted = store.get_property(Visibility::Admin, doomed.id).await.unwrap().unwrap();
        assert!(!deleted.is_active);
        assert!(deleted.deleted_at.is_some());
        for id in [a1.id, a2.id] {
            let a = store.get_accommodation(Visibility::Admin, id).await.unwrap().unwrap();
            assert!(!a.is_active);
            assert!(a.deleted_at.is_some());
        }
        let b = store.get_accommodation(Visibility::Admin, b1.id).await.unwrap().unwrap();
        assert!(b.is_active);
        assert!(store.get_property(Visibility::of(&owner), kept.id).await.unwrap().is_some());
        assert!(store.get_property(Visibility::of(&owner), doomed.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn soft_delete_is_recorded_with_actor_and_flag_change() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let property = fx.property(&owner, "Pousada Antiga").await;
        let suite = fx.accommodation(&property, "Suite 1").await;

        PropertyService::new(&store).soft_delete(&owner, property.id).await.unwrap();

        let entries = store.list_audit(AuditEntity::Property, property.id).await.unwrap();
        let last = entries.last().unwrap();
        assert_eq!(last.action, AuditAction::Delete);
        assert_eq!(last.actor_id, Some(owner.user_id));
        assert_eq!(last.changes["is_active"], serde_json::json!([true, false]));
        assert!(last.changes["deleted_at"][1].is_string());

        let cascaded = store.list_audit(AuditEntity::Accommodation, suite.id).await.unwrap();
        assert_eq!(cascaded.last().map(|e| e.action), Some(AuditAction::Delete));
    }

    #[tokio::test]
    async fn history_lists_changes_for_owner_only() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let manager = fx.user("manager").await;
        let service = PropertyService::new(&store);
        let property = service.create(&owner, named("Pousada Mar")).await.unwrap();
        fx.grant(&manager, &property, AccessRole::Manager).await;

        let rename = UpdateProperty { name: Some("Pousada Maré".to_string()), ..UpdateProperty::default() };
        service.update(&owner, property.id, rename).await.unwrap();
        service.update(&owner, property.id, UpdateProperty::default()).await.unwrap();

        let history = service.history(&owner, property.id).await.unwrap();
        let actions: Vec<_> = history.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![AuditAction::Create, AuditAction::Update]);
        assert_eq!(history[1].changes, serde_json::json!({"name": ["Pousada Mar", "Pousada Maré"]}));

        assert!(matches!(service.history(&manager, property.id).await, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn update_can_clear_domain() {
        let store = MemoryStore::new();
        let owner = Fixtures::new(&store).user("owner").await;
        let service = PropertyService::new(&store);
        let p = service
            .create(&owner, CreateProperty { custom_domain: Some("sol.com.br".to_string()), ..named("Sol") })
            .await
            .unwrap();

        let updated = service
            .update(&owner, p.id, UpdateProperty { custom_domain: Some(None), ..UpdateProperty::default() })
            .await
            .unwrap();
        assert_eq!(updated.custom_domain, None);
        assert_eq!(updated.slug, "sol");
    }
}
