use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{validate, ServiceResult};
use crate::auth::Principal;
use crate::database::models::{CreateTenant, Tenant};
use crate::database::{Constraint, Store, StoreResult, TenantStore};
use crate::error::ApiError;
use crate::tenancy::slug::{self, SlugLookup};

struct TenantSlugs<'a>(&'a dyn Store);

#[async_trait]
impl SlugLookup for TenantSlugs<'_> {
    async fn slug_taken(&self, slug: &str) -> StoreResult<bool> {
        self.0.tenant_slug_exists(slug).await
    }
}

/// Organizations. Each user owns at most one.
pub struct TenantService<'a> {
    store: &'a dyn Store,
}

impl<'a> TenantService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, principal: &Principal, input: CreateTenant) -> ServiceResult<Tenant> {
        validate::required("name", &input.name)?;
        if !self.store.list_tenants_owned_by(principal.user_id).await?.is_empty() {
            return Err(ApiError::validation_error("User already has a tenant", None));
        }

        let now = Utc::now();
        let template = Tenant {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            slug: String::new(),
            owner_id: principal.user_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let store = self.store;

        let tenant = match input.slug {
            Some(requested) => {
                if !slug::is_valid_slug(&requested) {
                    return Err(ApiError::invalid_field("slug", "Use lowercase letters, digits and hyphens only"));
                }
                if store.tenant_slug_exists(&requested).await? {
                    return Err(ApiError::invalid_field("slug", "This slug is already in use"));
                }
                let tenant = Tenant { slug: requested, ..template };
                store.insert_tenant(&tenant).await?;
                tenant
            }
            None => {
                let base = slug::slugify(&template.name)
                    .ok_or_else(|| ApiError::invalid_field("name", "Name must contain letters or digits"))?;
                slug::insert_with_unique_slug(&TenantSlugs(store), &base, Constraint::TenantSlug, |slug| {
                    let tenant = Tenant { slug, ..template.clone() };
                    async move { store.insert_tenant(&tenant).await.map(|()| tenant) }
                })
                .await?
            }
        };

        tracing::info!("Tenant created: '{}' ({}) slug={}", tenant.name, tenant.id, tenant.slug);
        Ok(tenant)
    }

    pub async fn list(&self, principal: &Principal) -> ServiceResult<Vec<Tenant>> {
        Ok(self.store.list_tenants_owned_by(principal.user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::Fixtures;

    #[tokio::test]
    async fn one_tenant_per_owner_with_suffixed_slugs() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let ana = fx.user("ana").await;
        let bia = fx.user("bia").await;
        let service = TenantService::new(&store);
        let named = |name: &str| CreateTenant { name: name.to_string(), slug: None };

        let first = service.create(&ana, named("Grupo Serra Azul")).await.unwrap();
        assert_eq!(first.slug, "grupo-serra-azul");
        assert!(matches!(
            service.create(&ana, named("Outro Grupo")).await,
            Err(ApiError::ValidationError { .. })
        ));

        let second = service.create(&bia, named("Grupo Serra Azul")).await.unwrap();
        assert_eq!(second.slug, "grupo-serra-azul-1");
        assert_eq!(service.list(&bia).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn explicit_slug_must_be_free() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let ana = fx.user("ana").await;
        let bia = fx.user("bia").await;
        let service = TenantService::new(&store);

        let with_slug = |slug: &str| CreateTenant { name: "Grupo".to_string(), slug: Some(slug.to_string()) };
        service.create(&ana, with_slug("grupo")).await.unwrap();
        assert!(matches!(
            service.create(&bia, with_slug("grupo")).await,
            Err(ApiError::ValidationError { .. })
        ));
        assert!(matches!(
            service.create(&bia, with_slug("Grupo X")).await,
            Err(ApiError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn store_refuses_second_tenant_for_same_owner() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let ana = fx.user("ana").await;
        let tenant = |slug: &str| Tenant {
            id: Uuid::new_v4(),
            name: "Grupo".to_string(),
            slug: slug.to_string(),
            owner_id: ana.user_id,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        store.insert_tenant(&tenant("grupo-a")).await.unwrap();
        let err = store.insert_tenant(&tenant("grupo-b")).await.unwrap_err();
        assert!(matches!(err, crate::database::StoreError::Conflict(Constraint::TenantOwner)));

        match ApiError::from(err) {
            ApiError::ValidationError { message, .. } => assert_eq!(message, "User already has a tenant"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.list_tenants_owned_by(ana.user_id).await.unwrap().len(), 1);
    }
}
