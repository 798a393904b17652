//! Access grants: who, besides the direct owner, may manage a property.

use uuid::Uuid;

use super::ServiceResult;
use crate::auth::Principal;
use crate::database::models::{AccessGrant, CreateAccessGrant};
use crate::database::{AccessGrantStore, Store, UserStore};
use crate::error::ApiError;
use crate::tenancy::scope::{require_owner, visible_property};

pub struct AccessService<'a> {
    store: &'a dyn Store,
}

impl<'a> AccessService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn list(&self, principal: &Principal, property_id: Uuid) -> ServiceResult<Vec<AccessGrant>> {
        let property = visible_property(self.store, principal, property_id).await?;
        Ok(self.store.list_grants(property.id).await?)
    }

    pub async fn grant(
        &self,
        principal: &Principal,
        property_id: Uuid,
        input: CreateAccessGrant,
    ) -> ServiceResult<AccessGrant> {
        let property = visible_property(self.store, principal, property_id).await?;
        require_owner(self.store, principal, &property).await?;

        if self.store.get_user(input.user_id).await?.is_none() {
            return Err(ApiError::invalid_field("user_id", "User does not exist"));
        }
        if self.store.find_grant(input.user_id, property.id).await?.is_some() {
            return Err(ApiError::invalid_field("user_id", "User already has access to this property"));
        }

        let grant = AccessGrant::new(input.user_id, property.id, input.role);
        self.store.insert_grant(&grant, Some(principal.user_id)).await?;
        tracing::info!("Access granted: user {} is {:?} of property {}", grant.user_id, grant.role, property.id);
        Ok(grant)
    }

    pub async fn revoke(&self, principal: &Principal, property_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let property = visible_property(self.store, principal, property_id).await?;
        require_owner(self.store, principal, &property).await?;

        if user_id == property.owner_id {
            return Err(ApiError::invalid_field("user_id", "The property owner's access cannot be revoked"));
        }
        if !self.store.delete_grant(user_id, property.id, Some(principal.user_id)).await? {
            return Err(ApiError::not_found("Access grant not found"));
        }
        tracing::info!("Access revoked: user {} on property {}", user_id, property.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::AccessRole;
    use crate::database::MemoryStore;
    use crate::testing::Fixtures;

    #[tokio::test]
    async fn owner_grants_and_revokes_manager() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let manager = fx.user("manager").await;
        let property = fx.property(&owner, "Pousada").await;
        let service = AccessService::new(&store);

        let input = || CreateAccessGrant { user_id: manager.user_id, role: AccessRole::Manager };
        service.grant(&owner, property.id, input()).await.unwrap();
        assert_eq!(service.list(&manager, property.id).await.unwrap().len(), 2);

        let dup = service.grant(&owner, property.id, input()).await.unwrap_err();
        assert!(matches!(dup, ApiError::ValidationError { .. }));

        service.revoke(&owner, property.id, manager.user_id).await.unwrap();
        assert!(matches!(service.list(&manager, property.id).await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn manager_cannot_manage_access() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let manager = fx.user("manager").await;
        let other = fx.user("other").await;
        let property = fx.property(&owner, "Pousada").await;
        fx.grant(&manager, &property, AccessRole::Manager).await;
        let service = AccessService::new(&store);

        let err = service
            .grant(&manager, property.id, CreateAccessGrant { user_id: other.user_id, role: AccessRole::Manager })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn owner_grant_is_permanent_and_target_must_exist() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let property = fx.property(&owner, "Pousada").await;
        let service = AccessService::new(&store);

        assert!(matches!(
            service.revoke(&owner, property.id, owner.user_id).await,
            Err(ApiError::ValidationError { .. })
        ));
        assert!(matches!(
            service
                .grant(&owner, property.id, CreateAccessGrant { user_id: Uuid::new_v4(), role: AccessRole::Manager })
                .await,
            Err(ApiError::ValidationError { .. })
        ));
    }
}
