//! Persistence contracts.
//!
//! Every list/detail lookup takes a [`Visibility`] so the access rule is
//! applied as a row filter inside the store rather than in each handler.
//! `PgStore` and `MemoryStore` implement the same contracts, including the
//! unique constraints (reported as [`StoreError::Conflict`]).
//!
//! Writes to audited entities take the acting user and record an
//! [`AuditEntry`] as part of the same call, so the change and its history
//! commit or fail together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::error::StoreResult;
use super::models::*;
use crate::tenancy::Visibility;

/// Filters for property listings.
#[derive(Debug, Clone, Default)]
pub struct PropertyQuery {
    pub search: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl PropertyQuery {
    /// Builds a query with page numbers starting at 1 and the page size
    /// clamped to `1..=max_page_size`.
    pub fn paged(page: Option<u32>, page_size: Option<u32>, default_size: u32, max_size: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, max_size.max(1)),
            ..Self::default()
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn insert_tenant(&self, tenant: &Tenant) -> StoreResult<()>;
    async fn tenant_slug_exists(&self, slug: &str) -> StoreResult<bool>;
    async fn get_tenant(&self, id: Uuid) -> StoreResult<Option<Tenant>>;
    async fn list_tenants_owned_by(&self, user_id: Uuid) -> StoreResult<Vec<Tenant>>;
}

#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Inserts the property together with its owner grant, atomically.
    async fn insert_property(
        &self,
        property: &Property,
        owner_grant: &AccessGrant,
        actor: Option<Uuid>,
    ) -> StoreResult<()>;
    async fn property_slug_exists(&self, slug: &str) -> StoreResult<bool>;
    /// Whether another property (other than `except`) already uses `domain`.
    async fn custom_domain_taken(&self, domain: &str, except: Option<Uuid>) -> StoreResult<bool>;
    /// Exact, case-sensitive lookup among active properties.
    async fn find_by_custom_domain(&self, domain: &str) -> StoreResult<Option<Property>>;
    async fn find_by_slug(&self, visibility: Visibility, slug: &str) -> StoreResult<Option<Property>>;
    async fn get_property(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Property>>;
    async fn list_properties(&self, visibility: Visibility, query: &PropertyQuery) -> StoreResult<Page<Property>>;
    async fn update_property(&self, property: &Property, actor: Option<Uuid>) -> StoreResult<()>;
    /// Marks the property and every active accommodation it owns inactive.
    async fn soft_delete_property(&self, id: Uuid, at: DateTime<Utc>, actor: Option<Uuid>) -> StoreResult<()>;
}

#[async_trait]
pub trait AccommodationStore: Send + Sync {
    async fn insert_accommodation(&self, accommodation: &Accommodation, actor: Option<Uuid>) -> StoreResult<()>;
    async fn get_accommodation(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Accommodation>>;
    async fn list_accommodations(
        &self,
        visibility: Visibility,
        property_id: Option<Uuid>,
    ) -> StoreResult<Vec<Accommodation>>;
    async fn update_accommodation(&self, accommodation: &Accommodation, actor: Option<Uuid>) -> StoreResult<()>;
    async fn soft_delete_accommodation(&self, id: Uuid, at: DateTime<Utc>, actor: Option<Uuid>) -> StoreResult<()>;
    async fn count_active_accommodations(&self, property_id: Uuid) -> StoreResult<i64>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert_image(&self, image: &Image, actor: Option<Uuid>) -> StoreResult<()>;
    async fn get_image(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Image>>;
    async fn list_images(&self, visibility: Visibility, filter: ImageFilter) -> StoreResult<Vec<Image>>;
    async fn delete_image(&self, id: Uuid, actor: Option<Uuid>) -> StoreResult<()>;
}

#[async_trait]
pub trait AccessGrantStore: Send + Sync {
    async fn insert_grant(&self, grant: &AccessGrant, actor: Option<Uuid>) -> StoreResult<()>;
    async fn find_grant(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<Option<AccessGrant>>;
    async fn list_grants(&self, property_id: Uuid) -> StoreResult<Vec<AccessGrant>>;
    /// Returns whether a grant was removed.
    async fn delete_grant(&self, user_id: Uuid, property_id: Uuid, actor: Option<Uuid>) -> StoreResult<bool>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// History of one row, oldest first.
    async fn list_audit(&self, entity: AuditEntity, entity_id: Uuid) -> StoreResult<Vec<AuditEntry>>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert_guest(&self, guest: &Guest) -> StoreResult<()>;
    async fn get_guest(&self, id: Uuid) -> StoreResult<Option<Guest>>;
    async fn list_guests(&self, property_id: Uuid) -> StoreResult<Vec<Guest>>;
    async fn insert_reservation(&self, reservation: &Reservation) -> StoreResult<()>;
    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>>;
    async fn list_reservations(&self, property_id: Uuid) -> StoreResult<Vec<Reservation>>;
    async fn list_reservation_payments(&self, reservation_id: Uuid) -> StoreResult<Vec<ReservationPayment>>;
    async fn list_invoices(&self, property_id: Uuid) -> StoreResult<Vec<Invoice>>;
}

#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn list_plans(&self, active_only: bool) -> StoreResult<Vec<Plan>>;
    /// Inserts the plan unless one with the same name exists. Returns the
    /// stored plan and whether it was created.
    async fn get_or_create_plan(&self, plan: &Plan) -> StoreResult<(Plan, bool)>;
    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()>;
    async fn get_subscription(&self, property_id: Uuid) -> StoreResult<Option<SubscriptionWithPlan>>;
    async fn list_subscriptions(&self) -> StoreResult<Vec<SubscriptionWithPlan>>;
}

/// The full persistence surface the API needs.
#[async_trait]
pub trait Store:
    UserStore
    + TenantStore
    + PropertyStore
    + AccommodationStore
    + ImageStore
    + AccessGrantStore
    + BookingStore
    + BillingStore
    + AuditStore
{
    async fn health_check(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paged_query_clamps_and_offsets() {
        let q = PropertyQuery::paged(Some(3), Some(500), 20, 100);
        assert_eq!(q.page_size, 100);
        assert_eq!(q.offset(), 200);

        let q = PropertyQuery::paged(Some(0), None, 20, 100);
        assert_eq!(q.page, 1);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.limit(), 20);
    }
}
