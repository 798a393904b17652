//! In-process store used by the test suite and by `hyfen-api` when no
//! `DATABASE_URL` is configured. Enforces the same unique constraints and
//! row filters as the Postgres store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{Constraint, StoreError, StoreResult};
use super::models::*;
use super::store::*;
use crate::tenancy::Visibility;
use crate::text;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    tenants: HashMap<Uuid, Tenant>,
    properties: HashMap<Uuid, Property>,
    accommodations: HashMap<Uuid, Accommodation>,
    images: HashMap<Uuid, Image>,
    grants: Vec<AccessGrant>,
    guests: HashMap<Uuid, Guest>,
    reservations: HashMap<Uuid, Reservation>,
    payments: Vec<ReservationPayment>,
    invoices: Vec<Invoice>,
    plans: HashMap<Uuid, Plan>,
    subscriptions: HashMap<Uuid, Subscription>,
    audit: Vec<AuditEntry>,
}

impl Tables {
    fn record(&mut self, entry: AuditEntry) {
        entry.trace();
        self.audit.push(entry);
    }

    fn has_grant(&self, user_id: Uuid, property_id: Uuid) -> bool {
        self.grants
            .iter()
            .any(|g| g.user_id == user_id && g.property_id == property_id)
    }

    fn property_visible(&self, visibility: Visibility, property: &Property) -> bool {
        let has_grant = match visibility {
            Visibility::Principal(user_id) => self.has_grant(user_id, property.id),
            _ => false,
        };
        visibility.admits(property, has_grant)
    }

    fn property_id_visible(&self, visibility: Visibility, property_id: Uuid) -> bool {
        self.properties
            .get(&property_id)
            .is_some_and(|p| self.property_visible(visibility, p))
    }

    fn accommodation_visible(&self, visibility: Visibility, accommodation: &Accommodation) -> bool {
        (accommodation.is_active || visibility.includes_inactive())
            && self.property_id_visible(visibility, accommodation.property_id)
    }

    fn image_visible(&self, visibility: Visibility, image: &Image) -> bool {
        match (image.property_id, image.accommodation_id) {
            (Some(property_id), _) => self.property_id_visible(visibility, property_id),
            (None, Some(accommodation_id)) => self
                .accommodations
                .get(&accommodation_id)
                .is_some_and(|a| self.accommodation_visible(visibility, a)),
            (None, None) => false,
        }
    }

    fn check_property_unique(&self, property: &Property) -> StoreResult<()> {
        for other in self.properties.values().filter(|p| p.id != property.id) {
            if other.slug == property.slug {
                return Err(StoreError::Conflict(Constraint::PropertySlug));
            }
            if property.custom_domain.is_some() && other.custom_domain == property.custom_domain {
                return Err(StoreError::Conflict(Constraint::PropertyDomain));
            }
        }
        Ok(())
    }

    fn plan_for(&self, subscription: &Subscription) -> StoreResult<SubscriptionWithPlan> {
        let plan = self
            .plans
            .get(&subscription.plan_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Plan {}", subscription.plan_id)))?;
        Ok(SubscriptionWithPlan {
            subscription: subscription.clone(),
            plan,
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a payment row. Payments have no API write path.
    pub async fn insert_reservation_payment(&self, payment: ReservationPayment) {
        self.tables.write().await.payments.push(payment);
    }

    /// Seeds an invoice row. Invoices have no API write path.
    pub async fn insert_invoice(&self, invoice: Invoice) {
        self.tables.write().await.invoices.push(invoice);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(Constraint::UserUsername));
        }
        t.users.insert(user.id, user.clone());
        t.record(AuditEntry::created(AuditEntity::User, user.id, None, user));
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn insert_tenant(&self, tenant: &Tenant) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&tenant.owner_id) {
            return Err(StoreError::MissingReference("tenants_owner_id_fkey".to_string()));
        }
        if t.tenants.values().any(|x| x.slug == tenant.slug) {
            return Err(StoreError::Conflict(Constraint::TenantSlug));
        }
        if t.tenants.values().any(|x| x.owner_id == tenant.owner_id) {
            return Err(StoreError::Conflict(Constraint::TenantOwner));
        }
        t.tenants.insert(tenant.id, tenant.clone());
        Ok(())
    }

    async fn tenant_slug_exists(&self, slug: &str) -> StoreResult<bool> {
        Ok(self.tables.read().await.tenants.values().any(|t| t.slug == slug))
    }

    async fn get_tenant(&self, id: Uuid) -> StoreResult<Option<Tenant>> {
        Ok(self.tables.read().await.tenants.get(&id).cloned())
    }

    async fn list_tenants_owned_by(&self, user_id: Uuid) -> StoreResult<Vec<Tenant>> {
        let t = self.tables.read().await;
        let mut tenants: Vec<Tenant> = t.tenants.values().filter(|x| x.owner_id == user_id).cloned().collect();
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tenants)
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn insert_property(
        &self,
        property: &Property,
        owner_grant: &AccessGrant,
        actor: Option<Uuid>,
    ) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&property.owner_id) {
            return Err(StoreError::MissingReference("properties_owner_id_fkey".to_string()));
        }
        if let Some(tenant_id) = property.tenant_id {
            if !t.tenants.contains_key(&tenant_id) {
                return Err(StoreError::MissingReference("properties_tenant_id_fkey".to_string()));
            }
        }
        if t.properties.contains_key(&property.id) {
            return Err(StoreError::Conflict(Constraint::PropertySlug));
        }
        t.check_property_unique(property)?;
        if t.has_grant(owner_grant.user_id, owner_grant.property_id) {
            return Err(StoreError::Conflict(Constraint::AccessGrantPair));
        }

        t.properties.insert(property.id, property.clone());
        t.grants.push(owner_grant.clone());
        t.record(AuditEntry::created(AuditEntity::Property, property.id, actor, property));
        t.record(AuditEntry::created(AuditEntity::AccessGrant, owner_grant.id, actor, owner_grant));
        Ok(())
    }

    async fn property_slug_exists(&self, slug: &str) -> StoreResult<bool> {
        Ok(self.tables.read().await.properties.values().any(|p| p.slug == slug))
    }

    async fn custom_domain_taken(&self, domain: &str, except: Option<Uuid>) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.properties
            .values()
            .any(|p| Some(p.id) != except && p.custom_domain.as_deref() == Some(domain)))
    }

    async fn find_by_custom_domain(&self, domain: &str) -> StoreResult<Option<Property>> {
        let t = self.tables.read().await;
        Ok(t.properties
            .values()
            .find(|p| p.is_active && p.custom_domain.as_deref() == Some(domain))
            .cloned())
    }

    async fn find_by_slug(&self, visibility: Visibility, slug: &str) -> StoreResult<Option<Property>> {
        let t = self.tables.read().await;
        Ok(t.properties
            .values()
            .find(|p| p.slug == slug && t.property_visible(visibility, p))
            .cloned())
    }

    async fn get_property(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Property>> {
        let t = self.tables.read().await;
        Ok(t.properties
            .get(&id)
            .filter(|p| t.property_visible(visibility, p))
            .cloned())
    }

    async fn list_properties(&self, visibility: Visibility, query: &PropertyQuery) -> StoreResult<Page<Property>> {
        let t = self.tables.read().await;
        let mut rows: Vec<&Property> = t
            .properties
            .values()
            .filter(|p| t.property_visible(visibility, p))
            .filter(|p| match query.search.as_deref() {
                Some(s) => text::matches(&p.name, s) || text::matches(&p.city, s),
                None => true,
            })
            .filter(|p| match query.city.as_deref() {
                Some(city) => text::fold(&p.city) == text::fold(city),
                None => true,
            })
            .filter(|p| match query.state.as_deref() {
                Some(state) => p.state.eq_ignore_ascii_case(state),
                None => true,
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let count = rows.len() as i64;
        let results = rows
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .cloned()
            .collect();

        Ok(Page {
            count,
            page: query.page,
            page_size: query.page_size,
            results,
        })
    }

    async fn update_property(&self, property: &Property, actor: Option<Uuid>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let before = t
            .properties
            .get(&property.id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Property {}", property.id)))?;
        t.check_property_unique(property)?;
        t.properties.insert(property.id, property.clone());
        if let Some(entry) = AuditEntry::updated(AuditEntity::Property, property.id, actor, &before, property) {
            t.record(entry);
        }
        Ok(())
    }

    async fn soft_delete_property(&self, id: Uuid, at: DateTime<Utc>, actor: Option<Uuid>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let property = t
            .properties
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Property {}", id)))?;
        let before = property.clone();
        property.is_active = false;
        property.deleted_at = Some(at);
        property.updated_at = at;
        let entry = AuditEntry::deleted(AuditEntity::Property, id, actor, &before, Some(&*property));

        let mut cascaded = Vec::new();
        for accommodation in t.accommodations.values_mut().filter(|a| a.property_id == id && a.is_active) {
            let before = accommodation.clone();
            accommodation.is_active = false;
            accommodation.deleted_at.get_or_insert(at);
            accommodation.updated_at = at;
            cascaded.push(AuditEntry::deleted(
                AuditEntity::Accommodation,
                accommodation.id,
                actor,
                &before,
                Some(&*accommodation),
            ));
        }

        t.record(entry);
        for entry in cascaded {
            t.record(entry);
        }
        Ok(())
    }
}

#[async_trait]
impl AccommodationStore for MemoryStore {
    async fn insert_accommodation(&self, accommodation: &Accommodation, actor: Option<Uuid>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.properties.contains_key(&accommodation.property_id) {
            return Err(StoreError::MissingReference("accommodations_property_id_fkey".to_string()));
        }
        t.accommodations.insert(accommodation.id, accommodation.clone());
        t.record(AuditEntry::created(AuditEntity::Accommodation, accommodation.id, actor, accommodation));
        Ok(())
    }

    async fn get_accommodation(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Accommodation>> {
        let t = self.tables.read().await;
        Ok(t.accommodations
            .get(&id)
            .filter(|a| t.accommodation_visible(visibility, a))
            .cloned())
    }

    async fn list_accommodations(
        &self,
        visibility: Visibility,
        property_id: Option<Uuid>,
    ) -> StoreResult<Vec<Accommodation>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Accommodation> = t
            .accommodations
            .values()
            .filter(|a| property_id.map_or(true, |id| a.property_id == id))
            .filter(|a| t.accommodation_visible(visibility, a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn update_accommodation(&self, accommodation: &Accommodation, actor: Option<Uuid>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let row = t
            .accommodations
            .get_mut(&accommodation.id)
            .ok_or_else(|| StoreError::NotFound(format!("Accommodation {}", accommodation.id)))?;
        let before = std::mem::replace(row, accommodation.clone());
        if let Some(entry) =
            AuditEntry::updated(AuditEntity::Accommodation, accommodation.id, actor, &before, accommodation)
        {
            t.record(entry);
        }
        Ok(())
    }

    async fn soft_delete_accommodation(&self, id: Uuid, at: DateTime<Utc>, actor: Option<Uuid>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let row = t
            .accommodations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Accommodation {}", id)))?;
        let before = row.clone();
        row.is_active = false;
        row.deleted_at = Some(at);
        row.updated_at = at;
        let entry = AuditEntry::deleted(AuditEntity::Accommodation, id, actor, &before, Some(&*row));
        t.record(entry);
        Ok(())
    }

    async fn count_active_accommodations(&self, property_id: Uuid) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.accommodations
            .values()
            .filter(|a| a.property_id == property_id && a.is_active)
            .count() as i64)
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn insert_image(&self, image: &Image, actor: Option<Uuid>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if image.property_id.is_some_and(|id| !t.properties.contains_key(&id)) {
            return Err(StoreError::MissingReference("images_property_id_fkey".to_string()));
        }
        if image.accommodation_id.is_some_and(|id| !t.accommodations.contains_key(&id)) {
            return Err(StoreError::MissingReference("images_accommodation_id_fkey".to_string()));
        }
        t.images.insert(image.id, image.clone());
        t.record(AuditEntry::created(AuditEntity::Image, image.id, actor, image));
        Ok(())
    }

    async fn get_image(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Image>> {
        let t = self.tables.read().await;
        Ok(t.images.get(&id).filter(|i| t.image_visible(visibility, i)).cloned())
    }

    async fn list_images(&self, visibility: Visibility, filter: ImageFilter) -> StoreResult<Vec<Image>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Image> = t
            .images
            .values()
            .filter(|i| filter.property_id.map_or(true, |id| i.property_id == Some(id)))
            .filter(|i| filter.accommodation_id.map_or(true, |id| i.accommodation_id == Some(id)))
            .filter(|i| t.image_visible(visibility, i))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)));
        Ok(rows)
    }

    async fn delete_image(&self, id: Uuid, actor: Option<Uuid>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let image = t
            .images
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Image {}", id)))?;
        t.record(AuditEntry::deleted(AuditEntity::Image, id, actor, &image, None));
        Ok(())
    }
}

#[async_trait]
impl AccessGrantStore for MemoryStore {
    async fn insert_grant(&self, grant: &AccessGrant, actor: Option<Uuid>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&grant.user_id) {
            return Err(StoreError::MissingReference("property_access_user_id_fkey".to_string()));
        }
        if !t.properties.contains_key(&grant.property_id) {
            return Err(StoreError::MissingReference("property_access_property_id_fkey".to_string()));
        }
        if t.has_grant(grant.user_id, grant.property_id) {
            return Err(StoreError::Conflict(Constraint::AccessGrantPair));
        }
        t.grants.push(grant.clone());
        t.record(AuditEntry::created(AuditEntity::AccessGrant, grant.id, actor, grant));
        Ok(())
    }

    async fn find_grant(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<Option<AccessGrant>> {
        let t = self.tables.read().await;
        Ok(t.grants
            .iter()
            .find(|g| g.user_id == user_id && g.property_id == property_id)
            .cloned())
    }

    async fn list_grants(&self, property_id: Uuid) -> StoreResult<Vec<AccessGrant>> {
        let t = self.tables.read().await;
        let mut grants: Vec<AccessGrant> = t.grants.iter().filter(|g| g.property_id == property_id).cloned().collect();
        grants.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(grants)
    }

    async fn delete_grant(&self, user_id: Uuid, property_id: Uuid, actor: Option<Uuid>) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let Some(index) = t
            .grants
            .iter()
            .position(|g| g.user_id == user_id && g.property_id == property_id)
        else {
            return Ok(false);
        };
        let grant = t.grants.remove(index);
        t.record(AuditEntry::deleted(AuditEntity::AccessGrant, grant.id, actor, &grant, None));
        Ok(true)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn list_audit(&self, entity: AuditEntity, entity_id: Uuid) -> StoreResult<Vec<AuditEntry>> {
        let t = self.tables.read().await;
        Ok(t.audit
            .iter()
            .filter(|e| e.entity == entity && e.entity_id == entity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_guest(&self, guest: &Guest) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.properties.contains_key(&guest.property_id) {
            return Err(StoreError::MissingReference("guests_property_id_fkey".to_string()));
        }
        t.guests.insert(guest.id, guest.clone());
        Ok(())
    }

    async fn get_guest(&self, id: Uuid) -> StoreResult<Option<Guest>> {
        Ok(self.tables.read().await.guests.get(&id).cloned())
    }

    async fn list_guests(&self, property_id: Uuid) -> StoreResult<Vec<Guest>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Guest> = t.guests.values().filter(|g| g.property_id == property_id).cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_reservation(&self, reservation: &Reservation) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.accommodations.contains_key(&reservation.accommodation_id) {
            return Err(StoreError::MissingReference("reservations_accommodation_id_fkey".to_string()));
        }
        if !t.guests.contains_key(&reservation.guest_id) {
            return Err(StoreError::MissingReference("reservations_guest_id_fkey".to_string()));
        }
        t.reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        Ok(self.tables.read().await.reservations.get(&id).cloned())
    }

    async fn list_reservations(&self, property_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Reservation> = t
            .reservations
            .values()
            .filter(|r| r.property_id == property_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_reservation_payments(&self, reservation_id: Uuid) -> StoreResult<Vec<ReservationPayment>> {
        let t = self.tables.read().await;
        Ok(t.payments.iter().filter(|p| p.reservation_id == reservation_id).cloned().collect())
    }

    async fn list_invoices(&self, property_id: Uuid) -> StoreResult<Vec<Invoice>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Invoice> = t.invoices.iter().filter(|i| i.property_id == property_id).cloned().collect();
        rows.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        Ok(rows)
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn list_plans(&self, active_only: bool) -> StoreResult<Vec<Plan>> {
        let t = self.tables.read().await;
        let mut plans: Vec<Plan> = t.plans.values().filter(|p| !active_only || p.is_active).cloned().collect();
        plans.sort_by(|a, b| a.monthly_price.cmp(&b.monthly_price));
        Ok(plans)
    }

    async fn get_or_create_plan(&self, plan: &Plan) -> StoreResult<(Plan, bool)> {
        let mut t = self.tables.write().await;
        if let Some(existing) = t.plans.values().find(|p| p.name == plan.name) {
            return Ok((existing.clone(), false));
        }
        t.plans.insert(plan.id, plan.clone());
        Ok((plan.clone(), true))
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if !t.plans.contains_key(&subscription.plan_id) {
            return Err(StoreError::MissingReference("subscriptions_plan_id_fkey".to_string()));
        }
        if t.subscriptions.values().any(|s| s.property_id == subscription.property_id) {
            return Err(StoreError::Conflict(Constraint::SubscriptionProperty));
        }
        t.subscriptions.insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn get_subscription(&self, property_id: Uuid) -> StoreResult<Option<SubscriptionWithPlan>> {
        let t = self.tables.read().await;
        t.subscriptions
            .values()
            .find(|s| s.property_id == property_id)
            .map(|s| t.plan_for(s))
            .transpose()
    }

    async fn list_subscriptions(&self) -> StoreResult<Vec<SubscriptionWithPlan>> {
        let t = self.tables.read().await;
        t.subscriptions.values().map(|s| t.plan_for(s)).collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
