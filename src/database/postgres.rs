//! Postgres-backed [`Store`].
//!
//! Queries are runtime-checked (`query_as` + `FromRow`); visibility rules
//! are pushed into SQL through [`QueryBuilder`] so pagination counts match
//! what the caller can actually see.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::models::*;
use super::store::*;
use crate::tenancy::Visibility;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Writes `entry` on the caller's connection, normally the transaction that
/// carries the change itself.
async fn insert_audit(conn: &mut PgConnection, entry: &AuditEntry) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO audit_log (id, entity, entity_id, action, actor_id, changes, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(entry.id)
    .bind(entry.entity)
    .bind(entry.entity_id)
    .bind(entry.action)
    .bind(entry.actor_id)
    .bind(&entry.changes)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Appends the property row filter for `alias`.
fn push_property_scope(qb: &mut QueryBuilder<'_, Postgres>, visibility: Visibility, alias: &str) {
    match visibility {
        Visibility::Public => {
            qb.push(format!("{alias}.is_active"));
        }
        Visibility::Principal(user_id) => {
            qb.push(format!("{alias}.is_active AND ({alias}.owner_id = "));
            qb.push_bind(user_id);
            qb.push(format!(
                " OR EXISTS (SELECT 1 FROM property_access pa WHERE pa.property_id = {alias}.id AND pa.user_id = "
            ));
            qb.push_bind(user_id);
            qb.push("))");
        }
        Visibility::Admin => {
            qb.push("TRUE");
        }
    }
}

fn push_property_filters(qb: &mut QueryBuilder<'_, Postgres>, visibility: Visibility, query: &PropertyQuery) {
    qb.push(" WHERE ");
    push_property_scope(qb, visibility, "p");

    if let Some(search) = query.search.clone().filter(|s| !s.is_empty()) {
        qb.push(" AND (strpos(unaccent(lower(p.name)), unaccent(lower(");
        qb.push_bind(search.clone());
        qb.push("))) > 0 OR strpos(unaccent(lower(p.city)), unaccent(lower(");
        qb.push_bind(search);
        qb.push("))) > 0)");
    }
    if let Some(city) = query.city.clone() {
        qb.push(" AND unaccent(lower(p.city)) = unaccent(lower(");
        qb.push_bind(city);
        qb.push("))");
    }
    if let Some(state) = query.state.clone() {
        qb.push(" AND lower(p.state) = lower(");
        qb.push_bind(state);
        qb.push(")");
    }
}

const ACCOMMODATION_FROM: &str = "SELECT a.* FROM accommodations a JOIN properties p ON p.id = a.property_id WHERE ";

fn push_accommodation_scope(qb: &mut QueryBuilder<'_, Postgres>, visibility: Visibility) {
    if !visibility.includes_inactive() {
        qb.push("a.is_active AND ");
    }
    push_property_scope(qb, visibility, "p");
}

const IMAGE_FROM: &str = "SELECT i.* FROM images i \
     LEFT JOIN accommodations a ON a.id = i.accommodation_id \
     JOIN properties p ON p.id = COALESCE(i.property_id, a.property_id) WHERE ";

fn push_image_scope(qb: &mut QueryBuilder<'_, Postgres>, visibility: Visibility) {
    if !visibility.includes_inactive() {
        qb.push("(i.accommodation_id IS NULL OR a.is_active) AND ");
    }
    push_property_scope(qb, visibility, "p");
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO users (id, username, email, is_staff, is_active, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.is_staff)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;

        let entry = AuditEntry::created(AuditEntity::User, user.id, None, user);
        insert_audit(&mut tx, &entry).await?;
        tx.commit().await?;
        entry.trace();
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl TenantStore for PgStore {
    async fn insert_tenant(&self, tenant: &Tenant) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO tenants (id, name, slug, owner_id, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(tenant.owner_id)
        .bind(tenant.is_active)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn tenant_slug_exists(&self, slug: &str) -> StoreResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tenants WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_tenant(&self, id: Uuid) -> StoreResult<Option<Tenant>> {
        Ok(sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_tenants_owned_by(&self, user_id: Uuid) -> StoreResult<Vec<Tenant>> {
        Ok(sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE owner_id = $1 ORDER BY name")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl PropertyStore for PgStore {
    async fn insert_property(
        &self,
        property: &Property,
        owner_grant: &AccessGrant,
        actor: Option<Uuid>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO properties (id, owner_id, tenant_id, name, slug, description, address, city, state, \
             zip_code, country, phone, email, website, whatsapp, instagram, logo_url, primary_color, \
             custom_domain, is_active, deleted_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)",
        )
        .bind(property.id)
        .bind(property.owner_id)
        .bind(property.tenant_id)
        .bind(&property.name)
        .bind(&property.slug)
        .bind(&property.description)
        .bind(&property.address)
        .bind(&property.city)
        .bind(&property.state)
        .bind(&property.zip_code)
        .bind(&property.country)
        .bind(&property.phone)
        .bind(&property.email)
        .bind(&property.website)
        .bind(&property.whatsapp)
        .bind(&property.instagram)
        .bind(&property.logo_url)
        .bind(&property.primary_color)
        .bind(&property.custom_domain)
        .bind(property.is_active)
        .bind(property.deleted_at)
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO property_access (id, user_id, property_id, role, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(owner_grant.id)
            .bind(owner_grant.user_id)
            .bind(owner_grant.property_id)
            .bind(owner_grant.role)
            .bind(owner_grant.created_at)
            .execute(&mut *tx)
            .await?;

        let entries = [
            AuditEntry::created(AuditEntity::Property, property.id, actor, property),
            AuditEntry::created(AuditEntity::AccessGrant, owner_grant.id, actor, owner_grant),
        ];
        for entry in &entries {
            insert_audit(&mut tx, entry).await?;
        }
        tx.commit().await?;
        entries.iter().for_each(AuditEntry::trace);
        Ok(())
    }

    async fn property_slug_exists(&self, slug: &str) -> StoreResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM properties WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn custom_domain_taken(&self, domain: &str, except: Option<Uuid>) -> StoreResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM properties WHERE custom_domain = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(domain)
        .bind(except)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_by_custom_domain(&self, domain: &str) -> StoreResult<Option<Property>> {
        Ok(sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE custom_domain = $1 AND is_active")
            .bind(domain)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_slug(&self, visibility: Visibility, slug: &str) -> StoreResult<Option<Property>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.* FROM properties p WHERE p.slug = ");
        qb.push_bind(slug.to_string());
        qb.push(" AND ");
        push_property_scope(&mut qb, visibility, "p");
        Ok(qb.build_query_as::<Property>().fetch_optional(&self.pool).await?)
    }

    async fn get_property(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Property>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.* FROM properties p WHERE p.id = ");
        qb.push_bind(id);
        qb.push(" AND ");
        push_property_scope(&mut qb, visibility, "p");
        Ok(qb.build_query_as::<Property>().fetch_optional(&self.pool).await?)
    }

    async fn list_properties(&self, visibility: Visibility, query: &PropertyQuery) -> StoreResult<Page<Property>> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties p");
        push_property_filters(&mut count_qb, visibility, query);
        let count: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT p.* FROM properties p");
        push_property_filters(&mut qb, visibility, query);
        qb.push(" ORDER BY p.created_at DESC, p.id LIMIT ");
        qb.push_bind(query.limit());
        qb.push(" OFFSET ");
        qb.push_bind(query.offset());
        let results = qb.build_query_as::<Property>().fetch_all(&self.pool).await?;

        Ok(Page {
            count,
            page: query.page,
            page_size: query.page_size,
            results,
        })
    }

    async fn update_property(&self, property: &Property, actor: Option<Uuid>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let before = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1 FOR UPDATE")
            .bind(property.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Property {}", property.id)))?;

        let after = sqlx::query_as::<_, Property>(
            "UPDATE properties SET name = $2, slug = $3, description = $4, address = $5, city = $6, state = $7, \
             zip_code = $8, country = $9, phone = $10, email = $11, website = $12, whatsapp = $13, instagram = $14, \
             logo_url = $15, primary_color = $16, custom_domain = $17, updated_at = $18 WHERE id = $1 RETURNING *",
        )
        .bind(property.id)
        .bind(&property.name)
        .bind(&property.slug)
        .bind(&property.description)
        .bind(&property.address)
        .bind(&property.city)
        .bind(&property.state)
        .bind(&property.zip_code)
        .bind(&property.country)
        .bind(&property.phone)
        .bind(&property.email)
        .bind(&property.website)
        .bind(&property.whatsapp)
        .bind(&property.instagram)
        .bind(&property.logo_url)
        .bind(&property.primary_color)
        .bind(&property.custom_domain)
        .bind(property.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        let entry = AuditEntry::updated(AuditEntity::Property, property.id, actor, &before, &after);
        if let Some(entry) = &entry {
            insert_audit(&mut tx, entry).await?;
        }
        tx.commit().await?;
        entry.iter().for_each(AuditEntry::trace);
        Ok(())
    }

    async fn soft_delete_property(&self, id: Uuid, at: DateTime<Utc>, actor: Option<Uuid>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let before = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Property {}", id)))?;
        let after = sqlx::query_as::<_, Property>(
            "UPDATE properties SET is_active = FALSE, deleted_at = $2, updated_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;
        let mut entries = vec![AuditEntry::deleted(AuditEntity::Property, id, actor, &before, Some(&after))];

        let active = sqlx::query_as::<_, Accommodation>(
            "SELECT * FROM accommodations WHERE property_id = $1 AND is_active FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        for before in &active {
            let after = sqlx::query_as::<_, Accommodation>(
                "UPDATE accommodations SET is_active = FALSE, deleted_at = COALESCE(deleted_at, $2), updated_at = $2 \
                 WHERE id = $1 RETURNING *",
            )
            .bind(before.id)
            .bind(at)
            .fetch_one(&mut *tx)
            .await?;
            entries.push(AuditEntry::deleted(AuditEntity::Accommodation, before.id, actor, before, Some(&after)));
        }

        for entry in &entries {
            insert_audit(&mut tx, entry).await?;
        }
        tx.commit().await?;
        entries.iter().for_each(AuditEntry::trace);
        tracing::debug!("Soft-deleted property {} and {} accommodations", id, active.len());
        Ok(())
    }
}

#[async_trait]
impl AccommodationStore for PgStore {
    async fn insert_accommodation(&self, a: &Accommodation, actor: Option<Uuid>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO accommodations (id, property_id, name, description, kind, max_guests, beds, bathrooms, \
             base_price, cleaning_fee, is_active, deleted_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(a.id)
        .bind(a.property_id)
        .bind(&a.name)
        .bind(&a.description)
        .bind(a.kind)
        .bind(a.max_guests)
        .bind(a.beds)
        .bind(a.bathrooms)
        .bind(a.base_price)
        .bind(a.cleaning_fee)
        .bind(a.is_active)
        .bind(a.deleted_at)
        .bind(a.created_at)
        .bind(a.updated_at)
        .execute(&mut *tx)
        .await?;

        let entry = AuditEntry::created(AuditEntity::Accommodation, a.id, actor, a);
        insert_audit(&mut tx, &entry).await?;
        tx.commit().await?;
        entry.trace();
        Ok(())
    }

    async fn get_accommodation(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Accommodation>> {
        let mut qb = QueryBuilder::<Postgres>::new(ACCOMMODATION_FROM);
        qb.push("a.id = ");
        qb.push_bind(id);
        qb.push(" AND ");
        push_accommodation_scope(&mut qb, visibility);
        Ok(qb.build_query_as::<Accommodation>().fetch_optional(&self.pool).await?)
    }

    async fn list_accommodations(
        &self,
        visibility: Visibility,
        property_id: Option<Uuid>,
    ) -> StoreResult<Vec<Accommodation>> {
        let mut qb = QueryBuilder::<Postgres>::new(ACCOMMODATION_FROM);
        if let Some(property_id) = property_id {
            qb.push("a.property_id = ");
            qb.push_bind(property_id);
            qb.push(" AND ");
        }
        push_accommodation_scope(&mut qb, visibility);
        qb.push(" ORDER BY a.created_at DESC, a.id");
        Ok(qb.build_query_as::<Accommodation>().fetch_all(&self.pool).await?)
    }

    async fn update_accommodation(&self, a: &Accommodation, actor: Option<Uuid>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let before = sqlx::query_as::<_, Accommodation>("SELECT * FROM accommodations WHERE id = $1 FOR UPDATE")
            .bind(a.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Accommodation {}", a.id)))?;

        let after = sqlx::query_as::<_, Accommodation>(
            "UPDATE accommodations SET name = $2, description = $3, kind = $4, max_guests = $5, beds = $6, \
             bathrooms = $7, base_price = $8, cleaning_fee = $9, updated_at = $10 WHERE id = $1 RETURNING *",
        )
        .bind(a.id)
        .bind(&a.name)
        .bind(&a.description)
        .bind(a.kind)
        .bind(a.max_guests)
        .bind(a.beds)
        .bind(a.bathrooms)
        .bind(a.base_price)
        .bind(a.cleaning_fee)
        .bind(a.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        let entry = AuditEntry::updated(AuditEntity::Accommodation, a.id, actor, &before, &after);
        if let Some(entry) = &entry {
            insert_audit(&mut tx, entry).await?;
        }
        tx.commit().await?;
        entry.iter().for_each(AuditEntry::trace);
        Ok(())
    }

    async fn soft_delete_accommodation(&self, id: Uuid, at: DateTime<Utc>, actor: Option<Uuid>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let before = sqlx::query_as::<_, Accommodation>("SELECT * FROM accommodations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Accommodation {}", id)))?;
        let after = sqlx::query_as::<_, Accommodation>(
            "UPDATE accommodations SET is_active = FALSE, deleted_at = $2, updated_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        let entry = AuditEntry::deleted(AuditEntity::Accommodation, id, actor, &before, Some(&after));
        insert_audit(&mut tx, &entry).await?;
        tx.commit().await?;
        entry.trace();
        Ok(())
    }

    async fn count_active_accommodations(&self, property_id: Uuid) -> StoreResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accommodations WHERE property_id = $1 AND is_active",
        )
        .bind(property_id)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[async_trait]
impl ImageStore for PgStore {
    async fn insert_image(&self, image: &Image, actor: Option<Uuid>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO images (id, property_id, accommodation_id, url, caption, position, is_cover, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(image.id)
        .bind(image.property_id)
        .bind(image.accommodation_id)
        .bind(&image.url)
        .bind(&image.caption)
        .bind(image.position)
        .bind(image.is_cover)
        .bind(image.created_at)
        .execute(&mut *tx)
        .await?;

        let entry = AuditEntry::created(AuditEntity::Image, image.id, actor, image);
        insert_audit(&mut tx, &entry).await?;
        tx.commit().await?;
        entry.trace();
        Ok(())
    }

    async fn get_image(&self, visibility: Visibility, id: Uuid) -> StoreResult<Option<Image>> {
        let mut qb = QueryBuilder::<Postgres>::new(IMAGE_FROM);
        qb.push("i.id = ");
        qb.push_bind(id);
        qb.push(" AND ");
        push_image_scope(&mut qb, visibility);
        Ok(qb.build_query_as::<Image>().fetch_optional(&self.pool).await?)
    }

    async fn list_images(&self, visibility: Visibility, filter: ImageFilter) -> StoreResult<Vec<Image>> {
        let mut qb = QueryBuilder::<Postgres>::new(IMAGE_FROM);
        if let Some(property_id) = filter.property_id {
            qb.push("i.property_id = ");
            qb.push_bind(property_id);
            qb.push(" AND ");
        }
        if let Some(accommodation_id) = filter.accommodation_id {
            qb.push("i.accommodation_id = ");
            qb.push_bind(accommodation_id);
            qb.push(" AND ");
        }
        push_image_scope(&mut qb, visibility);
        qb.push(" ORDER BY i.position, i.created_at");
        Ok(qb.build_query_as::<Image>().fetch_all(&self.pool).await?)
    }

    async fn delete_image(&self, id: Uuid, actor: Option<Uuid>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let image = sqlx::query_as::<_, Image>("DELETE FROM images WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Image {}", id)))?;

        let entry = AuditEntry::deleted(AuditEntity::Image, id, actor, &image, None);
        insert_audit(&mut tx, &entry).await?;
        tx.commit().await?;
        entry.trace();
        Ok(())
    }
}

#[async_trait]
impl AccessGrantStore for PgStore {
    async fn insert_grant(&self, grant: &AccessGrant, actor: Option<Uuid>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO property_access (id, user_id, property_id, role, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(grant.id)
            .bind(grant.user_id)
            .bind(grant.property_id)
            .bind(grant.role)
            .bind(grant.created_at)
            .execute(&mut *tx)
            .await?;

        let entry = AuditEntry::created(AuditEntity::AccessGrant, grant.id, actor, grant);
        insert_audit(&mut tx, &entry).await?;
        tx.commit().await?;
        entry.trace();
        Ok(())
    }

    async fn find_grant(&self, user_id: Uuid, property_id: Uuid) -> StoreResult<Option<AccessGrant>> {
        Ok(sqlx::query_as::<_, AccessGrant>(
            "SELECT * FROM property_access WHERE user_id = $1 AND property_id = $2",
        )
        .bind(user_id)
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_grants(&self, property_id: Uuid) -> StoreResult<Vec<AccessGrant>> {
        Ok(sqlx::query_as::<_, AccessGrant>(
            "SELECT * FROM property_access WHERE property_id = $1 ORDER BY created_at",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_grant(&self, user_id: Uuid, property_id: Uuid, actor: Option<Uuid>) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query_as::<_, AccessGrant>(
            "DELETE FROM property_access WHERE user_id = $1 AND property_id = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(property_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(grant) = removed else {
            return Ok(false);
        };

        let entry = AuditEntry::deleted(AuditEntity::AccessGrant, grant.id, actor, &grant, None);
        insert_audit(&mut tx, &entry).await?;
        tx.commit().await?;
        entry.trace();
        Ok(true)
    }
}

#[async_trait]
impl AuditStore for PgStore {
    async fn list_audit(&self, entity: AuditEntity, entity_id: Uuid) -> StoreResult<Vec<AuditEntry>> {
        Ok(sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log WHERE entity = $1 AND entity_id = $2 ORDER BY created_at, id",
        )
        .bind(entity)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_guest(&self, guest: &Guest) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO guests (id, property_id, name, email, phone, document_type, document_number, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(guest.id)
        .bind(guest.property_id)
        .bind(&guest.name)
        .bind(&guest.email)
        .bind(&guest.phone)
        .bind(&guest.document_type)
        .bind(&guest.document_number)
        .bind(&guest.notes)
        .bind(guest.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_guest(&self, id: Uuid) -> StoreResult<Option<Guest>> {
        Ok(sqlx::query_as::<_, Guest>("SELECT * FROM guests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_guests(&self, property_id: Uuid) -> StoreResult<Vec<Guest>> {
        Ok(sqlx::query_as::<_, Guest>("SELECT * FROM guests WHERE property_id = $1 ORDER BY name")
            .bind(property_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_reservation(&self, r: &Reservation) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO reservations (id, property_id, accommodation_id, guest_id, check_in, check_out, adults, \
             children, status, source, external_id, total_price, notes, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(r.id)
        .bind(r.property_id)
        .bind(r.accommodation_id)
        .bind(r.guest_id)
        .bind(r.check_in)
        .bind(r.check_out)
        .bind(r.adults)
        .bind(r.children)
        .bind(r.status)
        .bind(r.source)
        .bind(&r.external_id)
        .bind(r.total_price)
        .bind(&r.notes)
        .bind(r.created_by)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        Ok(sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_reservations(&self, property_id: Uuid) -> StoreResult<Vec<Reservation>> {
        Ok(sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE property_id = $1 ORDER BY created_at DESC",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_reservation_payments(&self, reservation_id: Uuid) -> StoreResult<Vec<ReservationPayment>> {
        Ok(sqlx::query_as::<_, ReservationPayment>(
            "SELECT * FROM reservation_payments WHERE reservation_id = $1 ORDER BY created_at",
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_invoices(&self, property_id: Uuid) -> StoreResult<Vec<Invoice>> {
        Ok(sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE property_id = $1 ORDER BY issue_date DESC",
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

impl PgStore {
    async fn with_plans(&self, subscriptions: Vec<Subscription>) -> StoreResult<Vec<SubscriptionWithPlan>> {
        let plans = self.list_plans(false).await?;
        subscriptions
            .into_iter()
            .map(|subscription| {
                let plan = plans
                    .iter()
                    .find(|p| p.id == subscription.plan_id)
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound(format!("Plan {}", subscription.plan_id)))?;
                Ok(SubscriptionWithPlan { subscription, plan })
            })
            .collect()
    }
}

#[async_trait]
impl BillingStore for PgStore {
    async fn list_plans(&self, active_only: bool) -> StoreResult<Vec<Plan>> {
        Ok(sqlx::query_as::<_, Plan>(
            "SELECT * FROM plans WHERE ($1 = FALSE OR is_active) ORDER BY monthly_price",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_or_create_plan(&self, plan: &Plan) -> StoreResult<(Plan, bool)> {
        let inserted = sqlx::query_as::<_, Plan>(
            "INSERT INTO plans (id, name, gateway_code, monthly_price, description, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT ON CONSTRAINT plans_name_key DO NOTHING RETURNING *",
        )
        .bind(plan.id)
        .bind(&plan.name)
        .bind(&plan.gateway_code)
        .bind(plan.monthly_price)
        .bind(&plan.description)
        .bind(plan.is_active)
        .bind(plan.created_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(created) = inserted {
            return Ok((created, true));
        }
        let existing = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE name = $1")
            .bind(&plan.name)
            .fetch_one(&self.pool)
            .await?;
        Ok((existing, false))
    }

    async fn insert_subscription(&self, s: &Subscription) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO subscriptions (id, property_id, plan_id, status, start_date, end_date, \
             gateway_subscription_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(s.id)
        .bind(s.property_id)
        .bind(s.plan_id)
        .bind(s.status)
        .bind(s.start_date)
        .bind(s.end_date)
        .bind(&s.gateway_subscription_id)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_subscription(&self, property_id: Uuid) -> StoreResult<Option<SubscriptionWithPlan>> {
        let subscription = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE property_id = $1")
            .bind(property_id)
            .fetch_optional(&self.pool)
            .await?;
        match subscription {
            Some(s) => Ok(self.with_plans(vec![s]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_subscriptions(&self) -> StoreResult<Vec<SubscriptionWithPlan>> {
        let subscriptions = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        self.with_plans(subscriptions).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
