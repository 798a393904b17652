//! Who may see and change which rows.
//!
//! A principal reaches a property when it is the direct owner or holds an
//! access grant on it. Accommodations and images are reached through their
//! property. Soft-deleted rows are outside every scope except `Admin`.

use uuid::Uuid;

use crate::auth::Principal;
use crate::database::models::{AccessRole, Property};
use crate::database::{AccessGrantStore, PropertyStore, Store, StoreResult};
use crate::error::ApiError;

/// Row filter handed to every store lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Anonymous visitors: active rows only.
    Public,
    /// Active rows owned by, or granted to, this user.
    Principal(Uuid),
    /// Platform staff views: everything, soft-deleted rows included.
    Admin,
}

impl Visibility {
    pub fn of(principal: &Principal) -> Self {
        Visibility::Principal(principal.user_id)
    }

    /// Applies the rule to a loaded property. `has_grant` tells whether the
    /// principal holds an access grant on it; ignored for other variants.
    pub fn admits(self, property: &Property, has_grant: bool) -> bool {
        match self {
            Visibility::Public => property.is_active,
            Visibility::Principal(user_id) => {
                property.is_active && (property.owner_id == user_id || has_grant)
            }
            Visibility::Admin => true,
        }
    }

    pub fn includes_inactive(self) -> bool {
        matches!(self, Visibility::Admin)
    }
}

/// Missing and out-of-scope rows produce the same response.
pub fn found<T>(row: Option<T>, what: &str) -> Result<T, ApiError> {
    row.ok_or_else(|| ApiError::not_found(format!("{} not found", what)))
}

/// Loads a property the principal can reach, or NotFound.
pub async fn visible_property(
    store: &dyn Store,
    principal: &Principal,
    id: Uuid,
) -> Result<Property, ApiError> {
    found(store.get_property(Visibility::of(principal), id).await?, "Property")
}

/// The principal's role on a property, if any. The direct owner is always
/// OWNER, even without a grant row.
pub async fn role_on(
    store: &dyn Store,
    principal: &Principal,
    property: &Property,
) -> StoreResult<Option<AccessRole>> {
    if property.owner_id == principal.user_id {
        return Ok(Some(AccessRole::Owner));
    }
    Ok(store
        .find_grant(principal.user_id, property.id)
        .await?
        .map(|grant| grant.role))
}

/// Requires the OWNER role on a property the principal can already see.
pub async fn require_owner(
    store: &dyn Store,
    principal: &Principal,
    property: &Property,
) -> Result<(), ApiError> {
    match role_on(store, principal, property).await? {
        Some(AccessRole::Owner) => Ok(()),
        _ => Err(ApiError::forbidden("Only property owners can do this")),
    }
}
