use std::fmt;

use thiserror::Error;

/// Unique constraints the API reacts to. Names match the ones declared in
/// `migrations/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    UserUsername,
    TenantSlug,
    TenantOwner,
    PropertySlug,
    PropertyDomain,
    AccessGrantPair,
    PlanName,
    SubscriptionProperty,
}

impl Constraint {
    pub fn name(self) -> &'static str {
        match self {
            Constraint::UserUsername => "users_username_key",
            Constraint::TenantSlug => "tenants_slug_key",
            Constraint::TenantOwner => "tenants_owner_id_key",
            Constraint::PropertySlug => "properties_slug_key",
            Constraint::PropertyDomain => "properties_custom_domain_key",
            Constraint::AccessGrantPair => "property_access_user_property_key",
            Constraint::PlanName => "plans_name_key",
            Constraint::SubscriptionProperty => "subscriptions_property_id_key",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            Constraint::UserUsername,
            Constraint::TenantSlug,
            Constraint::TenantOwner,
            Constraint::PropertySlug,
            Constraint::PropertyDomain,
            Constraint::AccessGrantPair,
            Constraint::PlanName,
            Constraint::SubscriptionProperty,
        ]
        .into_iter()
        .find(|c| c.name() == name)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from the persistence layer, shared by every store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Unique constraint violated: {0}")]
    Conflict(Constraint),

    #[error("Referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Gave up after {0} attempts to find a free slug")]
    SlugExhausted(u32),

    #[error(transparent)]
    Sqlx(sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                if let Some(constraint) = db_err.constraint().and_then(Constraint::from_name) {
                    return StoreError::Conflict(constraint);
                }
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference(
                    db_err.constraint().unwrap_or("foreign key").to_string(),
                );
            }
        }
        StoreError::Sqlx(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_round_trip() {
        for c in [
            Constraint::TenantSlug,
            Constraint::TenantOwner,
            Constraint::PropertySlug,
            Constraint::PropertyDomain,
            Constraint::AccessGrantPair,
        ] {
            assert_eq!(Constraint::from_name(c.name()), Some(c));
        }
        assert_eq!(Constraint::from_name("unknown_key"), None);
    }
}
