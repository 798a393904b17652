pub mod error;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use error::{Constraint, StoreError, StoreResult};
pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{
    AccessGrantStore, AccommodationStore, AuditStore, BillingStore, BookingStore, ImageStore, Page, PropertyQuery,
    PropertyStore, Store, TenantStore, UserStore,
};
