// Request-independent business operations. Handlers parse and authenticate;
// services validate, apply scoping and talk to the store.

pub mod access;
pub mod accommodation;
pub mod billing;
pub mod booking;
pub mod dashboard;
pub mod image;
pub mod property;
pub mod tenant;
pub mod validate;

pub use access::AccessService;
pub use accommodation::AccommodationService;
pub use billing::BillingService;
pub use booking::BookingService;
pub use dashboard::DashboardService;
pub use image::ImageService;
pub use property::PropertyService;
pub use tenant::TenantService;

pub type ServiceResult<T> = Result<T, crate::error::ApiError>;
