pub mod access;
pub mod accommodation;
pub mod audit;
pub mod billing;
pub mod booking;
pub mod image;
pub mod property;
pub mod tenant;
pub mod user;

pub use access::{AccessGrant, AccessRole, CreateAccessGrant};
pub use accommodation::{Accommodation, AccommodationKind, CreateAccommodation, UpdateAccommodation};
pub use audit::{AuditAction, AuditEntity, AuditEntry};
pub use billing::{Plan, Subscription, SubscriptionStatus, SubscriptionWithPlan};
pub use booking::{
    CreateGuest, CreateReservation, Guest, Invoice, InvoiceStatus, PaymentMethod, PaymentStatus,
    Reservation, ReservationPayment, ReservationSource, ReservationStatus,
};
pub use image::{CreateImage, Image, ImageFilter};
pub use property::{
    CreateProperty, Property, PropertyDetail, PublicProperty, PublicPropertyDetail, UpdateProperty,
};
pub use tenant::{CreateTenant, Tenant};
pub use user::User;
