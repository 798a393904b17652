// Protected handlers: a valid JWT is required and the caller arrives as a
// `Principal` extension. Out-of-scope rows surface as 404s from the services.

pub mod access;
pub mod accommodations;
pub mod booking;
pub mod dashboard;
pub mod images;
pub mod properties;
pub mod tenants;
