// Public handlers: no authentication. Landing-page data for guests.

pub mod home;
pub mod plans;
pub mod pousada;
pub mod properties;
