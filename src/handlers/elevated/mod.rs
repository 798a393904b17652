// Elevated handlers: staff JWT required. Platform-wide views across every
// property, including soft-deleted ones.

pub mod saas;
