pub mod migrate;
pub mod plans;
pub mod resolve;
pub mod slugify;
