// Tenant resolution, access scoping and slug assignment.

pub mod resolver;
pub mod scope;
pub mod slug;

pub use resolver::CurrentProperty;
pub use scope::Visibility;
