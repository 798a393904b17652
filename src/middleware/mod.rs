pub mod auth;
pub mod response;
pub mod tenant;

pub use auth::{jwt_auth_middleware, require_staff_middleware};
pub use response::{ApiResponse, ApiResult};
pub use tenant::tenant_resolution_middleware;
