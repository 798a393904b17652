use axum::extract::State;
use axum::Extension;

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::{CreateTenant, Tenant};
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::TenantService;

/// GET /api/v1/tenants - tenants owned by the caller
pub async fn tenant_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<Tenant>> {
    let tenants = TenantService::new(state.store.as_ref()).list(&principal).await?;
    Ok(ApiResponse::success(tenants))
}

/// POST /api/v1/tenants
pub async fn tenant_create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<CreateTenant>,
) -> ApiResult<Tenant> {
    let tenant = TenantService::new(state.store.as_ref()).create(&principal, input).await?;
    Ok(ApiResponse::created(tenant))
}
