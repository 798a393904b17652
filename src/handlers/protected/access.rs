use axum::extract::State;
use axum::Extension;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::{AccessGrant, CreateAccessGrant};
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AccessService;

/// GET /api/v1/properties/:id/access
pub async fn access_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<AccessGrant>> {
    let grants = AccessService::new(state.store.as_ref()).list(&principal, id).await?;
    Ok(ApiResponse::success(grants))
}

/// POST /api/v1/properties/:id/access - owners only
pub async fn access_grant(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CreateAccessGrant>,
) -> ApiResult<AccessGrant> {
    let grant = AccessService::new(state.store.as_ref())
        .grant(&principal, id, input)
        .await?;
    Ok(ApiResponse::created(grant))
}

/// DELETE /api/v1/properties/:id/access/:user_id - owners only
pub async fn access_revoke(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath((id, user_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    AccessService::new(state.store.as_ref())
        .revoke(&principal, id, user_id)
        .await?;
    Ok(ApiResponse::no_content())
}
