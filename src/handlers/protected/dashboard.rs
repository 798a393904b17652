use axum::extract::State;
use axum::Extension;

use crate::app::AppState;
use crate::auth::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::dashboard::DashboardStats;
use crate::services::DashboardService;
use crate::tenancy::CurrentProperty;

/// GET /api/v1/dashboard/stats - the host's property, else the caller's latest
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Extension(current): Extension<CurrentProperty>,
) -> ApiResult<DashboardStats> {
    let stats = DashboardService::new(state.store.as_ref())
        .stats(&principal, current.0.as_ref())
        .await?;
    Ok(ApiResponse::success(stats))
}
