use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::billing::{SaasClient, SaasStats};
use crate::services::BillingService;

/// GET /api/v1/saas/stats - client count, MRR and plan distribution
pub async fn saas_stats(State(state): State<AppState>) -> ApiResult<SaasStats> {
    let stats = BillingService::new(state.store.as_ref()).saas_stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/v1/saas/clients - every property with its plan and status
pub async fn saas_clients(State(state): State<AppState>) -> ApiResult<Vec<SaasClient>> {
    let clients = BillingService::new(state.store.as_ref()).saas_clients().await?;
    Ok(ApiResponse::success(clients))
}
