use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Plan;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::BillingService;

/// GET /api/v1/plans - active plans, cheapest first
pub async fn plan_list(State(state): State<AppState>) -> ApiResult<Vec<Plan>> {
    let plans = BillingService::new(state.store.as_ref()).plans().await?;
    Ok(ApiResponse::success(plans))
}
