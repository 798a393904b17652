use axum::extract::State;
use axum::Extension;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::{
    AuditEntry, CreateProperty, Property, PropertyDetail, SubscriptionWithPlan, UpdateProperty,
};
use crate::database::Page;
use crate::handlers::PropertyListParams;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{BillingService, PropertyService};

/// GET /api/v1/properties - properties the caller owns or has been granted
pub async fn property_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiQuery(params): ApiQuery<PropertyListParams>,
) -> ApiResult<Page<Property>> {
    let page = PropertyService::new(state.store.as_ref())
        .list(&principal, &params.into_query())
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/v1/properties
pub async fn property_create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<CreateProperty>,
) -> ApiResult<Property> {
    let property = PropertyService::new(state.store.as_ref()).create(&principal, input).await?;
    Ok(ApiResponse::created(property))
}

/// GET /api/v1/properties/:id
pub async fn property_show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<PropertyDetail> {
    let detail = PropertyService::new(state.store.as_ref()).detail(&principal, id).await?;
    Ok(ApiResponse::success(detail))
}

/// PATCH /api/v1/properties/:id
pub async fn property_update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateProperty>,
) -> ApiResult<Property> {
    let property = PropertyService::new(state.store.as_ref())
        .update(&principal, id, input)
        .await?;
    Ok(ApiResponse::success(property))
}

/// DELETE /api/v1/properties/:id - soft delete, cascading to accommodations
pub async fn property_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    PropertyService::new(state.store.as_ref()).soft_delete(&principal, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/v1/properties/:id/history - audit trail of the property row (owner only)
pub async fn property_history(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<AuditEntry>> {
    let history = PropertyService::new(state.store.as_ref()).history(&principal, id).await?;
    Ok(ApiResponse::success(history))
}

/// GET /api/v1/properties/:id/subscription
pub async fn property_subscription(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<SubscriptionWithPlan> {
    let subscription = BillingService::new(state.store.as_ref())
        .subscription(&principal, id)
        .await?;
    Ok(ApiResponse::success(subscription))
}
