use axum::extract::State;
use axum::Extension;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::{Accommodation, CreateAccommodation, UpdateAccommodation};
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AccommodationService;

#[derive(Debug, Deserialize)]
pub struct AccommodationListQuery {
    pub property_id: Option<Uuid>,
}

/// GET /api/v1/accommodations[?property_id=]
pub async fn accommodation_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiQuery(query): ApiQuery<AccommodationListQuery>,
) -> ApiResult<Vec<Accommodation>> {
    let accommodations = AccommodationService::new(state.store.as_ref())
        .list(&principal, query.property_id)
        .await?;
    Ok(ApiResponse::success(accommodations))
}

/// POST /api/v1/accommodations
pub async fn accommodation_create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<CreateAccommodation>,
) -> ApiResult<Accommodation> {
    let accommodation = AccommodationService::new(state.store.as_ref())
        .create(&principal, input)
        .await?;
    Ok(ApiResponse::created(accommodation))
}

/// GET /api/v1/accommodations/:id
pub async fn accommodation_show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Accommodation> {
    let accommodation = AccommodationService::new(state.store.as_ref()).get(&principal, id).await?;
    Ok(ApiResponse::success(accommodation))
}

/// PATCH /api/v1/accommodations/:id
pub async fn accommodation_update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateAccommodation>,
) -> ApiResult<Accommodation> {
    let accommodation = AccommodationService::new(state.store.as_ref())
        .update(&principal, id, input)
        .await?;
    Ok(ApiResponse::success(accommodation))
}

/// DELETE /api/v1/accommodations/:id - soft delete
pub async fn accommodation_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    AccommodationService::new(state.store.as_ref())
        .soft_delete(&principal, id)
        .await?;
    Ok(ApiResponse::no_content())
}
