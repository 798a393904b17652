use axum::extract::State;
use axum::Extension;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::{CreateImage, Image, ImageFilter};
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ImageService;

/// GET /api/v1/images[?property_id=&accommodation_id=]
pub async fn image_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiQuery(filter): ApiQuery<ImageFilter>,
) -> ApiResult<Vec<Image>> {
    let images = ImageService::new(state.store.as_ref()).list(&principal, filter).await?;
    Ok(ApiResponse::success(images))
}

/// POST /api/v1/images
pub async fn image_create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<CreateImage>,
) -> ApiResult<Image> {
    let image = ImageService::new(state.store.as_ref()).create(&principal, input).await?;
    Ok(ApiResponse::created(image))
}

/// GET /api/v1/images/:id
pub async fn image_show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Image> {
    let image = ImageService::new(state.store.as_ref()).get(&principal, id).await?;
    Ok(ApiResponse::success(image))
}

/// DELETE /api/v1/images/:id - hard delete
pub async fn image_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    ImageService::new(state.store.as_ref()).delete(&principal, id).await?;
    Ok(ApiResponse::no_content())
}
