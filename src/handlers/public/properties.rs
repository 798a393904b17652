use axum::extract::State;

use crate::app::AppState;
use crate::database::models::{PublicProperty, PublicPropertyDetail};
use crate::database::Page;
use crate::handlers::PropertyListParams;
use crate::handlers::extract::{ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::PropertyService;

/// GET /api/v1/public/properties - active properties, paginated
pub async fn property_list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PropertyListParams>,
) -> ApiResult<Page<PublicProperty>> {
    let page = PropertyService::new(state.store.as_ref())
        .public_list(&params.into_query())
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/v1/public/properties/:slug
pub async fn property_show(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<PublicPropertyDetail> {
    let detail = PropertyService::new(state.store.as_ref()).public_detail(&slug).await?;
    Ok(ApiResponse::success(detail))
}
