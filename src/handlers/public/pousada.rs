use axum::extract::State;
use axum::Extension;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::PublicPropertyDetail;
use crate::handlers::extract::ApiQuery;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::PropertyService;
use crate::tenancy::CurrentProperty;

#[derive(Debug, Deserialize)]
pub struct PousadaQuery {
    pub slug: Option<String>,
}

/// GET /api/v1/pousada - the property serving this host, or `?slug=` when
/// the host resolved to nothing
pub async fn current_property(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentProperty>,
    ApiQuery(query): ApiQuery<PousadaQuery>,
) -> ApiResult<PublicPropertyDetail> {
    let detail = PropertyService::new(state.store.as_ref())
        .current(current.0, query.slug.as_deref())
        .await?;
    Ok(ApiResponse::success(detail))
}
