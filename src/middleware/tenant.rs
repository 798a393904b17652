use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::config;
use crate::tenancy::resolver::{request_host, resolve};
use crate::tenancy::CurrentProperty;

/// Resolves the request's host to a property and stores the outcome as a
/// [`CurrentProperty`] extension. Never rejects a request.
pub async fn tenant_resolution_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let tenancy = &config::config().tenancy;
    let host = request_host(request.headers(), tenancy);
    let property = resolve(state.store.as_ref(), tenancy, host.as_deref()).await;

    request.extensions_mut().insert(CurrentProperty(property));
    next.run(request).await
}
