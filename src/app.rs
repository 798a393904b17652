use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{self, SecurityConfig};
use crate::database::Store;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_staff_middleware, tenant_resolution_middleware};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

/// Builds the full router: public, protected (JWT) and elevated (staff JWT)
/// tiers, with host-based property resolution on every request.
pub fn app(state: AppState) -> Router {
    let api = &config::config().api;

    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .merge(elevated_routes())
        .layer(middleware::from_fn_with_state(state.clone(), tenant_resolution_middleware))
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
        .layer(cors_layer(&config::config().security))
        .with_state(state);

    if api.enable_request_logging {
        router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    } else {
        router
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::home::root))
        .route("/health", get(public::home::health))
        .route("/api/v1/pousada", get(public::pousada::current_property))
        .route("/api/v1/public/properties", get(public::properties::property_list))
        .route("/api/v1/public/properties/:slug", get(public::properties::property_show))
        .route("/api/v1/plans", get(public::plans::plan_list))
}

fn protected_routes() -> Router<AppState> {
    use protected::{access, accommodations, booking, dashboard, images, properties, tenants};

    Router::new()
        // Properties
        .route(
            "/api/v1/properties",
            get(properties::property_list).post(properties::property_create),
        )
        .route(
            "/api/v1/properties/:id",
            get(properties::property_show)
                .patch(properties::property_update)
                .delete(properties::property_delete),
        )
        .route("/api/v1/properties/:id/subscription", get(properties::property_subscription))
        .route("/api/v1/properties/:id/history", get(properties::property_history))
        // Access grants
        .route(
            "/api/v1/properties/:id/access",
            get(access::access_list).post(access::access_grant),
        )
        .route("/api/v1/properties/:id/access/:user_id", delete(access::access_revoke))
        // Guests, reservations and financial records
        .route(
            "/api/v1/properties/:id/guests",
            get(booking::guest_list).post(booking::guest_create),
        )
        .route(
            "/api/v1/properties/:id/reservations",
            get(booking::reservation_list).post(booking::reservation_create),
        )
        .route("/api/v1/properties/:id/invoices", get(booking::invoice_list))
        .route("/api/v1/reservations/:id/payments", get(booking::payment_list))
        // Accommodations and images
        .route(
            "/api/v1/accommodations",
            get(accommodations::accommodation_list).post(accommodations::accommodation_create),
        )
        .route(
            "/api/v1/accommodations/:id",
            get(accommodations::accommodation_show)
                .patch(accommodations::accommodation_update)
                .delete(accommodations::accommodation_delete),
        )
        .route("/api/v1/images", get(images::image_list).post(images::image_create))
        .route("/api/v1/images/:id", get(images::image_show).delete(images::image_delete))
        // Organizations and dashboard
        .route("/api/v1/tenants", get(tenants::tenant_list).post(tenants::tenant_create))
        .route("/api/v1/dashboard/stats", get(dashboard::dashboard_stats))
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn elevated_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/saas/stats", get(elevated::saas::saas_stats))
        .route("/api/v1/saas/clients", get(elevated::saas::saas_clients))
        .route_layer(middleware::from_fn(require_staff_middleware))
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}
