use axum::extract::State;
use axum::Extension;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::{
    CreateGuest, CreateReservation, Guest, Invoice, Reservation, ReservationPayment,
};
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::BookingService;

/// GET /api/v1/properties/:id/guests
pub async fn guest_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<Guest>> {
    let guests = BookingService::new(state.store.as_ref()).list_guests(&principal, id).await?;
    Ok(ApiResponse::success(guests))
}

/// POST /api/v1/properties/:id/guests
pub async fn guest_create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CreateGuest>,
) -> ApiResult<Guest> {
    let guest = BookingService::new(state.store.as_ref())
        .create_guest(&principal, id, input)
        .await?;
    Ok(ApiResponse::created(guest))
}

/// GET /api/v1/properties/:id/reservations
pub async fn reservation_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<Reservation>> {
    let reservations = BookingService::new(state.store.as_ref())
        .list_reservations(&principal, id)
        .await?;
    Ok(ApiResponse::success(reservations))
}

/// POST /api/v1/properties/:id/reservations
pub async fn reservation_create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CreateReservation>,
) -> ApiResult<Reservation> {
    let reservation = BookingService::new(state.store.as_ref())
        .create_reservation(&principal, id, input)
        .await?;
    Ok(ApiResponse::created(reservation))
}

/// GET /api/v1/properties/:id/invoices
pub async fn invoice_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<Invoice>> {
    let invoices = BookingService::new(state.store.as_ref())
        .list_invoices(&principal, id)
        .await?;
    Ok(ApiResponse::success(invoices))
}

/// GET /api/v1/reservations/:id/payments
pub async fn payment_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<ReservationPayment>> {
    let payments = BookingService::new(state.store.as_ref())
        .list_payments(&principal, id)
        .await?;
    Ok(ApiResponse::success(payments))
}
