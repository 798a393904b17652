//! Guests, reservations and their financial records. Data capture only:
//! no availability, overlap or pricing logic.

use chrono::Utc;
use uuid::Uuid;

use super::{validate, ServiceResult};
use crate::auth::Principal;
use crate::database::models::{
    CreateGuest, CreateReservation, Guest, Invoice, Reservation, ReservationPayment,
};
use crate::database::{AccommodationStore, BookingStore, PropertyStore, Store};
use crate::error::ApiError;
use crate::tenancy::scope::{found, visible_property};
use crate::tenancy::Visibility;

pub struct BookingService<'a> {
    store: &'a dyn Store,
}

impl<'a> BookingService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn create_guest(&self, principal: &Principal, property_id: Uuid, input: CreateGuest) -> ServiceResult<Guest> {
        let property = visible_property(self.store, principal, property_id).await?;
        validate::required("name", &input.name)?;

        let guest = Guest {
            id: Uuid::new_v4(),
            property_id: property.id,
            name: input.name.trim().to_string(),
            email: input.email,
            phone: input.phone,
            document_type: input.document_type,
            document_number: input.document_number,
            notes: input.notes,
            created_at: Utc::now(),
        };
        self.store.insert_guest(&guest).await?;
        Ok(guest)
    }

    pub async fn list_guests(&self, principal: &Principal, property_id: Uuid) -> ServiceResult<Vec<Guest>> {
        let property = visible_property(self.store, principal, property_id).await?;
        Ok(self.store.list_guests(property.id).await?)
    }

    pub async fn create_reservation(
        &self,
        principal: &Principal,
        property_id: Uuid,
        input: CreateReservation,
    ) -> ServiceResult<Reservation> {
        let property = visible_property(self.store, principal, property_id).await?;

        let accommodation = self
            .store
            .get_accommodation(Visibility::of(principal), input.accommodation_id)
            .await?
            .filter(|a| a.property_id == property.id);
        if accommodation.is_none() {
            return Err(ApiError::invalid_field(
                "accommodation_id",
                "Accommodation does not belong to this property",
            ));
        }
        let guest = self
            .store
            .get_guest(input.guest_id)
            .await?
            .filter(|g| g.property_id == property.id);
        if guest.is_none() {
            return Err(ApiError::invalid_field("guest_id", "Guest does not belong to this property"));
        }

        if input.check_out <= input.check_in {
            return Err(ApiError::invalid_field("check_out", "Check-out must be after check-in"));
        }
        validate::at_least("adults", input.adults, 1)?;
        validate::at_least("children", input.children, 0)?;
        validate::non_negative("total_price", input.total_price)?;

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            property_id: property.id,
            accommodation_id: input.accommodation_id,
            guest_id: input.guest_id,
            check_in: input.check_in,
            check_out: input.check_out,
            adults: input.adults,
            children: input.children,
            status: input.status,
            source: input.source,
            external_id: input.external_id,
            total_price: input.total_price,
            notes: input.notes,
            created_by: Some(principal.user_id),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_reservation(&reservation).await?;
        tracing::info!(
            "Reservation created: {} for property {} ({} -> {})",
            reservation.id,
            property.id,
            reservation.check_in,
            reservation.check_out
        );
        Ok(reservation)
    }

    pub async fn list_reservations(&self, principal: &Principal, property_id: Uuid) -> ServiceResult<Vec<Reservation>> {
        let property = visible_property(self.store, principal, property_id).await?;
        Ok(self.store.list_reservations(property.id).await?)
    }

    pub async fn list_invoices(&self, principal: &Principal, property_id: Uuid) -> ServiceResult<Vec<Invoice>> {
        let property = visible_property(self.store, principal, property_id).await?;
        Ok(self.store.list_invoices(property.id).await?)
    }

    /// Payments of a reservation whose property is in scope.
    pub async fn list_payments(&self, principal: &Principal, reservation_id: Uuid) -> ServiceResult<Vec<ReservationPayment>> {
        let reservation = found(self.store.get_reservation(reservation_id).await?, "Reservation")?;
        let property = self
            .store
            .get_property(Visibility::of(principal), reservation.property_id)
            .await?;
        found(property, "Reservation")?;
        Ok(self.store.list_reservation_payments(reservation.id).await?)
    }
}
