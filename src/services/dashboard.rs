use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::ServiceResult;
use crate::auth::Principal;
use crate::database::models::{Property, Reservation, ReservationStatus};
use crate::database::{AccommodationStore, BookingStore, PropertyQuery, PropertyStore, Store};
use crate::error::ApiError;
use crate::tenancy::scope::found;
use crate::tenancy::Visibility;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub property_id: Uuid,
    pub property_name: String,
    pub accommodations_count: i64,
    pub active_reservations: i64,
    pub checkins_today: i64,
    pub checkouts_today: i64,
    /// Sum of non-cancelled reservations checking in this month.
    pub revenue_month: Decimal,
    pub reservations_by_status: HashMap<ReservationStatus, i64>,
}

fn counts(status: ReservationStatus) -> bool {
    !matches!(status, ReservationStatus::Cancelled | ReservationStatus::NoShow)
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

impl DashboardStats {
    fn build(property: &Property, accommodations_count: i64, reservations: &[Reservation], today: NaiveDate) -> Self {
        let mut stats = DashboardStats {
            property_id: property.id,
            property_name: property.name.clone(),
            accommodations_count,
            active_reservations: 0,
            checkins_today: 0,
            checkouts_today: 0,
            revenue_month: Decimal::ZERO,
            reservations_by_status: HashMap::new(),
        };

        for r in reservations {
            *stats.reservations_by_status.entry(r.status).or_insert(0) += 1;
            if matches!(
                r.status,
                ReservationStatus::Pending | ReservationStatus::Confirmed | ReservationStatus::CheckedIn
            ) {
                stats.active_reservations += 1;
            }
            if !counts(r.status) {
                continue;
            }
            if r.check_in == today {
                stats.checkins_today += 1;
            }
            if r.check_out == today {
                stats.checkouts_today += 1;
            }
            if same_month(r.check_in, today) {
                stats.revenue_month += r.total_price;
            }
        }
        stats
    }
}

/// Owner dashboard for the property in context.
pub struct DashboardService<'a> {
    store: &'a dyn Store,
}

impl<'a> DashboardService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Uses the host-resolved property when there is one (it must be in the
    /// principal's scope), else the principal's most recent property.
    pub async fn stats(&self, principal: &Principal, resolved: Option<&Property>) -> ServiceResult<DashboardStats> {
        let visibility = Visibility::of(principal);
        let property = match resolved {
            Some(p) => found(self.store.get_property(visibility, p.id).await?, "Property")?,
            None => self
                .store
                .list_properties(visibility, &PropertyQuery::paged(Some(1), Some(1), 1, 1))
                .await?
                .results
                .into_iter()
                .next()
                .ok_or_else(|| ApiError::not_found("User has no properties"))?,
        };

        let accommodations_count = self.store.count_active_accommodations(property.id).await?;
        let reservations = self.store.list_reservations(property.id).await?;
        Ok(DashboardStats::build(&property, accommodations_count, &reservations, Utc::now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::Fixtures;

    fn reservation(property_id: Uuid, check_in: NaiveDate, nights: u64, status: ReservationStatus, price: &str) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: Uuid::new_v4(),
            property_id,
            accommodation_id: Uuid::new_v4(),
            guest_id: Uuid::new_v4(),
            check_in,
            check_out: check_in + chrono::Days::new(nights),
            adults: 2,
            children: 0,
            status,
            source: Default::default(),
            external_id: String::new(),
            total_price: price.parse().unwrap(),
            notes: String::new(),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn aggregates_reservations() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let property = fx.property(&owner, "Pousada").await;
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        let rows = vec![
            reservation(property.id, today, 2, ReservationStatus::Confirmed, "500"),
            reservation(property.id, yesterday, 1, ReservationStatus::CheckedIn, "250"),
            reservation(property.id, today, 1, ReservationStatus::Cancelled, "999"),
        ];
        let stats = DashboardStats::build(&property, 3, &rows, today);

        assert_eq!(stats.active_reservations, 2);
        assert_eq!(stats.checkins_today, 1);
        assert_eq!(stats.checkouts_today, 1);
        assert_eq!(stats.revenue_month, "750".parse::<Decimal>().unwrap());
        assert_eq!(stats.reservations_by_status.get(&ReservationStatus::Cancelled), Some(&1));
    }

    #[tokio::test]
    async fn resolved_property_must_be_in_scope() {
        let store = MemoryStore::new();
        let fx = Fixtures::new(&store);
        let owner = fx.user("owner").await;
        let stranger = fx.user("stranger").await;
        let property = fx.property(&owner, "Pousada").await;
        let service = DashboardService::new(&store);

        assert_eq!(service.stats(&owner, Some(&property)).await.unwrap().property_id, property.id);
        assert_eq!(service.stats(&owner, None).await.unwrap().property_id, property.id);
        assert!(matches!(service.stats(&stranger, Some(&property)).await, Err(ApiError::NotFound(_))));
        assert!(matches!(service.stats(&stranger, None).await, Err(ApiError::NotFound(_))));
    }
}
