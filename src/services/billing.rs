//! Plans, property subscriptions and platform-wide SaaS metrics.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::ServiceResult;
use crate::auth::Principal;
use crate::database::models::{Plan, Property, SubscriptionStatus, SubscriptionWithPlan};
use crate::database::{BillingStore, PropertyQuery, PropertyStore, Store, StoreResult};
use crate::tenancy::scope::{found, visible_property};
use crate::tenancy::Visibility;

/// Default catalogue installed by `hyfen init-plans`.
pub const DEFAULT_PLANS: &[(&str, &str, &str, &str)] = &[
    ("Essencial", "essencial", "199.00", "Site próprio, reservas diretas e painel do proprietário."),
    ("Profissional", "profissional", "399.00", "Tudo do Essencial, com várias acomodações e equipe."),
];

#[derive(Debug, Clone, Serialize)]
pub struct SaasStats {
    pub total_clients: i64,
    pub active_subscriptions: i64,
    pub mrr: Decimal,
    /// Active subscriptions per plan name.
    pub plans_distribution: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaasClient {
    pub id: Uuid,
    pub name: String,
    /// Custom domain when configured, otherwise the slug.
    pub domain: String,
    pub is_active: bool,
    pub plan: Option<String>,
    pub status: Option<SubscriptionStatus>,
    pub renewal_date: Option<NaiveDate>,
}

pub struct BillingService<'a> {
    store: &'a dyn Store,
}

impl<'a> BillingService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn plans(&self) -> ServiceResult<Vec<Plan>> {
        Ok(self.store.list_plans(true).await?)
    }

    pub async fn subscription(&self, principal: &Principal, property_id: Uuid) -> ServiceResult<SubscriptionWithPlan> {
        let property = visible_property(self.store, principal, property_id).await?;
        found(self.store.get_subscription(property.id).await?, "Subscription")
    }

    pub async fn saas_stats(&self) -> ServiceResult<SaasStats> {
        let total_clients = self
            .store
            .list_properties(Visibility::Admin, &PropertyQuery::paged(Some(1), Some(1), 1, 1))
            .await?
            .count;

        let billable: Vec<SubscriptionWithPlan> = self
            .store
            .list_subscriptions()
            .await?
            .into_iter()
            .filter(|s| s.subscription.status.is_billable())
            .collect();

        let mut plans_distribution = BTreeMap::new();
        for s in &billable {
            *plans_distribution.entry(s.plan.name.clone()).or_insert(0) += 1;
        }

        Ok(SaasStats {
            total_clients,
            active_subscriptions: billable.len() as i64,
            mrr: billable.iter().map(|s| s.plan.monthly_price).sum(),
            plans_distribution,
        })
    }

    pub async fn saas_clients(&self) -> ServiceResult<Vec<SaasClient>> {
        let properties = self.all_properties().await?;
        let subscriptions: HashMap<Uuid, SubscriptionWithPlan> = self
            .store
            .list_subscriptions()
            .await?
            .into_iter()
            .map(|s| (s.subscription.property_id, s))
            .collect();

        Ok(properties
            .into_iter()
            .map(|p| {
                let sub = subscriptions.get(&p.id);
                SaasClient {
                    id: p.id,
                    domain: p.custom_domain.clone().unwrap_or_else(|| p.slug.clone()),
                    name: p.name,
                    is_active: p.is_active,
                    plan: sub.map(|s| s.plan.name.clone()),
                    status: sub.map(|s| s.subscription.status),
                    renewal_date: sub.and_then(|s| s.subscription.end_date),
                }
            })
            .collect())
    }

    async fn all_properties(&self) -> StoreResult<Vec<Property>> {
        const BATCH: u32 = 100;
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let query = PropertyQuery::paged(Some(page), Some(BATCH), BATCH, BATCH);
            let batch = self.store.list_properties(Visibility::Admin, &query).await?;
            let done = batch.results.len() < BATCH as usize;
            all.extend(batch.results);
            if done {
                return Ok(all);
            }
            page += 1;
        }
    }
}

/// Installs [`DEFAULT_PLANS`], leaving existing plans untouched. Returns
/// each plan with whether it was created.
pub async fn init_plans(store: &dyn Store) -> StoreResult<Vec<(Plan, bool)>> {
    let mut out = Vec::with_capacity(DEFAULT_PLANS.len());
    for (name, code, price, description) in DEFAULT_PLANS {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: name.to_string(),
            gateway_code: code.to_string(),
            monthly_price: price.parse().unwrap_or_default(),
            description: description.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        out.push(store.get_or_create_plan(&plan).await?);
    }
    Ok(out)
}
