use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "audit_entity", rename_all = "snake_case")]
pub enum AuditEntity {
    User,
    Property,
    Accommodation,
    Image,
    AccessGrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "audit_action", rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// One row of the audit trail. `changes` maps each touched field to
/// `[old, new]`, with `null` on the side that did not exist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub entity: AuditEntity,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub actor_id: Option<Uuid>,
    pub changes: Value,
    pub created_at: DateTime<Utc>,
}

// Bookkeeping column; every write bumps it.
const IGNORED_FIELDS: &[&str] = &["updated_at"];

impl AuditEntry {
    pub fn new(entity: AuditEntity, entity_id: Uuid, action: AuditAction, actor_id: Option<Uuid>, changes: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity,
            entity_id,
            action,
            actor_id,
            changes,
            created_at: Utc::now(),
        }
    }

    pub fn created<T: Serialize>(entity: AuditEntity, entity_id: Uuid, actor_id: Option<Uuid>, row: &T) -> Self {
        Self::new(entity, entity_id, AuditAction::Create, actor_id, diff(None, Some(row)))
    }

    /// `None` when nothing but bookkeeping columns changed.
    pub fn updated<T: Serialize>(
        entity: AuditEntity,
        entity_id: Uuid,
        actor_id: Option<Uuid>,
        before: &T,
        after: &T,
    ) -> Option<Self> {
        let changes = diff(Some(before), Some(after));
        if changes.as_object().is_some_and(Map::is_empty) {
            return None;
        }
        Some(Self::new(entity, entity_id, AuditAction::Update, actor_id, changes))
    }

    /// A hard delete records the last state of the row. A soft delete
    /// passes both states so the flag flip is captured.
    pub fn deleted<T: Serialize>(
        entity: AuditEntity,
        entity_id: Uuid,
        actor_id: Option<Uuid>,
        before: &T,
        after: Option<&T>,
    ) -> Self {
        Self::new(entity, entity_id, AuditAction::Delete, actor_id, diff(Some(before), after))
    }

    /// Emits the entry on the `audit` tracing target. Stores call this once
    /// the row is committed.
    pub fn trace(&self) {
        tracing::info!(
            target: "audit",
            entity = ?self.entity,
            entity_id = %self.entity_id,
            action = ?self.action,
            actor = ?self.actor_id,
            "{:?} {:?} {}",
            self.action,
            self.entity,
            self.entity_id
        );
    }
}

fn fields<T: Serialize>(row: Option<&T>) -> Map<String, Value> {
    match row.map(serde_json::to_value) {
        Some(Ok(Value::Object(map))) => map,
        _ => Map::new(),
    }
}

/// Field-level difference between two serialized rows.
pub fn diff<T: Serialize>(before: Option<&T>, after: Option<&T>) -> Value {
    let before = fields(before);
    let after = fields(after);

    let mut changes = Map::new();
    for key in before.keys().chain(after.keys().filter(|k| !before.contains_key(*k))) {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let old = before.get(key).cloned().unwrap_or(Value::Null);
        let new = after.get(key).cloned().unwrap_or(Value::Null);
        if old != new {
            changes.insert(key.clone(), Value::Array(vec![old, new]));
        }
    }
    Value::Object(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        is_active: bool,
        updated_at: u32,
    }

    #[test]
    fn diff_keeps_only_changed_fields() {
        let before = Row { name: "Vista", is_active: true, updated_at: 1 };
        let after = Row { name: "Vista", is_active: false, updated_at: 2 };
        assert_eq!(diff(Some(&before), Some(&after)), json!({"is_active": [true, false]}));
        assert_eq!(
            diff(None, Some(&before)),
            json!({"name": [null, "Vista"], "is_active": [null, true]})
        );
    }

    #[test]
    fn bookkeeping_only_update_is_not_recorded() {
        let before = Row { name: "Vista", is_active: true, updated_at: 1 };
        let after = Row { name: "Vista", is_active: true, updated_at: 9 };
        assert!(AuditEntry::updated(AuditEntity::Property, Uuid::new_v4(), None, &before, &after).is_none());
    }
}
