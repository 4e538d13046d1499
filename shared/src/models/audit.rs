//! Audit stamps and the per-item audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntryKind, InventoryItem, RequestingArea};

/// Who performed a mutation and when
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditStamp {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub at: DateTime<Utc>,
}

impl AuditStamp {
    pub fn new(actor_id: Uuid, actor_name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            actor_id,
            actor_name: actor_name.into(),
            at,
        }
    }
}

/// Kind of event in an item's audit trail
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventKind {
    Creation,
    Modification,
    Entry,
    LocationChange,
    Exit,
}

/// One line of an item's audit trail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub kind: AuditEventKind,
    pub date: DateTime<Utc>,
    pub actor_id: Uuid,
    pub actor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<RequestingArea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEvent {
    fn from_stamp(kind: AuditEventKind, stamp: &AuditStamp) -> Self {
        Self {
            kind,
            date: stamp.at,
            actor_id: stamp.actor_id,
            actor_name: stamp.actor_name.clone(),
            quantity: None,
            area: None,
            detail: None,
        }
    }
}

/// Build the audit trail of an item, newest first.
///
/// The last-modified stamp is reported as a separate modification only when it
/// was not produced by the creation or by one of the ledger records, because
/// those operations reuse the same stamp for both fields.
pub fn audit_trail(item: &InventoryItem) -> Vec<AuditEvent> {
    let mut events = Vec::with_capacity(item.entries.len() + item.exits.len() + 2);

    let mut creation = AuditEvent::from_stamp(AuditEventKind::Creation, &item.created_by);
    creation.detail = Some(item.name.clone());
    events.push(creation);

    for entry in &item.entries {
        let kind = match entry.kind {
            EntryKind::LocationChange => AuditEventKind::LocationChange,
            EntryKind::Restock | EntryKind::OpeningBalance => AuditEventKind::Entry,
        };
        let mut event = AuditEvent::from_stamp(kind, &entry.recorded_by);
        event.date = entry.date;
        event.quantity = Some(entry.quantity);
        event.detail = match (&entry.previous_location, &entry.new_location) {
            (Some(prev), Some(new)) => Some(format!(
                "{}-{}-{} -> {}-{}-{}",
                prev.building, prev.shelf, prev.level, new.building, new.shelf, new.level
            )),
            _ => entry.supplier.clone(),
        };
        events.push(event);
    }

    for exit in &item.exits {
        let mut event = AuditEvent::from_stamp(AuditEventKind::Exit, &exit.recorded_by);
        event.date = exit.date;
        event.quantity = Some(exit.quantity);
        event.area = Some(exit.area);
        event.detail = Some(exit.reason.clone());
        events.push(event);
    }

    if let Some(stamp) = &item.last_modified_by {
        let already_recorded = *stamp == item.created_by
            || item.entries.iter().any(|e| e.recorded_by == *stamp)
            || item.exits.iter().any(|e| e.recorded_by == *stamp);
        if !already_recorded {
            events.push(AuditEvent::from_stamp(AuditEventKind::Modification, stamp));
        }
    }

    // Later records first when timestamps tie
    events.reverse();
    events.sort_by(|a, b| b.date.cmp(&a.date));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ItemPatch, NewEntry, NewExit, NewItem};
    use crate::models::{Building, Location, MaterialType, UnitOfMeasure};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn stamp(name: &str, day: u32) -> AuditStamp {
        AuditStamp::new(
            Uuid::new_v4(),
            name,
            Utc.with_ymd_and_hms(2024, 6, day, 8, 0, 0).unwrap(),
        )
    }

    fn item(created: &AuditStamp) -> InventoryItem {
        InventoryItem::create(
            NewItem {
                material_type: MaterialType::Cleaning,
                name: "Jabón".to_string(),
                description: None,
                quantity: 0,
                unit: UnitOfMeasure::Liter,
                unit_price: Decimal::ZERO,
                minimum_stock: 0,
                location: Location::new(Building::Adm, "C", 2),
            },
            "ADM-AC-N2-0001AAAA".to_string(),
            created,
        )
        .unwrap()
    }

    fn restock(quantity: i64) -> NewEntry {
        NewEntry {
            date: None,
            quantity,
            supplier: None,
        }
    }

    #[test]
    fn test_trail_has_one_event_per_operation_newest_first() {
        let mut item = item(&stamp("admin", 1));
        item.apply_entry(restock(10), &stamp("admin", 2)).unwrap();
        item.apply_entry(restock(5), &stamp("maria", 3)).unwrap();
        item.apply_exit(
            NewExit {
                time: None,
                quantity: 4,
                reason: "Limpieza de oficinas".to_string(),
                area: RequestingArea::Cleaning,
                requester: "Pedro".to_string(),
                released_by: "Maria".to_string(),
            },
            &stamp("maria", 4),
        )
        .unwrap();

        let trail = audit_trail(&item);
        let kinds: Vec<AuditEventKind> = trail.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AuditEventKind::Exit,
                AuditEventKind::Entry,
                AuditEventKind::Entry,
                AuditEventKind::Creation
            ]
        );
        assert!(trail.windows(2).all(|w| w[0].date >= w[1].date));
        assert_eq!(trail[0].area, Some(RequestingArea::Cleaning));
    }

    #[test]
    fn test_standalone_modification_is_reported() {
        let mut item = item(&stamp("admin", 1));
        item.apply_patch(
            ItemPatch {
                name: Some("Jabón líquido".to_string()),
                ..Default::default()
            },
            &stamp("luis", 5),
        )
        .unwrap();

        let trail = audit_trail(&item);
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].kind, AuditEventKind::Modification);
        assert_eq!(trail[0].actor_name, "luis");
    }
}
