//! Ledger property tests
//!
//! - Stock balance: quantity equals stock-moving entries minus exits
//! - Quantity never goes negative
//! - A rejected exit leaves the item unchanged
//! - Relocations do not move stock

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    AuditStamp, Building, InventoryItem, LedgerError, Location, MaterialType, NewEntry, NewExit,
    NewItem, RequestingArea, UnitOfMeasure,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Movement {
    Entry(i64),
    Exit(i64),
    Relocate(u32),
}

fn movement_strategy() -> impl Strategy<Value = Movement> {
    prop_oneof![
        (1i64..=100).prop_map(Movement::Entry),
        (1i64..=120).prop_map(Movement::Exit),
        (1u32..=9).prop_map(Movement::Relocate),
    ]
}

fn stamp(minutes: i64) -> AuditStamp {
    let base = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
    AuditStamp::new(Uuid::nil(), "admin", base + Duration::minutes(minutes))
}

fn new_item(quantity: i64) -> InventoryItem {
    InventoryItem::create(
        NewItem {
            material_type: MaterialType::Office,
            name: "Papel".to_string(),
            description: None,
            quantity,
            unit: UnitOfMeasure::Box,
            unit_price: Decimal::ZERO,
            minimum_stock: 5,
            location: Location::new(Building::Adm, "A1", 1),
        },
        "ADM-AA1-N1-0000AAAA".to_string(),
        &stamp(0),
    )
    .unwrap()
}

fn exit(quantity: i64) -> NewExit {
    NewExit {
        time: None,
        quantity,
        reason: "Consumo".to_string(),
        area: RequestingArea::Administration,
        requester: "Ana".to_string(),
        released_by: "Luis".to_string(),
    }
}

proptest! {
    /// Any sequence of movements keeps quantity equal to the ledger balance
    #[test]
    fn test_quantity_matches_ledger(
        opening in 0i64..=50,
        movements in prop::collection::vec(movement_strategy(), 0..40),
    ) {
        let mut item = new_item(opening);
        prop_assert_eq!(item.quantity, item.ledger_balance());

        for (i, movement) in movements.into_iter().enumerate() {
            let at = stamp(i as i64 + 1);
            match movement {
                Movement::Entry(q) => {
                    item.apply_entry(NewEntry { date: None, quantity: q, supplier: None }, &at)
                        .unwrap();
                }
                Movement::Exit(q) => {
                    let before = item.clone();
                    match item.apply_exit(exit(q), &at) {
                        Ok(()) => prop_assert!(q <= before.quantity),
                        Err(LedgerError::InsufficientStock { available, requested }) => {
                            prop_assert_eq!(available, before.quantity);
                            prop_assert_eq!(requested, q);
                            prop_assert_eq!(&item, &before);
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Movement::Relocate(level) => {
                    let quantity = item.quantity;
                    item.relocate(
                        Location::new(Building::Ti, "B", level),
                        format!("TI-AB-N{}-{:04}AAAA", level, i),
                        &at,
                    );
                    prop_assert_eq!(item.quantity, quantity);
                }
            }

            prop_assert!(item.quantity >= 0);
            prop_assert_eq!(item.quantity, item.ledger_balance());
        }
    }

    /// Demand metrics count every accepted exit
    #[test]
    fn test_metrics_track_exits(exits in prop::collection::vec(1i64..=10, 1..20)) {
        let mut item = new_item(1_000);
        for (i, q) in exits.iter().enumerate() {
            item.apply_exit(exit(*q), &stamp(i as i64 + 1)).unwrap();
        }

        let metrics = item.demand_metrics.clone().unwrap();
        prop_assert_eq!(metrics.total_exits, exits.len() as u64);
        prop_assert_eq!(metrics.cumulative_removed, exits.iter().sum::<i64>());
        prop_assert!(metrics.rotation_ratio >= 0.0);
        prop_assert!(metrics.monthly_frequency > 0.0);
    }
}
