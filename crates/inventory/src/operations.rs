//! Table-in, table-out operations.
//!
//! Each mutating operation works on a copy of the caller's table and returns
//! the new table only if every event applied. A failed operation leaves the
//! caller's table untouched; persisting the result is the caller's decision.

use thriftstock_core::{Aggregate, AggregateRoot, DomainResult, Event};

use crate::table::{AddItem, CreateBundle, InventoryCommand, InventoryEvent, InventoryTable, MarkSold};

fn run(table: &InventoryTable, command: InventoryCommand) -> DomainResult<InventoryTable> {
    let mut next = table.clone();
    let events = next.execute(&command)?;
    for event in &events {
        log_event(event, next.version());
    }
    Ok(next)
}

fn log_event(event: &InventoryEvent, version: u64) {
    match event {
        InventoryEvent::ItemAdded(e) => {
            let r = &e.record;
            tracing::info!(
                event = event.event_type(),
                version,
                sku = %r.sku(),
                tier = %r.tier(),
                "item added"
            );
            tracing::debug!(
                sku = %r.sku(),
                weight_g = r.weight_g(),
                weight_lb = r.weight_lb(),
                price_cad = %r.price_cad(),
                cost_cad = %r.cost_cad(),
                "priced item"
            );
        }
        InventoryEvent::ItemSold(e) => {
            tracing::info!(event = event.event_type(), version, sku = %e.sku, "item sold");
        }
        InventoryEvent::BundleCreated(e) => {
            tracing::info!(
                event = event.event_type(),
                version,
                sku = %e.bundle.sku(),
                items = e.constituents.len(),
                weight_g = e.bundle.weight_g(),
                price_cad = %e.bundle.price_cad(),
                "bundle created"
            );
        }
    }
}

/// Add a new unsold item priced from its weight and tier.
pub fn add_item(table: &InventoryTable, cmd: AddItem) -> DomainResult<InventoryTable> {
    run(table, InventoryCommand::AddItem(cmd))
}

/// Mark an item sold.
///
/// Fails with `NotFound` for an unknown sku; marking an already sold item
/// again returns an equal table.
pub fn mark_sold(table: &InventoryTable, cmd: MarkSold) -> DomainResult<InventoryTable> {
    run(table, InventoryCommand::MarkSold(cmd))
}

/// Combine unsold items into a new bundle record and mark them sold.
///
/// All-or-nothing: if any requested sku is missing or already sold, the
/// error lists them and no record changes.
pub fn create_bundle(table: &InventoryTable, cmd: CreateBundle) -> DomainResult<InventoryTable> {
    run(table, InventoryCommand::CreateBundle(cmd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use thriftstock_core::{DomainError, Sku};

    use crate::pricing::{Money, PricingPolicy, RateTable};
    use crate::record::Tier;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn sku(s: &str) -> Sku {
        Sku::new(s).unwrap()
    }

    fn add(sku: &str, weight_g: f64, tier: Tier) -> AddItem {
        AddItem {
            sku: sku.to_string(),
            weight_g,
            description: format!("item {sku}"),
            tier,
            size: "M".to_string(),
            tags: String::new(),
            measurements: String::new(),
            pic_paths: Vec::new(),
            occurred_at: test_time(),
        }
    }

    fn bundle(bundle_sku: &str, items: &[&str]) -> CreateBundle {
        CreateBundle {
            bundle_sku: bundle_sku.to_string(),
            item_skus: items.iter().map(|s| s.to_string()).collect(),
            description: "bundle".to_string(),
            occurred_at: test_time(),
        }
    }

    fn sold(s: &str) -> MarkSold {
        MarkSold {
            sku: s.to_string(),
            occurred_at: test_time(),
        }
    }

    fn empty_table() -> InventoryTable {
        InventoryTable::new(PricingPolicy::default())
    }

    #[test]
    fn add_item_prices_tier_two_example() {
        let policy = PricingPolicy {
            rates: RateTable::new([(Tier::Two, 5.50)]),
            cost_per_lb: 1.79,
        };
        let table = InventoryTable::new(policy);
        let cmd = add("A", 500.0, Tier::Two);
        let added_on = cmd.occurred_at.date_naive();
        let table = add_item(&table, cmd).unwrap();

        let record = table.find_by_sku(&sku("A")).unwrap();
        assert_eq!(format!("{:.2}", record.weight_lb()), "1.10");
        assert_eq!(record.price_cad(), Money::from_cents(606));
        assert_eq!(record.cost_cad(), Money::from_cents(197));
        assert_eq!(record.date_added(), Some(added_on));
        assert!(!record.is_sold());
    }

    #[test]
    fn add_item_rejects_absurd_weight() {
        let table = empty_table();
        for s in ["BIG1", "BIG2"] {
            match add_item(&table, add(s, 1e19, Tier::One)) {
                Err(DomainError::Validation(_)) => {}
                other => panic!("Expected Validation error, got {other:?}"),
            }
        }
        assert!(table.is_empty());
        assert_eq!(crate::report::summarize(&table).retail_value, Money::ZERO);
    }

    #[test]
    fn add_item_normalizes_tags_and_drops_measurements_below_tier_three() {
        let mut cmd = add("A", 250.0, Tier::One);
        cmd.tags = " tshirt , casual,, tshirt".to_string();
        cmd.measurements = "20x28".to_string();
        cmd.pic_paths = vec!["pics/a1.jpg".to_string(), "  ".to_string()];
        let table = add_item(&empty_table(), cmd).unwrap();
        let record = table.find_by_sku(&sku("A")).unwrap();
        assert_eq!(record.tags().join(), "tshirt,casual");
        assert_eq!(record.measurements(), "");
        assert_eq!(record.pic_paths(), ["pics/a1.jpg".to_string()]);

        let mut cmd = add("B", 250.0, Tier::Three);
        cmd.measurements = "20x28".to_string();
        let table = add_item(&table, cmd).unwrap();
        assert_eq!(table.find_by_sku(&sku("B")).unwrap().measurements(), "20x28");
    }

    #[test]
    fn add_item_validation_leaves_table_unchanged() {
        let table = add_item(&empty_table(), add("A", 100.0, Tier::One)).unwrap();

        let err = add_item(&table, add("  ", 100.0, Tier::One)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = add_item(&table, add("B", 0.0, Tier::One)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = add_item(&table, add("A", 100.0, Tier::One)).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateSku(_)));

        assert_eq!(table.len(), 1);
    }

    #[test]
    fn add_item_fails_loudly_for_unpriced_tier() {
        let policy = PricingPolicy {
            rates: RateTable::new([(Tier::One, 7.5)]),
            cost_per_lb: 1.79,
        };
        let table = InventoryTable::new(policy);
        let err = add_item(&table, add("A", 100.0, Tier::Two)).unwrap_err();
        assert_eq!(err, DomainError::UnknownTier("2".to_string()));
        assert!(table.is_empty());
    }

    #[test]
    fn mark_sold_sets_flag_and_is_idempotent() {
        let table = add_item(&empty_table(), add("A", 100.0, Tier::One)).unwrap();
        let once = mark_sold(&table, sold("A")).unwrap();
        assert!(once.find_by_sku(&sku("A")).unwrap().is_sold());

        let twice = mark_sold(&once, sold("A")).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn mark_sold_unknown_sku_is_not_found() {
        let table = add_item(&empty_table(), add("A", 100.0, Tier::One)).unwrap();
        let err = mark_sold(&table, sold("ZZZ")).unwrap_err();
        assert_eq!(err, DomainError::NotFound("ZZZ".to_string()));
    }

    #[test]
    fn bundle_of_three_and_two_hundred_grams() {
        let mut table = empty_table();
        table = add_item(&table, add("A", 300.0, Tier::One)).unwrap();
        table = add_item(&table, add("B", 200.0, Tier::Two)).unwrap();

        let table = create_bundle(&table, bundle("BND-1", &["A", "B"])).unwrap();

        let b = table.find_by_sku(&sku("BND-1")).unwrap();
        assert_eq!(b.weight_g(), 500.0);
        assert_eq!(b.tier(), Tier::Bundle);
        assert_eq!(b.price_cad(), Money::from_cents(413));
        assert_eq!(b.cost_cad(), Money::from_cents(197));
        assert!(!b.is_sold());
        assert!(table.find_by_sku(&sku("A")).unwrap().is_sold());
        assert!(table.find_by_sku(&sku("B")).unwrap().is_sold());
    }

    #[test]
    fn bundle_unions_tags_and_concatenates_pictures() {
        let mut a = add("A", 300.0, Tier::One);
        a.tags = "denim,vintage".to_string();
        a.pic_paths = vec!["a1.jpg".into(), "a2.jpg".into()];
        let mut b = add("B", 200.0, Tier::Two);
        b.tags = "vintage,Bundle,y2k".to_string();
        b.pic_paths = vec!["b1.jpg".into()];

        let table = add_item(&empty_table(), a).unwrap();
        let table = add_item(&table, b).unwrap();
        let table = create_bundle(&table, bundle("BND", &["A", "B"])).unwrap();

        let record = table.find_by_sku(&sku("BND")).unwrap();
        assert_eq!(record.tags().join(), "denim,vintage,Bundle,y2k");
        assert_eq!(record.pic_paths(), ["a1.jpg", "a2.jpg", "b1.jpg"]);
        assert_eq!(record.size(), "");
        assert_eq!(record.measurements(), "");
    }

    #[test]
    fn bundle_with_sold_item_changes_nothing() {
        let mut table = empty_table();
        for (s, w) in [("A", 100.0), ("B", 200.0), ("C", 300.0)] {
            table = add_item(&table, add(s, w, Tier::Two)).unwrap();
        }
        let table = mark_sold(&table, sold("C")).unwrap();

        let err = create_bundle(&table, bundle("BND", &["A", "B", "C"])).unwrap_err();
        match err {
            DomainError::BundleValidation(msg) => assert!(msg.contains("already sold: C")),
            _ => panic!("Expected BundleValidation error"),
        }
        // Caller's table is untouched.
        assert!(!table.find_by_sku(&sku("A")).unwrap().is_sold());
        assert!(table.find_by_sku(&sku("BND")).is_none());
    }

    #[test]
    fn bundle_with_missing_item_is_rejected() {
        let table = add_item(&empty_table(), add("A", 100.0, Tier::One)).unwrap();
        let err = create_bundle(&table, bundle("BND", &["A", "NOPE"])).unwrap_err();
        match err {
            DomainError::BundleValidation(msg) => assert!(msg.contains("not found: NOPE")),
            _ => panic!("Expected BundleValidation error"),
        }

        let err = create_bundle(&table, bundle("BND", &[" ", ""])).unwrap_err();
        assert!(matches!(err, DomainError::BundleValidation(_)));
    }

    #[test]
    fn bundled_items_cannot_be_bundled_again() {
        let mut table = empty_table();
        table = add_item(&table, add("A", 300.0, Tier::One)).unwrap();
        table = add_item(&table, add("B", 200.0, Tier::Two)).unwrap();
        table = create_bundle(&table, bundle("BND-1", &["A", "B"])).unwrap();

        let err = create_bundle(&table, bundle("BND-2", &["A"])).unwrap_err();
        assert!(matches!(err, DomainError::BundleValidation(_)));
    }

    #[test]
    fn bundle_weight_is_a_snapshot() {
        let mut table = empty_table();
        table = add_item(&table, add("A", 300.0, Tier::One)).unwrap();
        table = add_item(&table, add("B", 200.0, Tier::Two)).unwrap();
        table = create_bundle(&table, bundle("BND-1", &["A", "B"])).unwrap();

        // Later table changes around the constituents leave the bundle alone.
        table = add_item(&table, add("C", 999.0, Tier::Three)).unwrap();
        table = mark_sold(&table, sold("A")).unwrap();
        let rebuilt = InventoryTable::from_records(
            "rebuilt",
            PricingPolicy::default(),
            table.iter().filter(|r| r.sku().as_str() != "A").cloned(),
        )
        .unwrap();

        assert_eq!(rebuilt.find_by_sku(&sku("BND-1")).unwrap().weight_g(), 500.0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: stored price and cost follow the per-pound formulas exactly.
            #[test]
            fn add_item_follows_pricing_formulas(
                weight_g in 1.0f64..50_000.0,
                tier_idx in 0usize..3
            ) {
                let tier = [Tier::One, Tier::Two, Tier::Three][tier_idx];
                let policy = PricingPolicy::default();
                let table = add_item(&InventoryTable::new(policy.clone()), add("P", weight_g, tier)).unwrap();
                let record = table.find_by_sku(&sku("P")).unwrap();

                let lb = weight_g / 453.592;
                prop_assert!((record.weight_lb() - lb).abs() < 1e-9);
                let rate = policy.rates.rate(tier).unwrap();
                prop_assert_eq!(record.price_cad(), Money::from_dollars(lb * rate));
                prop_assert_eq!(record.cost_cad(), Money::from_dollars(lb * policy.cost_per_lb));
            }

            /// Property: bundle weight is the exact sum of its constituents.
            #[test]
            fn bundle_weight_is_sum_of_items(
                weights in proptest::collection::vec(1.0f64..5_000.0, 1..8)
            ) {
                let mut table = empty_table();
                let mut skus = Vec::new();
                for (i, w) in weights.iter().enumerate() {
                    let s = format!("I{i}");
                    table = add_item(&table, add(&s, *w, Tier::Two)).unwrap();
                    skus.push(s);
                }
                let refs: Vec<&str> = skus.iter().map(String::as_str).collect();
                let table = create_bundle(&table, bundle("BND", &refs)).unwrap();

                let expected: f64 = weights.iter().sum();
                prop_assert_eq!(table.find_by_sku(&sku("BND")).unwrap().weight_g(), expected);
                prop_assert!(table.filter(|r| !r.is_bundle()).iter().all(|r| r.is_sold()));
            }

            /// Property: a bundle touching any sold item leaves the table as it was.
            #[test]
            fn failed_bundle_is_atomic(
                count in 2usize..8,
                sold_idx in 0usize..8
            ) {
                let sold_idx = sold_idx % count;
                let mut table = empty_table();
                let mut skus = Vec::new();
                for i in 0..count {
                    let s = format!("I{i}");
                    table = add_item(&table, add(&s, 100.0, Tier::One)).unwrap();
                    skus.push(s);
                }
                table = mark_sold(&table, sold(&skus[sold_idx])).unwrap();
                let before = table.clone();

                let refs: Vec<&str> = skus.iter().map(String::as_str).collect();
                prop_assert!(create_bundle(&table, bundle("BND", &refs)).is_err());
                prop_assert_eq!(&table, &before);
            }
        }
    }
}
