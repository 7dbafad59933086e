//! Session state shared by the one-shot commands and the interactive menu.
//!
//! Every mutating action runs a domain operation on the current table,
//! adopts the result and saves it. A failed save is reported alongside the
//! action's message; the in-memory table keeps the change.

use chrono::{DateTime, NaiveDate, Utc};

use thriftstock_core::{AggregateRoot, DomainResult};
use thriftstock_infra::{AppConfig, InventoryStore, PersistenceError};
use thriftstock_inventory::{
    AddItem, CatalogRow, CatalogSettings, CreateBundle, ExportFilter, InventorySummary,
    InventoryTable, MarkSold, SlowMover, Tier, add_item, create_bundle, export_catalog, mark_sold,
    slow_movers, summarize,
};

/// Result of a mutating action.
#[derive(Debug)]
pub struct Outcome {
    pub message: String,
    /// Set when the change could not be persisted.
    pub save_error: Option<PersistenceError>,
}

/// User input for a new item, before it becomes a command.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub sku: String,
    pub weight_g: f64,
    pub description: String,
    pub tier: Tier,
    pub size: String,
    pub tags: String,
    pub measurements: String,
    pub pic_paths: Vec<String>,
}

pub struct App<S> {
    store: S,
    table: InventoryTable,
    catalog: CatalogSettings,
    slow_mover_days: u32,
}

impl<S: InventoryStore> App<S> {
    /// Load the table from `store`. A load failure is returned rather than
    /// replaced by an empty table, so a later save cannot clobber the file.
    pub fn open(store: S, config: &AppConfig) -> Result<Self, PersistenceError> {
        let table = store.load()?;
        Ok(Self {
            store,
            table,
            catalog: config.catalog.clone(),
            slow_mover_days: config.report.slow_mover_days,
        })
    }

    pub fn table(&self) -> &InventoryTable {
        &self.table
    }

    pub fn slow_mover_days(&self) -> u32 {
        self.slow_mover_days
    }

    pub fn summary(&self) -> InventorySummary {
        summarize(&self.table)
    }

    pub fn add_item(&mut self, item: NewItem, now: DateTime<Utc>) -> DomainResult<Outcome> {
        let next = add_item(
            &self.table,
            AddItem {
                sku: item.sku,
                weight_g: item.weight_g,
                description: item.description,
                tier: item.tier,
                size: item.size,
                tags: item.tags,
                measurements: item.measurements,
                pic_paths: item.pic_paths,
                occurred_at: now,
            },
        )?;
        let save_error = self.commit(next);

        let message = match self.table.iter().last() {
            Some(r) => format!(
                "Item added! {}g ({:.2}lb, ${} CAD, Cost ${} CAD)",
                r.weight_g(),
                r.weight_lb(),
                r.price_cad(),
                r.cost_cad()
            ),
            None => "Item added!".to_string(),
        };
        Ok(Outcome {
            message,
            save_error,
        })
    }

    pub fn mark_sold(&mut self, sku: &str, now: DateTime<Utc>) -> DomainResult<Outcome> {
        let next = mark_sold(
            &self.table,
            MarkSold {
                sku: sku.to_string(),
                occurred_at: now,
            },
        )?;
        let changed = next.version() != self.table.version();
        let save_error = self.commit(next);

        let message = if changed {
            format!("Marked {} as sold!", sku.trim())
        } else {
            format!("{} was already sold.", sku.trim())
        };
        Ok(Outcome {
            message,
            save_error,
        })
    }

    pub fn create_bundle(
        &mut self,
        bundle_sku: &str,
        item_skus: Vec<String>,
        description: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Outcome> {
        let count = item_skus.len();
        let next = create_bundle(
            &self.table,
            CreateBundle {
                bundle_sku: bundle_sku.to_string(),
                item_skus,
                description: description.to_string(),
                occurred_at: now,
            },
        )?;
        let save_error = self.commit(next);

        let message = match self.table.iter().last() {
            Some(b) => format!(
                "Bundle created! {} from {} items: {}g, ${} CAD",
                b.sku(),
                count,
                b.weight_g(),
                b.price_cad()
            ),
            None => "Bundle created!".to_string(),
        };
        Ok(Outcome {
            message,
            save_error,
        })
    }

    /// Slow movers as of `today`, using the configured threshold unless
    /// `days` is given.
    pub fn slow_movers(&self, days: Option<u32>, today: NaiveDate) -> Vec<SlowMover> {
        slow_movers(&self.table, days.unwrap_or(self.slow_mover_days), today)
    }

    pub fn export(&self, filter: &ExportFilter) -> Vec<CatalogRow> {
        export_catalog(&self.table, filter, &self.catalog)
    }

    /// Adopt `next` and persist it if it differs from the current table.
    fn commit(&mut self, next: InventoryTable) -> Option<PersistenceError> {
        let changed = next.version() != self.table.version();
        self.table = next;
        if !changed {
            return None;
        }

        match self.store.save(&self.table) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "save failed; change kept in memory");
                Some(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use thriftstock_core::DomainError;
    use thriftstock_inventory::PricingPolicy;

    /// In-memory store; optionally fails every save.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        pub(crate) saved: RefCell<Option<InventoryTable>>,
        pub(crate) saves: Cell<usize>,
        pub(crate) fail: bool,
    }

    impl InventoryStore for MemoryStore {
        fn load(&self) -> Result<InventoryTable, PersistenceError> {
            Ok(self
                .saved
                .borrow()
                .clone()
                .unwrap_or_else(|| InventoryTable::new(PricingPolicy::default())))
        }

        fn save(&self, table: &InventoryTable) -> Result<(), PersistenceError> {
            self.saves.set(self.saves.get() + 1);
            if self.fail {
                return Err(PersistenceError::Remote {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            *self.saved.borrow_mut() = Some(table.clone());
            Ok(())
        }
    }

    pub(crate) fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    pub(crate) fn item(sku: &str, weight_g: f64, tier: Tier) -> NewItem {
        NewItem {
            sku: sku.to_string(),
            weight_g,
            description: format!("Item {sku}"),
            tier,
            size: String::new(),
            tags: String::new(),
            measurements: String::new(),
            pic_paths: Vec::new(),
        }
    }

    pub(crate) fn app(store: MemoryStore) -> App<MemoryStore> {
        App::open(store, &AppConfig::default()).unwrap()
    }

    #[test]
    fn add_item_saves_and_reports_price() {
        let mut app = app(MemoryStore::default());
        let outcome = app.add_item(item("A1", 500.0, Tier::Two), now()).unwrap();

        assert_eq!(outcome.message, "Item added! 500g (1.10lb, $6.06 CAD, Cost $1.97 CAD)");
        assert!(outcome.save_error.is_none());
        assert_eq!(app.store.saves.get(), 1);
        assert_eq!(app.store.saved.borrow().as_ref().map(|t| t.len()), Some(1));
    }

    #[test]
    fn failed_save_keeps_change_in_memory() {
        let mut app = app(MemoryStore {
            fail: true,
            ..MemoryStore::default()
        });
        let outcome = app.add_item(item("A1", 500.0, Tier::Two), now()).unwrap();

        assert!(outcome.save_error.is_some());
        assert_eq!(app.table().len(), 1);
    }

    #[test]
    fn domain_error_does_not_save() {
        let mut app = app(MemoryStore::default());
        app.add_item(item("A1", 500.0, Tier::Two), now()).unwrap();

        let err = app.add_item(item("A1", 100.0, Tier::One), now()).unwrap_err();
        match err {
            DomainError::DuplicateSku(_) => {}
            _ => panic!("Expected DuplicateSku error"),
        }
        assert_eq!(app.store.saves.get(), 1);
        assert_eq!(app.table().len(), 1);
    }

    #[test]
    fn repeated_mark_sold_saves_once() {
        let mut app = app(MemoryStore::default());
        app.add_item(item("A1", 500.0, Tier::Two), now()).unwrap();

        let first = app.mark_sold("A1", now()).unwrap();
        assert_eq!(first.message, "Marked A1 as sold!");
        let second = app.mark_sold("A1", now()).unwrap();
        assert_eq!(second.message, "A1 was already sold.");
        assert_eq!(app.store.saves.get(), 2);
    }

    #[test]
    fn bundle_message_and_export_exclude_constituents() {
        let mut app = app(MemoryStore::default());
        app.add_item(item("A", 300.0, Tier::One), now()).unwrap();
        app.add_item(item("B", 200.0, Tier::Two), now()).unwrap();

        let outcome = app
            .create_bundle("BND", vec!["A".to_string(), "B".to_string()], "Pair", now())
            .unwrap();
        assert_eq!(outcome.message, "Bundle created! BND from 2 items: 500g, $4.13 CAD");

        let rows = app.export(&ExportFilter::default());
        let handles: Vec<_> = rows.iter().map(|r| r.handle.as_str()).collect();
        assert_eq!(handles, vec!["BND"]);
    }

    #[test]
    fn slow_movers_use_configured_threshold() {
        let mut app = app(MemoryStore::default());
        app.add_item(item("A", 300.0, Tier::One), now()).unwrap();

        let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(app.slow_mover_days(), 60);
        assert!(app.slow_movers(None, day("2024-04-01")).is_empty());
        assert_eq!(app.slow_movers(None, day("2024-05-01")).len(), 1);
        assert_eq!(app.slow_movers(Some(10), day("2024-04-01")).len(), 1);
    }
}
