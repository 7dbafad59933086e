//! Inventory domain module.
//!
//! Records, weight-based pricing, the inventory table and the operations and
//! reports that run over it, implemented purely as deterministic domain logic
//! (no IO).

pub mod catalog;
pub mod operations;
pub mod pricing;
pub mod record;
pub mod report;
pub mod table;

pub use catalog::{CatalogRow, CatalogSettings, ExportFilter, export_catalog};
pub use operations::{add_item, create_bundle, mark_sold};
pub use pricing::{
    GRAMS_PER_POUND, MAX_RATE_PER_LB, Money, PricingPolicy, Quote, RateTable, compute_cost, compute_price,
    grams_to_pounds,
};
pub use record::{MAX_WEIGHT_G, Record, TagSet, Tier};
pub use report::{
    DEFAULT_SLOW_MOVER_DAYS, InventorySummary, RecommendedAction, SlowMover, slow_movers, summarize,
};
pub use table::{
    AddItem, BundleCreated, CreateBundle, InventoryCommand, InventoryEvent, InventoryTable,
    ItemAdded, ItemSold, MarkSold,
};
