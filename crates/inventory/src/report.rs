//! Read-only reports over an inventory table.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use thriftstock_core::Sku;

use crate::pricing::Money;
use crate::record::{Record, TagSet, Tier};
use crate::table::InventoryTable;

/// Default age (days) after which unsold stock counts as slow moving.
pub const DEFAULT_SLOW_MOVER_DAYS: u32 = 60;

/// Suggested follow-up for a slow mover.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "&'static str")]
pub enum RecommendedAction {
    /// Tier 3: drop the price or fold into a bundle.
    DiscountOrBundleDown,
    /// Higher tiers and bundles: pair with cheaper stock.
    BundleWithLowerTier,
}

impl RecommendedAction {
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Three => RecommendedAction::DiscountOrBundleDown,
            _ => RecommendedAction::BundleWithLowerTier,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendedAction::DiscountOrBundleDown => "discount or bundle down",
            RecommendedAction::BundleWithLowerTier => "bundle with lower tier",
        }
    }
}

impl From<RecommendedAction> for &'static str {
    fn from(value: RecommendedAction) -> Self {
        value.as_str()
    }
}

impl core::fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the slow-movers report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowMover {
    #[serde(rename = "SKU")]
    pub sku: Sku,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Tier")]
    pub tier: Tier,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Tags")]
    pub tags: TagSet,
    #[serde(rename = "Weight_g")]
    pub weight_g: f64,
    #[serde(rename = "Weight_lb")]
    pub weight_lb: f64,
    #[serde(rename = "Price_CAD")]
    pub price_cad: Money,
    #[serde(rename = "Cost_CAD")]
    pub cost_cad: Money,
    #[serde(rename = "Date_Added")]
    pub date_added: NaiveDate,
    #[serde(rename = "Action")]
    pub recommended_action: RecommendedAction,
}

impl SlowMover {
    fn from_record(record: &Record, date_added: NaiveDate) -> Self {
        Self {
            sku: record.sku().clone(),
            description: record.description().to_string(),
            tier: record.tier(),
            size: record.size().to_string(),
            tags: record.tags().clone(),
            weight_g: record.weight_g(),
            weight_lb: record.weight_lb(),
            price_cad: record.price_cad(),
            cost_cad: record.cost_cad(),
            date_added,
            recommended_action: RecommendedAction::for_tier(record.tier()),
        }
    }
}

/// Unsold records added `threshold_days` or more days before `as_of`.
///
/// Records without a usable `date_added` are skipped.
pub fn slow_movers(table: &InventoryTable, threshold_days: u32, as_of: NaiveDate) -> Vec<SlowMover> {
    let Some(cutoff) = as_of.checked_sub_days(Days::new(u64::from(threshold_days))) else {
        return Vec::new();
    };

    table
        .iter()
        .filter(|r| !r.is_sold())
        .filter_map(|r| match r.date_added() {
            Some(added) if added <= cutoff => Some(SlowMover::from_record(r, added)),
            _ => None,
        })
        .collect()
}

/// Totals shown alongside the inventory listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    pub records: usize,
    pub unsold: usize,
    pub retail_value: Money,
    pub cost_value: Money,
}

pub fn summarize(table: &InventoryTable) -> InventorySummary {
    let unsold = table.filter(|r| !r.is_sold());
    InventorySummary {
        records: table.len(),
        unsold: unsold.len(),
        retail_value: unsold.iter().map(|r| r.price_cad()).sum(),
        cost_value: unsold.iter().map(|r| r.cost_cad()).sum(),
    }
}
