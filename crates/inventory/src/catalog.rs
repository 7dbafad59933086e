//! Marketplace (Shopify product CSV) rows.
//!
//! Export is a pure projection of the table: sold records never appear and
//! every product is imported as an unpublished draft.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use thriftstock_core::Sku;

use crate::pricing::Money;
use crate::record::Record;
use crate::table::InventoryTable;

/// Store-level constants written into every row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_vendor")]
    pub vendor: String,
    #[serde(default = "default_product_category")]
    pub product_category: String,
}

fn default_vendor() -> String {
    "Your Thrift Arbitrage".to_string()
}

fn default_product_category() -> String {
    "Apparel & Accessories > Clothing".to_string()
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            vendor: default_vendor(),
            product_category: default_product_category(),
        }
    }
}

/// Optional narrowing of an export. Filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFilter {
    /// Only these skus.
    pub skus: Option<BTreeSet<Sku>>,
    /// Only records added on or after this date. Records without a date are dropped.
    pub added_on_or_after: Option<NaiveDate>,
}

impl ExportFilter {
    pub fn matches(&self, record: &Record) -> bool {
        if record.is_sold() {
            return false;
        }
        if let Some(skus) = &self.skus {
            if !skus.contains(record.sku()) {
                return false;
            }
        }
        if let Some(since) = self.added_on_or_after {
            match record.date_added() {
                Some(added) if added >= since => {}
                _ => return false,
            }
        }
        true
    }
}

/// One product row of the marketplace import file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRow {
    #[serde(rename = "Handle")]
    pub handle: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Body (HTML)")]
    pub body_html: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Product Category")]
    pub product_category: String,
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Published")]
    pub published: bool,
    #[serde(rename = "Option1 Name")]
    pub option1_name: &'static str,
    #[serde(rename = "Option1 Value")]
    pub option1_value: &'static str,
    #[serde(rename = "Variant SKU")]
    pub variant_sku: String,
    #[serde(rename = "Variant Grams")]
    pub variant_grams: u64,
    #[serde(rename = "Variant Inventory Tracker")]
    pub variant_inventory_tracker: &'static str,
    #[serde(rename = "Variant Inventory Qty")]
    pub variant_inventory_qty: u32,
    #[serde(rename = "Variant Inventory Policy")]
    pub variant_inventory_policy: &'static str,
    #[serde(rename = "Variant Fulfillment Service")]
    pub variant_fulfillment_service: &'static str,
    #[serde(rename = "Variant Price")]
    pub variant_price: Money,
    #[serde(rename = "Cost per item")]
    pub cost_per_item: Money,
    #[serde(rename = "Variant Requires Shipping")]
    pub variant_requires_shipping: bool,
    #[serde(rename = "Variant Taxable")]
    pub variant_taxable: bool,
    #[serde(rename = "Status")]
    pub status: &'static str,
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

impl CatalogRow {
    pub fn from_record(record: &Record, settings: &CatalogSettings) -> Self {
        let mut tags = record.tier().catalog_tag().to_string();
        if !record.tags().is_empty() {
            tags.push(',');
            tags.push_str(&record.tags().join());
        }

        Self {
            handle: record.sku().to_string(),
            title: record.description().to_string(),
            body_html: format!(
                "<p>Tier {}. Size: {}. Measurements: {}. All sales final.</p>",
                record.tier(),
                or_na(record.size()),
                or_na(record.measurements()),
            ),
            vendor: settings.vendor.clone(),
            product_category: settings.product_category.clone(),
            tags,
            published: false,
            option1_name: "Title",
            option1_value: "Default Title",
            variant_sku: record.sku().to_string(),
            variant_grams: record.weight_g().round() as u64,
            variant_inventory_tracker: "shopify",
            variant_inventory_qty: 1,
            variant_inventory_policy: "deny",
            variant_fulfillment_service: "manual",
            variant_price: record.price_cad(),
            cost_per_item: record.cost_cad(),
            variant_requires_shipping: true,
            variant_taxable: true,
            status: "draft",
        }
    }
}

/// Build marketplace rows for every unsold record passing `filter`, in table order.
pub fn export_catalog(
    table: &InventoryTable,
    filter: &ExportFilter,
    settings: &CatalogSettings,
) -> Vec<CatalogRow> {
    table
        .iter()
        .filter(|r| filter.matches(r))
        .map(|r| CatalogRow::from_record(r, settings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingPolicy;
    use crate::record::{TagSet, Tier};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sku(s: &str) -> Sku {
        Sku::new(s).unwrap()
    }

    fn record(s: &str, tier: Tier, added: &str, sold: bool) -> Record {
        Record::new(sku(s), 412.6, format!("Item {s}"), tier, Money::from_cents(500), Money::from_cents(163))
            .unwrap()
            .with_date_added(Some(day(added)))
            .with_sold(sold)
    }

    fn table(records: Vec<Record>) -> InventoryTable {
        InventoryTable::from_records("t", PricingPolicy::default(), records).unwrap()
    }

    #[test]
    fn row_carries_marketplace_constants() {
        let r = record("A1", Tier::Three, "2024-01-01", false)
            .with_size("M")
            .with_measurements("20x28")
            .with_tags(TagSet::parse("tshirt,casual"));
        let row = CatalogRow::from_record(&r, &CatalogSettings::default());

        assert_eq!(row.handle, "A1");
        assert_eq!(row.title, "Item A1");
        assert_eq!(
            row.body_html,
            "<p>Tier 3. Size: M. Measurements: 20x28. All sales final.</p>"
        );
        assert_eq!(row.tags, "tier3,tshirt,casual");
        assert_eq!(row.vendor, "Your Thrift Arbitrage");
        assert_eq!(row.variant_grams, 413);
        assert_eq!(row.variant_price, Money::from_cents(500));
        assert_eq!(row.cost_per_item, Money::from_cents(163));
        assert!(!row.published);
        assert_eq!(row.status, "draft");
    }

    #[test]
    fn bundle_rows_use_bundle_tag_and_na_placeholders() {
        let r = record("B1", Tier::Bundle, "2024-01-01", false);
        let row = CatalogRow::from_record(&r, &CatalogSettings::default());
        assert_eq!(row.tags, "Bundle");
        assert_eq!(
            row.body_html,
            "<p>Tier Bundle. Size: N/A. Measurements: N/A. All sales final.</p>"
        );
    }

    #[test]
    fn export_never_includes_sold_records() {
        let t = table(vec![
            record("A", Tier::One, "2024-01-01", false),
            record("B", Tier::Two, "2024-01-01", true),
        ]);

        let rows = export_catalog(&t, &ExportFilter::default(), &CatalogSettings::default());
        let handles: Vec<_> = rows.iter().map(|r| r.handle.as_str()).collect();
        assert_eq!(handles, vec!["A"]);

        // Even when the sold sku is requested explicitly.
        let filter = ExportFilter {
            skus: Some([sku("B")].into_iter().collect()),
            ..ExportFilter::default()
        };
        assert!(export_catalog(&t, &filter, &CatalogSettings::default()).is_empty());
    }

    #[test]
    fn filters_combine_with_and() {
        let t = table(vec![
            record("A", Tier::One, "2024-01-01", false),
            record("B", Tier::Two, "2024-03-01", false),
            record("C", Tier::Three, "2024-03-05", false),
        ]);

        let filter = ExportFilter {
            skus: Some([sku("A"), sku("B")].into_iter().collect()),
            added_on_or_after: Some(day("2024-02-01")),
        };
        let rows = export_catalog(&t, &filter, &CatalogSettings::default());
        let handles: Vec<_> = rows.iter().map(|r| r.handle.as_str()).collect();
        assert_eq!(handles, vec!["B"]);

        let since_only = ExportFilter {
            added_on_or_after: Some(day("2024-03-01")),
            ..ExportFilter::default()
        };
        assert_eq!(export_catalog(&t, &since_only, &CatalogSettings::default()).len(), 2);
    }

    #[test]
    fn settings_override_vendor_and_category() {
        let settings = CatalogSettings {
            vendor: "Back Room Finds".to_string(),
            product_category: "Apparel & Accessories".to_string(),
        };
        let row = CatalogRow::from_record(&record("A", Tier::One, "2024-01-01", false), &settings);
        assert_eq!(row.vendor, "Back Room Finds");
        assert_eq!(row.product_category, "Apparel & Accessories");
    }
}
