//! CSV writers for the marketplace export and the slow-movers report.
//!
//! The header row is always written, so an empty export is still a valid
//! import file.

use std::io::Write;

use serde::Serialize;

use thriftstock_inventory::{CatalogRow, SlowMover};

use crate::store::PersistenceError;

pub const CATALOG_COLUMNS: [&str; 20] = [
    "Handle",
    "Title",
    "Body (HTML)",
    "Vendor",
    "Product Category",
    "Tags",
    "Published",
    "Option1 Name",
    "Option1 Value",
    "Variant SKU",
    "Variant Grams",
    "Variant Inventory Tracker",
    "Variant Inventory Qty",
    "Variant Inventory Policy",
    "Variant Fulfillment Service",
    "Variant Price",
    "Cost per item",
    "Variant Requires Shipping",
    "Variant Taxable",
    "Status",
];

pub const SLOW_MOVER_COLUMNS: [&str; 11] = [
    "SKU",
    "Description",
    "Tier",
    "Size",
    "Tags",
    "Weight_g",
    "Weight_lb",
    "Price_CAD",
    "Cost_CAD",
    "Date_Added",
    "Action",
];

pub fn write_catalog<W: Write>(out: W, rows: &[CatalogRow]) -> Result<(), PersistenceError> {
    write_rows(out, &CATALOG_COLUMNS, rows)
}

pub fn write_slow_movers<W: Write>(out: W, rows: &[SlowMover]) -> Result<(), PersistenceError> {
    write_rows(out, &SLOW_MOVER_COLUMNS, rows)
}

fn write_rows<W: Write, T: Serialize>(
    out: W,
    header: &[&str],
    rows: &[T],
) -> Result<(), PersistenceError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
