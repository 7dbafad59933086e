//! Local CSV file store.
//!
//! The file keeps one row per record with a fixed column order. Columns that
//! are missing from an older or hand-edited file are synthesized on load
//! (`Sold` defaults to false, everything else to empty). Rows that cannot
//! form a valid record, or repeat an earlier sku, are left out of the table
//! with a warning but are held back by the store and written again after the
//! table's rows on every save, so nothing in the file is ever dropped.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use thriftstock_core::Sku;
use thriftstock_inventory::{InventoryTable, Money, PricingPolicy, Record, TagSet, Tier};

use super::r#trait::{InventoryStore, PersistenceError};

/// Column order of the inventory file.
pub const CANONICAL_COLUMNS: [&str; 13] = [
    "SKU",
    "Weight_g",
    "Weight_lb",
    "Description",
    "Tier",
    "Size",
    "Tags",
    "Measurements",
    "Pic_Paths",
    "Price_CAD",
    "Cost_CAD",
    "Date_Added",
    "Sold",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// CSV-backed inventory store.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
    pricing: PricingPolicy,
    /// Rows from the last decode that did not make it into the table, in
    /// canonical column order.
    held_back: Arc<Mutex<Vec<Vec<String>>>>,
}

impl CsvFileStore {
    /// `pricing` backs empty price/cost cells on load and prices new records in
    /// the loaded table.
    pub fn new(path: impl Into<PathBuf>, pricing: PricingPolicy) -> Self {
        Self {
            path: path.into(),
            pricing,
            held_back: Arc::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows held back by the last load.
    pub fn held_back_rows(&self) -> usize {
        self.held_back().len()
    }

    fn held_back(&self) -> MutexGuard<'_, Vec<Vec<String>>> {
        self.held_back.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn table_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| thriftstock_inventory::table::DEFAULT_TABLE_NAME.to_string())
    }

    /// Parse a table from CSV bytes.
    pub fn decode<R: Read>(&self, reader: R) -> Result<InventoryTable, PersistenceError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let positions: HashMap<&'static str, usize> = CANONICAL_COLUMNS
            .iter()
            .filter_map(|col| headers.iter().position(|h| h == *col).map(|i| (*col, i)))
            .collect();
        for col in CANONICAL_COLUMNS.iter().filter(|c| !positions.contains_key(*c)) {
            tracing::debug!(column = col, "synthesizing missing column");
        }

        let mut table = InventoryTable::named(self.table_name(), self.pricing.clone());
        let mut held_back = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            // Header is line 1.
            let line = i + 2;
            let row = Row {
                positions: &positions,
                record: &record,
            };

            let appended = self
                .parse_row(&row)
                .and_then(|parsed| table.append(parsed).map_err(|e| e.to_string()));
            if let Err(reason) = appended {
                tracing::warn!(line, %reason, "inventory row held back; it stays in the file");
                held_back.push(row.canonical());
            }
        }

        *self.held_back() = held_back;
        Ok(table)
    }

    fn parse_row(&self, row: &Row<'_>) -> Result<Record, String> {
        let sku = Sku::new(row.get("SKU")).map_err(|e| e.to_string())?;
        let weight_g: f64 = row
            .get("Weight_g")
            .trim()
            .parse()
            .map_err(|_| format!("{sku}: invalid weight {:?}", row.get("Weight_g")))?;
        let tier: Tier = row.get("Tier").parse().map_err(|e| format!("{sku}: {e}"))?;

        let price = parse_money(row.get("Price_CAD"));
        let cost = parse_money(row.get("Cost_CAD"));
        let (price, cost) = match (price, cost) {
            (Some(price), Some(cost)) => (price, cost),
            (price, cost) => {
                let quote = self
                    .pricing
                    .quote(weight_g, tier)
                    .map_err(|e| format!("{sku}: {e}"))?;
                (price.unwrap_or(quote.price), cost.unwrap_or(quote.cost))
            }
        };

        let record = Record::new(sku, weight_g, row.get("Description"), tier, price, cost)
            .map_err(|e| e.to_string())?
            .with_size(row.get("Size"))
            .with_measurements(row.get("Measurements"))
            .with_tags(TagSet::parse(row.get("Tags")))
            .with_pic_paths(split_list(row.get("Pic_Paths")))
            .with_date_added(parse_date(row.get("Date_Added")))
            .with_sold(parse_bool(row.get("Sold")));
        Ok(record)
    }

    /// Serialize a table to CSV bytes in canonical column order, followed by
    /// any rows held back by the last load.
    pub fn encode(&self, table: &InventoryTable) -> Result<Vec<u8>, PersistenceError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(CANONICAL_COLUMNS)?;
        for r in table.iter() {
            wtr.write_record([
                r.sku().to_string(),
                r.weight_g().to_string(),
                r.weight_lb().to_string(),
                r.description().to_string(),
                r.tier().to_string(),
                r.size().to_string(),
                r.tags().join(),
                r.measurements().to_string(),
                r.pic_paths().join(","),
                r.price_cad().to_string(),
                r.cost_cad().to_string(),
                r.date_added()
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                if r.is_sold() { "True" } else { "False" }.to_string(),
            ])?;
        }
        for row in self.held_back().iter() {
            wtr.write_record(row)?;
        }
        wtr.into_inner()
            .map_err(|e| PersistenceError::Io(e.into_error()))
    }

    /// Write already-encoded bytes to the file, creating parent directories.
    pub(crate) fn write_bytes(&self, bytes: &[u8]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl InventoryStore for CsvFileStore {
    fn load(&self) -> Result<InventoryTable, PersistenceError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no inventory file yet; starting empty");
            self.held_back().clear();
            return Ok(InventoryTable::named(self.table_name(), self.pricing.clone()));
        }

        let file = std::fs::File::open(&self.path)?;
        let table = self.decode(file)?;
        tracing::info!(path = %self.path.display(), records = table.len(), "inventory loaded");
        let held_back = self.held_back_rows();
        if held_back > 0 {
            tracing::warn!(
                path = %self.path.display(),
                rows = held_back,
                "some rows could not be loaded; they are kept in the file unchanged"
            );
        }
        Ok(table)
    }

    fn save(&self, table: &InventoryTable) -> Result<(), PersistenceError> {
        let bytes = self.encode(table)?;
        self.write_bytes(&bytes)?;
        tracing::info!(path = %self.path.display(), records = table.len(), "inventory saved");
        Ok(())
    }
}

/// One CSV row addressed by canonical column name; absent columns read as empty.
struct Row<'a> {
    positions: &'a HashMap<&'static str, usize>,
    record: &'a csv::StringRecord,
}

impl<'a> Row<'a> {
    fn get(&self, column: &str) -> &'a str {
        self.positions
            .get(column)
            .and_then(|&idx| self.record.get(idx))
            .unwrap_or("")
    }

    /// The row's cells in canonical column order.
    fn canonical(&self) -> Vec<String> {
        CANONICAL_COLUMNS
            .iter()
            .map(|col| self.get(col).to_string())
            .collect()
    }
}

fn parse_money(raw: &str) -> Option<Money> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}

/// Accepts plain dates, date-times and RFC 3339 timestamps.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "1.0"
    )
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
