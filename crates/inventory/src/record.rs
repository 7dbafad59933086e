use chrono::NaiveDate;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use thriftstock_core::{DomainError, Entity, Sku, ValueObject};

use crate::pricing::{Money, grams_to_pounds};

/// Pricing category of an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tier {
    One,
    Two,
    Three,
    /// Synthetic tier for records that aggregate several items.
    Bundle,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::One => "1",
            Tier::Two => "2",
            Tier::Three => "3",
            Tier::Bundle => "Bundle",
        }
    }

    /// Marketplace tag for the tier (`tier1`, `tier2`, `tier3` or `Bundle`).
    pub fn catalog_tag(&self) -> &'static str {
        match self {
            Tier::One => "tier1",
            Tier::Two => "tier2",
            Tier::Three => "tier3",
            Tier::Bundle => "Bundle",
        }
    }
}

impl core::fmt::Display for Tier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = DomainError;

    /// Accepts `1`, `2`, `3` (also as `1.0` etc., as spreadsheets tend to
    /// write them) and `Bundle` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("bundle") {
            return Ok(Tier::Bundle);
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n == 1.0 => Ok(Tier::One),
            Ok(n) if n == 2.0 => Ok(Tier::Two),
            Ok(n) if n == 3.0 => Ok(Tier::Three),
            _ => Err(DomainError::unknown_tier(trimmed)),
        }
    }
}

impl TryFrom<String> for Tier {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tier> for String {
    fn from(value: Tier) -> Self {
        value.as_str().to_string()
    }
}

/// Normalized, insertion-ordered set of tags.
///
/// Tags are trimmed, empty tags are dropped and duplicates are collapsed.
/// The comma-joined form only exists at the storage/export boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TagSet(Vec<String>);

impl ValueObject for TagSet {}

impl TagSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parse a comma-separated tag list.
    pub fn parse(raw: &str) -> Self {
        let mut set = Self::new();
        for tag in raw.split(',') {
            set.insert(tag);
        }
        set
    }

    /// Insert a tag; returns `false` if it was blank or already present.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Add every tag of `other` not already present, keeping order.
    pub fn extend_from(&mut self, other: &TagSet) {
        for tag in other.iter() {
            self.insert(tag);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self) -> String {
        self.0.join(",")
    }
}

impl core::fmt::Display for TagSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.join())
    }
}

impl From<String> for TagSet {
    fn from(value: String) -> Self {
        TagSet::parse(&value)
    }
}

impl From<TagSet> for String {
    fn from(value: TagSet) -> Self {
        value.join()
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// One physical item (or bundle) in the inventory.
///
/// `weight_lb` is never stored: it is derived from `weight_g` on every read.
/// `sold` can only move from `false` to `true` once the record is in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    sku: Sku,
    weight_g: f64,
    description: String,
    tier: Tier,
    size: String,
    measurements: String,
    tags: TagSet,
    pic_paths: Vec<String>,
    price_cad: Money,
    cost_cad: Money,
    date_added: Option<NaiveDate>,
    sold: bool,
}

impl Record {
    /// Build an unsold record. Optional metadata is attached with the `with_*`
    /// methods.
    pub fn new(
        sku: Sku,
        weight_g: f64,
        description: impl Into<String>,
        tier: Tier,
        price_cad: Money,
        cost_cad: Money,
    ) -> Result<Self, DomainError> {
        validate_weight(weight_g)?;
        Ok(Self {
            sku,
            weight_g,
            description: description.into(),
            tier,
            size: String::new(),
            measurements: String::new(),
            tags: TagSet::new(),
            pic_paths: Vec::new(),
            price_cad,
            cost_cad,
            date_added: None,
            sold: false,
        })
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into().trim().to_string();
        self
    }

    pub fn with_measurements(mut self, measurements: impl Into<String>) -> Self {
        self.measurements = measurements.into().trim().to_string();
        self
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_pic_paths(mut self, pic_paths: Vec<String>) -> Self {
        self.pic_paths = pic_paths;
        self
    }

    pub fn with_date_added(mut self, date: Option<NaiveDate>) -> Self {
        self.date_added = date;
        self
    }

    /// Restore the sold flag of a record read back from storage.
    pub fn with_sold(mut self, sold: bool) -> Self {
        self.sold = sold;
        self
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn weight_g(&self) -> f64 {
        self.weight_g
    }

    pub fn weight_lb(&self) -> f64 {
        grams_to_pounds(self.weight_g)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn measurements(&self) -> &str {
        &self.measurements
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn pic_paths(&self) -> &[String] {
        &self.pic_paths
    }

    pub fn price_cad(&self) -> Money {
        self.price_cad
    }

    pub fn cost_cad(&self) -> Money {
        self.cost_cad
    }

    pub fn date_added(&self) -> Option<NaiveDate> {
        self.date_added
    }

    pub fn is_sold(&self) -> bool {
        self.sold
    }

    pub fn is_bundle(&self) -> bool {
        self.tier == Tier::Bundle
    }

    /// Mark the record sold. Idempotent.
    pub fn mark_sold(&mut self) {
        self.sold = true;
    }
}

impl Entity for Record {
    type Id = Sku;

    fn id(&self) -> &Self::Id {
        &self.sku
    }
}

/// Heaviest single item accepted, in grams.
pub const MAX_WEIGHT_G: f64 = 1_000_000.0;

pub(crate) fn validate_weight(weight_g: f64) -> Result<(), DomainError> {
    if !weight_g.is_finite() || weight_g <= 0.0 {
        return Err(DomainError::validation(format!(
            "weight must be a positive number of grams (got {weight_g})"
        )));
    }
    if weight_g > MAX_WEIGHT_G {
        return Err(DomainError::validation(format!(
            "weight must be at most {MAX_WEIGHT_G} grams (got {weight_g})"
        )));
    }
    Ok(())
}
