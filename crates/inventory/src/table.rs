use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thriftstock_core::{Aggregate, AggregateRoot, DomainError, DomainResult, Event, Sku};

use crate::pricing::PricingPolicy;
use crate::record::{Record, TagSet, Tier, validate_weight};

/// Name used for a table that was not loaded from a named store.
pub const DEFAULT_TABLE_NAME: &str = "inventory";

/// Aggregate root: the inventory table.
///
/// Ordered collection of records keyed by sku. The table is the only owner of
/// records; operations hand out references or clones, never shared handles.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryTable {
    name: String,
    pricing: PricingPolicy,
    records: Vec<Record>,
    index: HashMap<Sku, usize>,
    version: u64,
}

impl InventoryTable {
    /// Create an empty table priced with `pricing`.
    pub fn new(pricing: PricingPolicy) -> Self {
        Self::named(DEFAULT_TABLE_NAME, pricing)
    }

    pub fn named(name: impl Into<String>, pricing: PricingPolicy) -> Self {
        Self {
            name: name.into(),
            pricing,
            records: Vec::new(),
            index: HashMap::new(),
            version: 0,
        }
    }

    /// Build a table from stored records, rejecting duplicate skus.
    pub fn from_records(
        name: impl Into<String>,
        pricing: PricingPolicy,
        records: impl IntoIterator<Item = Record>,
    ) -> DomainResult<Self> {
        let mut table = Self::named(name, pricing);
        for record in records {
            table.append(record)?;
        }
        Ok(table)
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn contains(&self, sku: &Sku) -> bool {
        self.index.contains_key(sku)
    }

    /// Append a record at the end of the table.
    pub fn append(&mut self, record: Record) -> DomainResult<()> {
        if self.index.contains_key(record.sku()) {
            return Err(DomainError::duplicate_sku(record.sku().as_str()));
        }
        self.index.insert(record.sku().clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub fn find_by_sku(&self, sku: &Sku) -> Option<&Record> {
        self.index.get(sku).map(|&i| &self.records[i])
    }

    /// Records matching `predicate`, in table order.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&Record>
    where
        P: FnMut(&Record) -> bool,
    {
        self.records.iter().filter(|r| predicate(r)).collect()
    }

    /// Apply `mutation` to every record matching `predicate`.
    ///
    /// Returns how many records were touched.
    pub fn update_where<P, M>(&mut self, mut predicate: P, mut mutation: M) -> usize
    where
        P: FnMut(&Record) -> bool,
        M: FnMut(&mut Record),
    {
        let mut touched = 0;
        for record in self.records.iter_mut().filter(|r| predicate(r)) {
            mutation(record);
            touched += 1;
        }
        touched
    }
}

impl AggregateRoot for InventoryTable {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.name
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddItem {
    pub sku: String,
    pub weight_g: f64,
    pub description: String,
    pub tier: Tier,
    pub size: String,
    /// Raw comma-separated tag list as typed by the user.
    pub tags: String,
    /// Only kept for tier 3 items.
    pub measurements: String,
    pub pic_paths: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSold {
    pub sku: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CreateBundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBundle {
    pub bundle_sku: String,
    pub item_skus: Vec<String>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InventoryCommand {
    AddItem(AddItem),
    MarkSold(MarkSold),
    CreateBundle(CreateBundle),
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub record: Record,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSold {
    pub sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BundleCreated. Constituents are marked sold when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleCreated {
    pub bundle: Record,
    pub constituents: Vec<Sku>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemAdded(ItemAdded),
    ItemSold(ItemSold),
    BundleCreated(BundleCreated),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemAdded(_) => "inventory.item.added",
            InventoryEvent::ItemSold(_) => "inventory.item.sold",
            InventoryEvent::BundleCreated(_) => "inventory.bundle.created",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemAdded(e) => e.occurred_at,
            InventoryEvent::ItemSold(e) => e.occurred_at,
            InventoryEvent::BundleCreated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryTable {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemAdded(e) => {
                let appended = self.append(e.record.clone());
                debug_assert!(appended.is_ok(), "ItemAdded for a sku already in the table");
            }
            InventoryEvent::ItemSold(e) => {
                self.update_where(|r| r.sku() == &e.sku, Record::mark_sold);
            }
            InventoryEvent::BundleCreated(e) => {
                let appended = self.append(e.bundle.clone());
                debug_assert!(appended.is_ok(), "BundleCreated for a sku already in the table");
                self.update_where(|r| e.constituents.contains(r.sku()), Record::mark_sold);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::AddItem(cmd) => self.handle_add(cmd),
            InventoryCommand::MarkSold(cmd) => self.handle_mark_sold(cmd),
            InventoryCommand::CreateBundle(cmd) => self.handle_bundle(cmd),
        }
    }
}

impl InventoryTable {
    fn ensure_unused(&self, sku: &Sku) -> Result<(), DomainError> {
        if self.contains(sku) {
            return Err(DomainError::duplicate_sku(sku.as_str()));
        }
        Ok(())
    }

    fn handle_add(&self, cmd: &AddItem) -> Result<Vec<InventoryEvent>, DomainError> {
        let sku = Sku::new(&cmd.sku)?;
        validate_weight(cmd.weight_g)?;
        self.ensure_unused(&sku)?;

        let quote = self.pricing.quote(cmd.weight_g, cmd.tier)?;
        let measurements = if cmd.tier == Tier::Three {
            cmd.measurements.as_str()
        } else {
            ""
        };
        let pic_paths = cmd
            .pic_paths
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        let record = Record::new(
            sku,
            cmd.weight_g,
            cmd.description.trim(),
            cmd.tier,
            quote.price,
            quote.cost,
        )?
        .with_size(cmd.size.as_str())
        .with_measurements(measurements)
        .with_tags(TagSet::parse(&cmd.tags))
        .with_pic_paths(pic_paths)
        .with_date_added(Some(cmd.occurred_at.date_naive()));

        Ok(vec![InventoryEvent::ItemAdded(ItemAdded {
            record,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_sold(&self, cmd: &MarkSold) -> Result<Vec<InventoryEvent>, DomainError> {
        let sku = Sku::new(&cmd.sku)?;
        let record = self
            .find_by_sku(&sku)
            .ok_or_else(|| DomainError::not_found(sku.as_str()))?;

        if record.is_sold() {
            return Ok(Vec::new());
        }

        Ok(vec![InventoryEvent::ItemSold(ItemSold {
            sku,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_bundle(&self, cmd: &CreateBundle) -> Result<Vec<InventoryEvent>, DomainError> {
        let bundle_sku = Sku::new(&cmd.bundle_sku)?;
        self.ensure_unused(&bundle_sku)?;

        let mut requested: Vec<Sku> = Vec::new();
        for raw in &cmd.item_skus {
            if raw.trim().is_empty() {
                continue;
            }
            let sku = Sku::new(raw)?;
            if !requested.contains(&sku) {
                requested.push(sku);
            }
        }
        if requested.is_empty() {
            return Err(DomainError::bundle("no item skus given"));
        }

        let mut missing = Vec::new();
        let mut already_sold = Vec::new();
        let mut items = Vec::with_capacity(requested.len());
        for sku in &requested {
            match self.find_by_sku(sku) {
                None => missing.push(sku.as_str()),
                Some(r) if r.is_sold() => already_sold.push(sku.as_str()),
                Some(r) => items.push(r),
            }
        }
        if !missing.is_empty() || !already_sold.is_empty() {
            let mut reasons = Vec::new();
            if !missing.is_empty() {
                reasons.push(format!("not found: {}", missing.join(", ")));
            }
            if !already_sold.is_empty() {
                reasons.push(format!("already sold: {}", already_sold.join(", ")));
            }
            return Err(DomainError::bundle(reasons.join("; ")));
        }

        let weight_g: f64 = items.iter().map(|r| r.weight_g()).sum();
        let quote = self.pricing.quote(weight_g, Tier::Bundle)?;

        let mut tags = TagSet::new();
        for item in &items {
            tags.extend_from(item.tags());
        }
        tags.insert("Bundle");

        let pic_paths = items
            .iter()
            .flat_map(|r| r.pic_paths().iter().cloned())
            .collect();

        let bundle = Record::new(
            bundle_sku,
            weight_g,
            cmd.description.trim(),
            Tier::Bundle,
            quote.price,
            quote.cost,
        )?
        .with_tags(tags)
        .with_pic_paths(pic_paths)
        .with_date_added(Some(cmd.occurred_at.date_naive()));

        Ok(vec![InventoryEvent::BundleCreated(BundleCreated {
            bundle,
            constituents: requested,
            occurred_at: cmd.occurred_at,
        })])
    }
}
