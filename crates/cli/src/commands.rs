//! Command-line surface and one-shot command execution.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

use thriftstock_core::{DomainError, Sku};
use thriftstock_infra::{AppConfig, InventoryStore, write_catalog, write_slow_movers};
use thriftstock_inventory::{ExportFilter, Tier};

use crate::app::{App, NewItem, Outcome};
use crate::render;
use crate::session::Session;

#[derive(Debug, Parser)]
#[command(name = "thriftstock")]
#[command(version, about = "Weight-priced inventory for a thrift resale shop", long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/thriftstock/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Inventory CSV, overriding config and THRIFTSTOCK_DATA
    #[arg(long, global = true, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Save locally only, even if a GitHub mirror is configured
    #[arg(long, global = true)]
    pub no_mirror: bool,

    /// Defaults to `interactive`
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply flag overrides on top of file and environment configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(data) = &self.data {
            config.data.path = data.clone();
        }
        if self.no_mirror {
            config.remote.enabled = false;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// List every record with unsold totals
    View,
    /// Add a new item priced from its weight and tier
    Add(AddArgs),
    /// Mark an item as sold
    Sold {
        sku: String,
    },
    /// Unsold items older than the threshold
    SlowMovers {
        /// Age threshold in days (default from config, 60)
        #[arg(long)]
        days: Option<u32>,
        /// Also write the report as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },
    /// Combine unsold items into one bundle record
    Bundle {
        #[arg(long)]
        sku: String,
        /// Comma-separated item skus
        #[arg(long, value_delimiter = ',', required = true)]
        items: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Write the marketplace (Shopify) import CSV
    Export {
        /// Output file (default: stdout)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
        /// Only these skus (repeatable)
        #[arg(long = "sku", value_name = "SKU")]
        skus: Vec<String>,
        /// Only items added on or after this date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        since: Option<NaiveDate>,
    },
    /// Menu-driven session over stdin
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub sku: String,
    #[arg(long)]
    pub weight_g: f64,
    #[arg(long)]
    pub description: String,
    /// 1, 2 or 3
    #[arg(long)]
    pub tier: Tier,
    #[arg(long, default_value = "")]
    pub size: String,
    /// Comma-separated tags
    #[arg(long, default_value = "")]
    pub tags: String,
    /// Kept for tier 3 only
    #[arg(long, default_value = "")]
    pub measurements: String,
    /// Comma-separated picture paths
    #[arg(long, value_delimiter = ',')]
    pub pics: Vec<String>,
}

/// Bundles are only made by `bundle`, never added directly.
impl TryFrom<AddArgs> for NewItem {
    type Error = DomainError;

    fn try_from(args: AddArgs) -> Result<Self, Self::Error> {
        if args.tier == Tier::Bundle {
            return Err(DomainError::validation(
                "tier must be 1, 2 or 3; use the bundle command for bundles",
            ));
        }
        Ok(Self {
            sku: args.sku,
            weight_g: args.weight_g,
            description: args.description,
            tier: args.tier,
            size: args.size,
            tags: args.tags,
            measurements: args.measurements,
            pic_paths: args.pics,
        })
    }
}

/// Build an export filter from raw sku arguments and an optional date.
pub fn export_filter(skus: &[String], since: Option<NaiveDate>) -> anyhow::Result<ExportFilter> {
    let skus = if skus.is_empty() {
        None
    } else {
        let set = skus
            .iter()
            .map(Sku::new)
            .collect::<Result<BTreeSet<_>, _>>()
            .context("invalid --sku")?;
        Some(set)
    };
    Ok(ExportFilter {
        skus,
        added_on_or_after: since,
    })
}

/// Print an action's message; a failed save is a warning, not an error.
pub fn report<W: Write>(out: &mut W, outcome: &Outcome) -> io::Result<()> {
    writeln!(out, "{}", outcome.message)?;
    if let Some(e) = &outcome.save_error {
        writeln!(out, "warning: change kept in memory but not saved: {e}")?;
    }
    Ok(())
}

fn create_file(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Run a single command against `app`, writing user-facing output to `out`.
pub fn execute<S: InventoryStore, W: Write>(
    command: Command,
    app: &mut App<S>,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Command::View => {
            render::inventory(out, app.table(), &app.summary())?;
        }
        Command::Add(args) => {
            let outcome = app.add_item(args.try_into()?, Utc::now())?;
            report(out, &outcome)?;
        }
        Command::Sold { sku } => {
            let outcome = app.mark_sold(&sku, Utc::now())?;
            report(out, &outcome)?;
        }
        Command::SlowMovers { days, csv } => {
            let today = Utc::now().date_naive();
            let rows = app.slow_movers(days, today);
            render::slow_movers(out, &rows, days.unwrap_or(app.slow_mover_days()))?;
            if let Some(path) = csv {
                write_slow_movers(create_file(&path)?, &rows)
                    .with_context(|| format!("writing {}", path.display()))?;
                writeln!(out, "Report written to {}", path.display())?;
            }
        }
        Command::Bundle {
            sku,
            items,
            description,
        } => {
            let outcome = app.create_bundle(&sku, items, &description, Utc::now())?;
            report(out, &outcome)?;
        }
        Command::Export { out: path, skus, since } => {
            let rows = app.export(&export_filter(&skus, since)?);
            match path {
                Some(path) => {
                    write_catalog(create_file(&path)?, &rows)
                        .with_context(|| format!("writing {}", path.display()))?;
                    writeln!(out, "Exported {} items to {}", rows.len(), path.display())?;
                }
                None => write_catalog(&mut *out, &rows)?,
            }
        }
        Command::Interactive => {
            let stdin = io::stdin();
            Session::new(stdin.lock(), out, app).run()?;
        }
    }
    Ok(())
}
