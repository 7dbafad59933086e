//! Plain-text rendering for the terminal.

use std::io::{self, Write};

use thriftstock_inventory::{InventorySummary, InventoryTable, SlowMover};

const DESCRIPTION_WIDTH: usize = 32;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}

pub fn inventory<W: Write>(
    out: &mut W,
    table: &InventoryTable,
    summary: &InventorySummary,
) -> io::Result<()> {
    if table.is_empty() {
        writeln!(out, "Inventory is empty.")?;
    } else {
        writeln!(
            out,
            "{:<12} {:<32} {:<6} {:<8} {:>8} {:>7} {:>8} {:>8} {:<10} {:<4}",
            "SKU", "Description", "Tier", "Size", "Grams", "Lb", "Price", "Cost", "Added", "Sold"
        )?;
        for r in table.iter() {
            writeln!(
                out,
                "{:<12} {:<32} {:<6} {:<8} {:>8.0} {:>7.2} {:>8} {:>8} {:<10} {:<4}",
                r.sku().as_str(),
                clip(r.description(), DESCRIPTION_WIDTH),
                r.tier().as_str(),
                clip(r.size(), 8),
                r.weight_g(),
                r.weight_lb(),
                r.price_cad().to_string(),
                r.cost_cad().to_string(),
                r.date_added().map(|d| d.to_string()).unwrap_or_default(),
                if r.is_sold() { "yes" } else { "no" },
            )?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} records, {} unsold",
        summary.records, summary.unsold
    )?;
    writeln!(out, "Total Retail Value (Unsold): ${} CAD", summary.retail_value)?;
    writeln!(out, "Total Cost (Unsold): ${} CAD", summary.cost_value)
}

pub fn slow_movers<W: Write>(out: &mut W, rows: &[SlowMover], days: u32) -> io::Result<()> {
    writeln!(out, "Slow movers ({days}+ days unsold)")?;
    if rows.is_empty() {
        return writeln!(out, "None.");
    }

    writeln!(
        out,
        "{:<12} {:<32} {:<6} {:>8} {:<10} {}",
        "SKU", "Description", "Tier", "Price", "Added", "Action"
    )?;
    for m in rows {
        writeln!(
            out,
            "{:<12} {:<32} {:<6} {:>8} {:<10} {}",
            m.sku.as_str(),
            clip(&m.description, DESCRIPTION_WIDTH),
            m.tier.as_str(),
            m.price_cad.to_string(),
            m.date_added.to_string(),
            m.recommended_action,
        )?;
    }
    Ok(())
}
