//! Interactive menu over a line-oriented input.
//!
//! Input errors and domain errors are printed and the menu comes back; only
//! I/O failures on the terminal itself end the session.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::Utc;

use thriftstock_infra::{InventoryStore, write_catalog, write_slow_movers};
use thriftstock_inventory::{ExportFilter, Tier};

use crate::app::{App, NewItem};
use crate::commands::report;
use crate::render;

const MENU: &str = "\
Actions:
  1) View inventory
  2) Add item
  3) Mark sold
  4) Slow movers report
  5) Create bundle
  6) Export marketplace CSV
  q) Quit";

const DEFAULT_EXPORT_FILE: &str = "shopify_import.csv";

pub struct Session<'a, R, W, S> {
    input: R,
    out: &'a mut W,
    app: &'a mut App<S>,
}

impl<'a, R: BufRead, W: Write, S: InventoryStore> Session<'a, R, W, S> {
    pub fn new(input: R, out: &'a mut W, app: &'a mut App<S>) -> Self {
        Self { input, out, app }
    }

    pub fn run(mut self) -> io::Result<()> {
        loop {
            writeln!(self.out, "\n{MENU}")?;
            let Some(choice) = self.prompt("Choose action")? else {
                return Ok(());
            };

            let step = match choice.as_str() {
                "1" => self.view(),
                "2" => self.add_item(),
                "3" => self.mark_sold(),
                "4" => self.slow_movers(),
                "5" => self.create_bundle(),
                "6" => self.export(),
                "q" | "Q" | "quit" | "exit" => return Ok(()),
                "" => Ok(Step::Continue),
                other => {
                    writeln!(self.out, "Unknown action: {other}")?;
                    Ok(Step::Continue)
                }
            }?;

            if step == Step::Eof {
                return Ok(());
            }
        }
    }

    /// Print `label` and read one trimmed line; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{label}: ")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn view(&mut self) -> io::Result<Step> {
        let summary = self.app.summary();
        render::inventory(&mut *self.out, self.app.table(), &summary)?;
        Ok(Step::Continue)
    }

    fn add_item(&mut self) -> io::Result<Step> {
        let Some(sku) = self.prompt("SKU")? else {
            return Ok(Step::Eof);
        };
        let Some(weight) = self.prompt("Weight (grams)")? else {
            return Ok(Step::Eof);
        };
        let Some(description) = self.prompt("Description")? else {
            return Ok(Step::Eof);
        };
        let Some(tier) = self.prompt("Tier (1, 2, 3)")? else {
            return Ok(Step::Eof);
        };
        let Some(size) = self.prompt("Size (optional, e.g. M or 32x34)")? else {
            return Ok(Step::Eof);
        };
        let Some(tags) = self.prompt("Tags (optional, comma-separated)")? else {
            return Ok(Step::Eof);
        };
        let Some(measurements) = self.prompt("Measurements (tier 3 only)")? else {
            return Ok(Step::Eof);
        };
        let Some(pics) = self.prompt("Pic paths (optional, comma-separated)")? else {
            return Ok(Step::Eof);
        };

        let weight_g = match weight.parse::<f64>() {
            Ok(w) => w,
            Err(_) => {
                writeln!(self.out, "error: weight must be a number of grams")?;
                return Ok(Step::Continue);
            }
        };
        let tier = match tier.parse::<Tier>() {
            Ok(t) if t != Tier::Bundle => t,
            _ => {
                writeln!(self.out, "error: tier must be 1, 2 or 3")?;
                return Ok(Step::Continue);
            }
        };

        let item = NewItem {
            sku,
            weight_g,
            description,
            tier,
            size,
            tags,
            measurements,
            pic_paths: split_list(&pics),
        };
        match self.app.add_item(item, Utc::now()) {
            Ok(outcome) => report(&mut *self.out, &outcome)?,
            Err(e) => writeln!(self.out, "error: {e}")?,
        }
        Ok(Step::Continue)
    }

    fn mark_sold(&mut self) -> io::Result<Step> {
        let Some(sku) = self.prompt("SKU to mark sold")? else {
            return Ok(Step::Eof);
        };
        if sku.is_empty() {
            return Ok(Step::Continue);
        }
        match self.app.mark_sold(&sku, Utc::now()) {
            Ok(outcome) => report(&mut *self.out, &outcome)?,
            Err(e) => writeln!(self.out, "error: {e}")?,
        }
        Ok(Step::Continue)
    }

    fn slow_movers(&mut self) -> io::Result<Step> {
        let rows = self.app.slow_movers(None, Utc::now().date_naive());
        render::slow_movers(&mut *self.out, &rows, self.app.slow_mover_days())?;

        let Some(path) = self.prompt("Save report CSV to (blank to skip)")? else {
            return Ok(Step::Eof);
        };
        if !path.is_empty() {
            let path = PathBuf::from(path);
            let written = std::fs::File::create(&path)
                .map_err(thriftstock_infra::PersistenceError::from)
                .and_then(|file| write_slow_movers(io::BufWriter::new(file), &rows));
            match written {
                Ok(()) => writeln!(self.out, "Report written to {}", path.display())?,
                Err(e) => writeln!(self.out, "error: {e}")?,
            }
        }
        Ok(Step::Continue)
    }

    fn create_bundle(&mut self) -> io::Result<Step> {
        let Some(bundle_sku) = self.prompt("Bundle SKU")? else {
            return Ok(Step::Eof);
        };
        let Some(items) = self.prompt("Item SKUs (comma-separated)")? else {
            return Ok(Step::Eof);
        };
        let Some(description) = self.prompt("Bundle description")? else {
            return Ok(Step::Eof);
        };
        if bundle_sku.is_empty() || items.is_empty() {
            writeln!(self.out, "error: bundle sku and item skus are required")?;
            return Ok(Step::Continue);
        }

        match self
            .app
            .create_bundle(&bundle_sku, split_list(&items), &description, Utc::now())
        {
            Ok(outcome) => report(&mut *self.out, &outcome)?,
            Err(e) => writeln!(self.out, "error: {e}")?,
        }
        Ok(Step::Continue)
    }

    fn export(&mut self) -> io::Result<Step> {
        let Some(path) = self.prompt(&format!("Export to [{DEFAULT_EXPORT_FILE}]"))? else {
            return Ok(Step::Eof);
        };
        let path = if path.is_empty() {
            PathBuf::from(DEFAULT_EXPORT_FILE)
        } else {
            PathBuf::from(path)
        };

        let rows = self.app.export(&ExportFilter::default());
        let written = std::fs::File::create(&path)
            .map_err(thriftstock_infra::PersistenceError::from)
            .and_then(|file| write_catalog(io::BufWriter::new(file), &rows));
        match written {
            Ok(()) => writeln!(
                self.out,
                "Exported {} draft products to {}",
                rows.len(),
                path.display()
            )?,
            Err(e) => writeln!(self.out, "error: {e}")?,
        }
        Ok(Step::Continue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Eof,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{MemoryStore, app};

    fn run_script(app: &mut App<MemoryStore>, script: &str) -> String {
        let mut out = Vec::new();
        Session::new(script.as_bytes(), &mut out, app).run().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn quits_on_eof_and_on_q() {
        let mut app = app(MemoryStore::default());
        let text = run_script(&mut app, "");
        assert!(text.contains("Actions:"));

        let text = run_script(&mut app, "q\n1\n");
        assert!(!text.contains("Inventory is empty."));
    }

    #[test]
    fn add_then_view_then_sell() {
        let mut app = app(MemoryStore::default());
        let script = "2\nA1\n500\nDenim jacket\n2\nL\ndenim\n\n\n1\n3\nA1\n3\nA1\nq\n";
        let text = run_script(&mut app, script);

        assert!(text.contains("Item added! 500g (1.10lb, $6.06 CAD, Cost $1.97 CAD)"));
        assert!(text.contains("Denim jacket"));
        assert!(text.contains("Total Retail Value (Unsold): $6.06 CAD"));
        assert!(text.contains("Marked A1 as sold!"));
        assert!(text.contains("A1 was already sold."));
        assert!(app.table().iter().all(|r| r.is_sold()));
    }

    #[test]
    fn bad_input_returns_to_menu() {
        let mut app = app(MemoryStore::default());
        let script = "2\nA1\nheavy\nx\n1\n\n\n\n\n\
                      2\nA2\n100\nx\n7\n\n\n\n\n\
                      3\nNOPE\n\
                      9\nq\n";
        let text = run_script(&mut app, script);

        assert!(text.contains("error: weight must be a number of grams"));
        assert!(text.contains("error: tier must be 1, 2 or 3"));
        assert!(text.contains("error: sku not found: NOPE"));
        assert!(text.contains("Unknown action: 9"));
        assert!(app.table().is_empty());
    }

    #[test]
    fn bundle_failure_is_printed() {
        let mut app = app(MemoryStore::default());
        let script = "5\nBND\nA,B\nPair\nq\n";
        let text = run_script(&mut app, script);
        assert!(text.contains("error: bundle rejected:"));
        assert!(app.table().is_empty());
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(" a.jpg, ,b.jpg,"), vec!["a.jpg", "b.jpg"]);
        assert!(split_list("").is_empty());
    }
}
