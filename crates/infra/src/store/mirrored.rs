use thriftstock_inventory::InventoryTable;

use super::csv_file::CsvFileStore;
use super::github::GitHubMirror;
use super::r#trait::{InventoryStore, PersistenceError};

/// Local CSV file with an optional remote copy.
///
/// Loads always come from the local file. Saves write the local file first;
/// a mirror failure is reported after the local write has already succeeded.
#[derive(Debug)]
pub struct MirroredStore {
    local: CsvFileStore,
    mirror: Option<GitHubMirror>,
}

impl MirroredStore {
    pub fn new(local: CsvFileStore, mirror: Option<GitHubMirror>) -> Self {
        Self { local, mirror }
    }

    pub fn local_only(local: CsvFileStore) -> Self {
        Self::new(local, None)
    }

    pub fn local(&self) -> &CsvFileStore {
        &self.local
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirror.is_some()
    }
}

impl InventoryStore for MirroredStore {
    fn load(&self) -> Result<InventoryTable, PersistenceError> {
        self.local.load()
    }

    fn save(&self, table: &InventoryTable) -> Result<(), PersistenceError> {
        let bytes = self.local.encode(table)?;
        self.local.write_bytes(&bytes)?;
        tracing::info!(
            path = %self.local.path().display(),
            records = table.len(),
            "inventory saved"
        );

        let Some(mirror) = &self.mirror else {
            return Ok(());
        };

        match mirror.push(&bytes) {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    repo = %mirror.target().repo,
                    error = %e,
                    "remote mirror failed; local copy is current"
                );
                Err(e)
            }
        }
    }
}
