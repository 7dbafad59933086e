use thiserror::Error;

use thriftstock_inventory::InventoryTable;

/// Persistence operation error.
///
/// These are **infrastructure errors** (filesystem, CSV encoding, remote API)
/// as opposed to domain errors (validation, missing skus). A failed save does
/// not roll back the caller's in-memory table; the next successful save
/// supersedes it.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote store rejected the request ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("async runtime unavailable: {0}")]
    Runtime(String),
}

/// Load/save contract between the application and durable storage.
///
/// `save` overwrites everything previously stored (last writer wins).
pub trait InventoryStore {
    /// Read the full table. A store with no prior data yields an empty table.
    fn load(&self) -> Result<InventoryTable, PersistenceError>;

    /// Replace the stored table with `table`.
    fn save(&self, table: &InventoryTable) -> Result<(), PersistenceError>;
}
