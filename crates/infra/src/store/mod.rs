//! Persistence adapters for the inventory table.
//!
//! - `trait.rs`: the load/save contract and its error type
//! - `csv_file.rs`: the local CSV file (source of truth for a session)
//! - `github.rs`: optional mirror of the CSV file into a GitHub repository
//! - `mirrored.rs`: local file + mirror composed behind the same contract

pub mod csv_file;
pub mod github;
pub mod mirrored;
pub mod r#trait;

pub use csv_file::{CANONICAL_COLUMNS, CsvFileStore};
pub use github::{GitHubMirror, MirrorOutcome};
pub use mirrored::MirroredStore;
pub use r#trait::{InventoryStore, PersistenceError};
