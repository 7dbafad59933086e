//! Infrastructure layer: CSV persistence, the GitHub mirror, configuration
//! and file exports.

pub mod config;
pub mod export;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use export::{write_catalog, write_slow_movers};
pub use store::{CsvFileStore, GitHubMirror, InventoryStore, MirroredStore, PersistenceError};
