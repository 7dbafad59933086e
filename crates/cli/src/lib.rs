//! Command-line front end: argument parsing, the interactive menu and
//! terminal rendering over the inventory operations.

pub mod app;
pub mod commands;
pub mod render;
pub mod session;

pub use app::{App, NewItem, Outcome};
pub use commands::{Cli, Command, execute};
