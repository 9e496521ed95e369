// Discord layer - commands and the announcement channel adapters.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "announce/mod.rs"]
pub mod announce;

// Re-export command types for convenience
pub use commands::worklog::{Data, Error};
