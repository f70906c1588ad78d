/// Shared helpers
pub mod command;
