//! CLI command handlers

pub mod commands;

pub use commands::{apply, fill, inspect, questions};
