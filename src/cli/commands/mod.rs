//! Command implementations.

pub mod assign_ids;
pub mod completions;
pub mod config;
pub mod schema;
pub mod status;
pub mod sync;
pub mod version;
