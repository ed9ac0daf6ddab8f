//! vibe-search: multimodal product search over a SQLite catalog.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod search;
pub mod storage;
pub mod test_utils;

pub use error::{Result, VibeError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
