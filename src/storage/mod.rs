//! # Storage Layer
//!
//! Persistence layer for fabrik with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Products | JSONL (one JSON per line) | `.fabrik/products.jsonl` |
//! | Nomenclatures | JSONL | `.fabrik/nomenclatures.jsonl` |
//! | Stock movements | JSONL | `.fabrik/movements.jsonl` |
//! | Config | TOML | `.fabrik/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`JsonlStore`] uses file locking (`fs2`) for concurrent access
//! - Full rewrites (`write_all`) are atomic (temp file + rename);
//!   `modify` rewrites in place through its locked handle so a blocked
//!   writer always reads the committed contents, never a stale inode
//! - [`Catalog`] is a consistent in-memory snapshot; resolver queries
//!   never touch the files directly
//! - New nomenclatures are validated inside the store's exclusive lock
//!   window, closing the check-then-act race between concurrent inserts
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a fabrik project
//! - [`JsonlStore`] - Read/write one record type as JSONL
//! - [`Catalog`] - Snapshot of all stores, input to the BOM resolver
//! - [`Config`] - Project and global configuration

mod catalog;
mod config;
mod jsonl;
mod project;

pub use catalog::Catalog;
pub use config::{Config, ConfigError, DefaultFormat, GlobalConfig, ProjectConfig};
pub use jsonl::{JsonlStore, Record};
pub use project::{Project, ProjectError};
