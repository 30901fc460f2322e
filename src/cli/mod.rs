//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management | `init`, `status`, `compact` |
//! | Product | Catalog registry | `product add`, `product list` |
//! | Nomenclature | BOM lifecycle | `nom add`, `nom show` |
//! | Stock | Movement log and levels | `stock in`, `stock list` |
//! | Planning | Requirement explosion | `plan CHAIR 50` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod compact;
mod nomenclature;
mod output;
mod plan;
mod product;
mod stock;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
