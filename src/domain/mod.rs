//! Domain models for fabrik
//!
//! Contains the catalog models and the BOM resolver without any I/O
//! concerns.

mod id;
mod nomenclature;
mod product;
mod resolver;
mod stock;

pub use id::{IdError, MovementId, NomenclatureId, ProductId};
pub use nomenclature::{ActiveVersionPolicy, ComponentLine, NomenclatureVersion};
pub use product::{Product, ProductKind};
pub use resolver::{BomResolver, BomSource, ResolveError, ValidationWarning};
pub use stock::{MovementKind, StockLevel, StockMovement};
