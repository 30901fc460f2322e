//! fabrik - A local-first MRP toolkit
//!
//! fabrik manages a small manufacturing catalog: products, stock
//! movements and versioned nomenclatures (bills of materials). Its core
//! is the BOM resolver, which validates nomenclatures against the active
//! edge graph and explodes products into leaf-level requirements.

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{
    BomResolver, BomSource, ComponentLine, NomenclatureVersion, Product, ProductId, ProductKind,
    ResolveError, StockMovement,
};
