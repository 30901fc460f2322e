//! Product catalog model
//!
//! Products are the nodes of the BOM graph: raw materials, intermediate
//! components and finished goods. Identity is immutable; descriptive
//! fields can be updated by the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Kind of product in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Purchased material, never produced in-house
    Raw,
    /// Intermediate product, both consumed and produced
    Component,
    /// Sellable end product
    #[default]
    Finished,
}

impl ProductKind {
    /// Returns a display label for the product kind
    pub fn label(&self) -> &'static str {
        match self {
            ProductKind::Raw => "raw",
            ProductKind::Component => "component",
            ProductKind::Finished => "finished",
        }
    }

    /// Returns true for purchased materials
    pub fn is_raw(&self) -> bool {
        matches!(self, ProductKind::Raw)
    }
}

impl std::str::FromStr for ProductKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(ProductKind::Raw),
            "component" => Ok(ProductKind::Component),
            "finished" => Ok(ProductKind::Finished),
            other => Err(format!(
                "unknown product kind '{}' (expected raw, component or finished)",
                other
            )),
        }
    }
}

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier
    pub id: ProductId,

    /// Human-facing reference code, unique within a catalog
    pub reference: String,

    /// Display name
    pub name: String,

    /// Product kind
    pub kind: ProductKind,

    /// Unit of measure (free-form: "pcs", "kg", "m", ...)
    pub unit: String,

    /// When the product was created
    pub created_at: DateTime<Utc>,

    /// When the product was last updated
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with a freshly derived ID
    pub fn new(
        reference: impl Into<String>,
        name: impl Into<String>,
        kind: ProductKind,
        unit: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let reference = reference.into();
        Self {
            id: ProductId::new(&reference, now),
            reference,
            name: name.into(),
            kind,
            unit: unit.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Renames the product
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Changes the unit of measure
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
        self.updated_at = Utc::now();
    }
}
