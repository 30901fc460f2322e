//! Stock movements and derived levels
//!
//! Stock is an append-only movement log; on-hand levels are derived by
//! folding the log rather than stored, so the history stays auditable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{MovementId, ProductId};

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received into stock
    In,
    /// Goods issued out of stock
    Out,
}

impl MovementKind {
    /// Returns a display label for the movement kind
    pub fn label(&self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
        }
    }

    /// Returns the signed effect of one unit moved
    pub fn sign(&self) -> Decimal {
        match self {
            MovementKind::In => Decimal::ONE,
            MovementKind::Out => -Decimal::ONE,
        }
    }
}

impl std::str::FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(MovementKind::In),
            "out" => Ok(MovementKind::Out),
            other => Err(format!(
                "unknown movement kind '{}' (expected in or out)",
                other
            )),
        }
    }
}

/// One entry in the stock movement log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Unique identifier
    pub id: MovementId,

    /// The product moved
    pub product: ProductId,

    /// Direction of the movement
    pub kind: MovementKind,

    /// Quantity moved, always positive; direction comes from `kind`
    pub quantity: Decimal,

    /// When the movement was recorded
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Records a new movement
    pub fn new(product: ProductId, kind: MovementKind, quantity: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: MovementId::new(&product.to_string(), now),
            product,
            kind,
            quantity,
            created_at: now,
        }
    }

    /// Returns the signed quantity (negative for issues)
    pub fn signed_quantity(&self) -> Decimal {
        self.kind.sign() * self.quantity
    }
}

/// Derived stock level for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    /// The product
    pub product: ProductId,

    /// Net quantity on hand (sum of receipts minus issues)
    pub on_hand: Decimal,

    /// Timestamp of the most recent movement, if any
    pub updated_at: Option<DateTime<Utc>>,
}

impl StockLevel {
    /// Empty level for a product with no movements
    pub fn empty(product: ProductId) -> Self {
        Self {
            product,
            on_hand: Decimal::ZERO,
            updated_at: None,
        }
    }

    /// Folds one movement into the level
    pub fn apply(&mut self, movement: &StockMovement) {
        self.on_hand += movement.signed_quantity();
        if self.updated_at.map_or(true, |t| movement.created_at > t) {
            self.updated_at = Some(movement.created_at);
        }
    }

    /// Returns true when the level sits at or below the given threshold
    pub fn is_low(&self, threshold: Decimal) -> bool {
        self.on_hand <= threshold
    }
}
