//! Stock CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;
use rust_decimal::Decimal;

use super::output::Output;
use crate::domain::{MovementKind, StockMovement};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum StockCommands {
    /// Record a stock receipt
    In {
        /// Product (id or reference)
        product: String,

        /// Quantity received
        quantity: String,
    },

    /// Record a stock issue
    Out {
        /// Product (id or reference)
        product: String,

        /// Quantity issued
        quantity: String,
    },

    /// Show current stock levels
    List,

    /// Show the movement log
    Movements {
        /// Filter by product (id or reference)
        product: Option<String>,
    },
}

pub fn run(cmd: StockCommands, output: &Output) -> Result<()> {
    match cmd {
        StockCommands::In { product, quantity } => {
            record_movement(output, &product, &quantity, MovementKind::In)
        }
        StockCommands::Out { product, quantity } => {
            record_movement(output, &product, &quantity, MovementKind::Out)
        }
        StockCommands::List => list_levels(output),
        StockCommands::Movements { product } => list_movements(output, product.as_deref()),
    }
}

fn record_movement(output: &Output, product: &str, quantity: &str, kind: MovementKind) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    let product = catalog
        .find_product(product)
        .ok_or_else(|| anyhow::anyhow!("No product matching '{}'", product))?;

    let quantity: Decimal = quantity
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid quantity '{}'", quantity))?;
    if quantity <= Decimal::ZERO {
        bail!("Quantity must be positive, got {}", quantity);
    }

    let movement = StockMovement::new(product.id.clone(), kind, quantity);
    project.movement_store().append(&movement)?;

    output.verbose_ctx("stock", &format!("Stored movement {}", movement.id));
    output.success(&format!(
        "Recorded {} {} {} {} ({})",
        movement.kind.label(),
        movement.quantity,
        product.unit,
        product.reference,
        movement.id
    ));
    Ok(())
}

fn list_levels(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;
    let threshold = project.config().project.low_stock_threshold;

    let levels = catalog.stock_levels();

    if output.is_json() {
        let items: Vec<_> = levels
            .iter()
            .map(|level| {
                let product = catalog.product(&level.product);
                serde_json::json!({
                    "product_id": level.product,
                    "reference": product.map(|p| p.reference.as_str()),
                    "on_hand": level.on_hand,
                    "low": level.is_low(threshold),
                    "updated_at": level.updated_at,
                })
            })
            .collect();
        return output.data(&items);
    }

    if levels.is_empty() {
        println!("No stock movements recorded.");
        return Ok(());
    }

    println!("{:<14} {:>12} {:<6} {}", "REFERENCE", "ON HAND", "UNIT", "NOTE");
    println!("{}", "-".repeat(50));
    for level in levels {
        let (reference, unit) = catalog
            .product(&level.product)
            .map(|p| (p.reference.as_str(), p.unit.as_str()))
            .unwrap_or(("?", ""));
        let note = if level.on_hand < Decimal::ZERO {
            "NEGATIVE"
        } else if level.is_low(threshold) {
            "LOW"
        } else {
            ""
        };
        println!(
            "{:<14} {:>12} {:<6} {}",
            reference, level.on_hand, unit, note
        );
    }

    Ok(())
}

fn list_movements(output: &Output, product: Option<&str>) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    let filter = match product {
        Some(query) => Some(
            catalog
                .find_product(query)
                .ok_or_else(|| anyhow::anyhow!("No product matching '{}'", query))?
                .id
                .clone(),
        ),
        None => None,
    };

    let movements: Vec<_> = catalog
        .movements()
        .iter()
        .filter(|m| filter.as_ref().map_or(true, |id| &m.product == id))
        .collect();

    if output.is_json() {
        return output.data(&movements);
    }

    if movements.is_empty() {
        println!("No stock movements recorded.");
        return Ok(());
    }

    println!("{:<11} {:<17} {:<5} {:>12} DATE", "ID", "PRODUCT", "KIND", "QUANTITY");
    println!("{}", "-".repeat(64));
    for movement in movements {
        let reference = catalog
            .product(&movement.product)
            .map(|p| p.reference.as_str())
            .unwrap_or("?");
        println!(
            "{:<11} {:<17} {:<5} {:>12} {}",
            movement.id.to_string(),
            reference,
            movement.kind.label(),
            movement.quantity,
            movement.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}
