//! Planning and status commands
//!
//! `plan` explodes a product's nomenclature into leaf requirements and
//! compares them with stock on hand; `status` gives a catalog overview.

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use super::output::Output;
use crate::domain::BomResolver;
use crate::storage::Project;

/// One leaf requirement in a plan
#[derive(Debug, Serialize)]
struct PlanLine {
    product_id: String,
    reference: String,
    name: String,
    kind: &'static str,
    unit: String,
    required: Decimal,
    on_hand: Decimal,
    shortfall: Decimal,
}

/// Explode a product into leaf requirements for a build quantity
pub fn plan(output: &Output, product: &str, quantity: &str) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    let product = catalog
        .find_product(product)
        .ok_or_else(|| anyhow::anyhow!("No product matching '{}'", product))?;

    let quantity: Decimal = quantity
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid quantity '{}'", quantity))?;

    output.verbose_ctx(
        "plan",
        &format!("Exploding {} x {}", quantity, product.reference),
    );

    let resolver = BomResolver::new(&catalog);
    let totals = resolver.explode(&product.id, quantity)?;

    let mut lines: Vec<PlanLine> = totals
        .iter()
        .map(|(leaf, required)| {
            let on_hand = catalog.stock_level(leaf).on_hand;
            let shortfall = (required - on_hand).max(Decimal::ZERO);
            let (reference, name, kind, unit) = catalog
                .product(leaf)
                .map(|p| {
                    (
                        p.reference.clone(),
                        p.name.clone(),
                        p.kind.label(),
                        p.unit.clone(),
                    )
                })
                .unwrap_or_else(|| (leaf.to_string(), String::new(), "?", String::new()));
            PlanLine {
                product_id: leaf.to_string(),
                reference,
                name,
                kind,
                unit,
                required: *required,
                on_hand,
                shortfall,
            }
        })
        .collect();
    lines.sort_by(|a, b| a.reference.cmp(&b.reference));

    if output.is_json() {
        return output.data(&serde_json::json!({
            "product": product.reference,
            "quantity": quantity,
            "requirements": lines,
        }));
    }

    println!(
        "Requirements for {} x {} ({}):",
        quantity, product.reference, product.name
    );
    println!(
        "{:<14} {:>12} {:>12} {:>12} {:<6}",
        "REFERENCE", "REQUIRED", "ON HAND", "SHORTFALL", "UNIT"
    );
    println!("{}", "-".repeat(62));
    for line in &lines {
        println!(
            "{:<14} {:>12} {:>12} {:>12} {:<6}",
            line.reference, line.required, line.on_hand, line.shortfall, line.unit
        );
    }

    let missing = lines.iter().filter(|l| l.shortfall > Decimal::ZERO).count();
    if missing > 0 {
        println!();
        println!("{} of {} leaf products are short.", missing, lines.len());
    }

    Ok(())
}

/// Show a catalog overview
pub fn status(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;
    let threshold = project.config().project.low_stock_threshold;

    let raw = catalog.products().iter().filter(|p| p.kind.is_raw()).count();
    let total = catalog.products().len();
    let nomenclatures = catalog.nomenclatures().len();
    let active = catalog.active_parent_count();
    let low: Vec<_> = catalog
        .stock_levels()
        .into_iter()
        .filter(|level| level.is_low(threshold))
        .collect();

    if output.is_json() {
        return output.data(&serde_json::json!({
            "products": total,
            "raw_materials": raw,
            "nomenclature_versions": nomenclatures,
            "active_nomenclatures": active,
            "low_stock": low.len(),
            "policy": project.config().project.active_version_policy.as_str(),
        }));
    }

    println!("Project: {}", project.root().display());
    println!("  products:               {} ({} raw materials)", total, raw);
    println!(
        "  nomenclature versions:  {} ({} active parents)",
        nomenclatures, active
    );
    println!(
        "  active version policy:  {}",
        project.config().project.active_version_policy.as_str()
    );
    println!("  movements:              {}", catalog.movements().len());

    if !low.is_empty() {
        println!();
        println!("Low stock (threshold {}):", threshold);
        for level in low {
            let reference = catalog
                .product(&level.product)
                .map(|p| p.reference.as_str())
                .unwrap_or("?");
            println!("  {:<14} {}", reference, level.on_hand);
        }
    }

    Ok(())
}
