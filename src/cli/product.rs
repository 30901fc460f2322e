//! Product CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::output::Output;
use crate::domain::{Product, ProductKind};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Add a product to the catalog
    Add {
        /// Unique reference code (e.g. "STEEL-01")
        reference: String,

        /// Display name
        name: String,

        /// Product kind: raw, component or finished
        #[arg(long, default_value = "finished")]
        kind: String,

        /// Unit of measure (defaults to the configured default unit)
        #[arg(long)]
        unit: Option<String>,
    },

    /// List products
    List,

    /// Show product details
    Show {
        /// Product id or reference
        product: String,
    },
}

pub fn run(cmd: ProductCommands, output: &Output) -> Result<()> {
    match cmd {
        ProductCommands::Add {
            reference,
            name,
            kind,
            unit,
        } => add_product(output, &reference, &name, &kind, unit.as_deref()),
        ProductCommands::List => list_products(output),
        ProductCommands::Show { product } => show_product(output, &product),
    }
}

fn add_product(
    output: &Output,
    reference: &str,
    name: &str,
    kind: &str,
    unit: Option<&str>,
) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    let kind: ProductKind = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if catalog.reference_taken(reference) {
        bail!("Reference '{}' is already taken", reference);
    }

    let unit = unit.unwrap_or(&project.config().project.default_unit);
    let product = Product::new(reference, name, kind, unit);
    project.product_store().append(&product)?;

    output.verbose_ctx("product", &format!("Stored product {}", product.id));
    output.success(&format!(
        "Created product {} ({} - {})",
        product.id, product.reference, product.name
    ));
    Ok(())
}

fn list_products(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    if output.is_json() {
        return output.data(&catalog.products());
    }

    if catalog.products().is_empty() {
        println!("No products in catalog.");
        return Ok(());
    }

    println!("{:<11} {:<14} {:<10} {:<6} NAME", "ID", "REFERENCE", "KIND", "UNIT");
    println!("{}", "-".repeat(60));
    for product in catalog.products() {
        println!(
            "{:<11} {:<14} {:<10} {:<6} {}",
            product.id.to_string(),
            product.reference,
            product.kind.label(),
            product.unit,
            product.name
        );
    }

    Ok(())
}

fn show_product(output: &Output, query: &str) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    let product = catalog
        .find_product(query)
        .ok_or_else(|| anyhow::anyhow!("No product matching '{}'", query))?;

    if output.is_json() {
        let level = catalog.stock_level(&product.id);
        return output.data(&serde_json::json!({
            "product": product,
            "on_hand": level.on_hand,
            "versions": catalog.versions_for(&product.id).len(),
        }));
    }

    println!("{} ({})", product.name, product.reference);
    println!("  id:      {}", product.id);
    println!("  kind:    {}", product.kind.label());
    println!("  unit:    {}", product.unit);
    println!("  created: {}", product.created_at.format("%Y-%m-%d %H:%M"));

    let level = catalog.stock_level(&product.id);
    println!("  on hand: {} {}", level.on_hand, product.unit);

    match catalog.active_version(&product.id) {
        Some(version) => println!(
            "  active nomenclature: {} ({} components)",
            version.version,
            version.components.len()
        ),
        None => println!("  active nomenclature: none (leaf product)"),
    }

    Ok(())
}
