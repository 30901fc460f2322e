//! Nomenclature CLI commands

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use rust_decimal::Decimal;

use super::output::Output;
use crate::domain::{ComponentLine, NomenclatureVersion};
use crate::storage::{Catalog, Project};

#[derive(Subcommand)]
pub enum NomCommands {
    /// Create a new nomenclature version for a parent product
    ///
    /// Examples:
    ///   fabrik nom add CHAIR -c SEAT=1 -c LEG=4
    ///   fabrik nom add CHAIR --version 2.0 --active -c SEAT=1
    #[command(disable_version_flag = true)]
    Add {
        /// Parent product (id or reference)
        parent: String,

        /// Version label
        #[arg(long, default_value = "1.0")]
        version: String,

        /// Flag this version as explicitly active
        #[arg(long)]
        active: bool,

        /// Component line as PRODUCT=QUANTITY (repeatable)
        #[arg(short = 'c', long = "component")]
        components: Vec<String>,
    },

    /// List nomenclatures (active version per parent)
    List,

    /// Show all versions for a parent product
    Show {
        /// Parent product (id or reference)
        parent: String,
    },
}

pub fn run(cmd: NomCommands, output: &Output) -> Result<()> {
    match cmd {
        NomCommands::Add {
            parent,
            version,
            active,
            components,
        } => add_nomenclature(output, &parent, &version, active, &components),
        NomCommands::List => list_nomenclatures(output),
        NomCommands::Show { parent } => show_nomenclature(output, &parent),
    }
}

/// Parses a `PRODUCT=QUANTITY` component spec against the catalog
fn parse_component(catalog: &Catalog, spec: &str) -> Result<ComponentLine> {
    let (product_query, quantity) = spec
        .split_once('=')
        .with_context(|| format!("Invalid component '{}', expected PRODUCT=QUANTITY", spec))?;

    let product = catalog
        .find_product(product_query.trim())
        .ok_or_else(|| anyhow::anyhow!("No product matching '{}'", product_query.trim()))?;

    let quantity: Decimal = quantity
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity in component '{}'", spec))?;

    Ok(ComponentLine::new(product.id.clone(), quantity))
}

fn add_nomenclature(
    output: &Output,
    parent: &str,
    version: &str,
    active: bool,
    component_specs: &[String],
) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    let parent = catalog
        .find_product(parent)
        .ok_or_else(|| anyhow::anyhow!("No product matching '{}'", parent))?;

    let components = component_specs
        .iter()
        .map(|spec| parse_component(&catalog, spec))
        .collect::<Result<Vec<_>>>()?;

    let mut candidate = NomenclatureVersion::new(parent.id.clone(), version, components);
    if active {
        candidate = candidate.flag_active();
    }

    output.verbose_ctx(
        "nom",
        &format!(
            "Validating {} components for parent {}",
            candidate.components.len(),
            candidate.parent
        ),
    );

    let id = candidate.id.clone();
    let warnings = project.commit_nomenclature(candidate)?;
    for warning in &warnings {
        output.warning(&warning.to_string());
    }

    output.success(&format!(
        "Created nomenclature {} for {} (version {})",
        id, parent.reference, version
    ));
    Ok(())
}

fn list_nomenclatures(output: &Output) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    let mut active: Vec<_> = catalog
        .products()
        .iter()
        .filter_map(|p| catalog.active_version(&p.id).map(|v| (p, v)))
        .collect();
    active.sort_by(|(a, _), (b, _)| a.reference.cmp(&b.reference));

    if output.is_json() {
        let items: Vec<_> = active
            .iter()
            .map(|(product, version)| {
                serde_json::json!({
                    "parent": product.reference,
                    "parent_id": product.id,
                    "version": version.version,
                    "active": version.active,
                    "components": version.components,
                })
            })
            .collect();
        return output.data(&items);
    }

    if active.is_empty() {
        println!("No nomenclatures defined.");
        return Ok(());
    }

    println!("{:<14} {:<10} {:<8} COMPONENTS", "PARENT", "VERSION", "FLAG");
    println!("{}", "-".repeat(60));
    for (product, version) in active {
        let lines: Vec<String> = version
            .components
            .iter()
            .map(|line| {
                let name = catalog
                    .product(&line.product)
                    .map(|p| p.reference.as_str())
                    .unwrap_or("?");
                format!("{} x {}", line.quantity, name)
            })
            .collect();
        println!(
            "{:<14} {:<10} {:<8} {}",
            product.reference,
            version.version,
            if version.active { "active" } else { "-" },
            lines.join(", ")
        );
    }

    Ok(())
}

fn show_nomenclature(output: &Output, parent: &str) -> Result<()> {
    let project = Project::open_current()?;
    let catalog = project.catalog()?;

    let parent = catalog
        .find_product(parent)
        .ok_or_else(|| anyhow::anyhow!("No product matching '{}'", parent))?;

    let versions = catalog.versions_for(&parent.id);
    if versions.is_empty() {
        bail!("No nomenclature for {} (leaf product)", parent.reference);
    }

    let active_id = catalog.active_version(&parent.id).map(|v| v.id.clone());

    if output.is_json() {
        let items: Vec<_> = versions
            .iter()
            .map(|v| {
                serde_json::json!({
                    "id": v.id,
                    "version": v.version,
                    "created_at": v.created_at,
                    "is_active": Some(&v.id) == active_id.as_ref(),
                    "components": v.components,
                })
            })
            .collect();
        return output.data(&items);
    }

    println!("Nomenclatures for {} ({}):", parent.name, parent.reference);
    for version in versions {
        let marker = if Some(&version.id) == active_id.as_ref() {
            " [active]"
        } else {
            ""
        };
        println!(
            "  version {} ({}){}",
            version.version,
            version.created_at.format("%Y-%m-%d %H:%M"),
            marker
        );
        if version.components.is_empty() {
            println!("    (no components)");
        }
        for line in &version.components {
            let (reference, unit) = catalog
                .product(&line.product)
                .map(|p| (p.reference.as_str(), p.unit.as_str()))
                .unwrap_or(("?", ""));
            println!("    {} {} x {}", line.quantity, unit, reference);
        }
    }

    Ok(())
}
