//! Compact CLI command
//!
//! Rewrites each store keeping only the last occurrence of every record
//! id, dropping superseded lines left behind by append-heavy histories.

use anyhow::Result;

use super::output::Output;
use crate::storage::Project;

pub fn run(output: &Output) -> Result<()> {
    let project = Project::open_current()?;

    output.verbose_ctx("compact", "Rewriting stores");

    let products = project.product_store().compact()?;
    let nomenclatures = project.nomenclature_store().compact()?;
    let movements = project.movement_store().compact()?;

    if output.is_json() {
        return output.data(&serde_json::json!({
            "products": products,
            "nomenclatures": nomenclatures,
            "movements": movements,
        }));
    }

    output.success(&format!(
        "Compacted stores: {} products, {} nomenclature versions, {} movements",
        products, nomenclatures, movements
    ));
    Ok(())
}
