//! Project management
//!
//! Handles project initialization and provides access to stores and
//! catalog snapshots.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::domain::{
    BomResolver, NomenclatureVersion, Product, StockMovement, ValidationWarning,
};

use super::catalog::Catalog;
use super::config::Config;
use super::jsonl::JsonlStore;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a fabrik project. Run 'fabrik init' first.")]
    NotInProject,
}

/// A fabrik project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(".fabrik");

        if !data_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let data_dir = root.join(".fabrik");

        fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create .fabrik directory: {}", data_dir.display())
        })?;

        let config_path = data_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# fabrik configuration

# How the active nomenclature version is selected: "latest" or "flagged"
active_version_policy = "latest"

# Stock levels at or below this value are marked low
low_stock_threshold = "10"

# Default unit of measure for new products
default_unit = "pcs"
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = data_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# Ignore in-flight rewrite files
*.tmp
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let project = Self::open(root)?;

        // Seed empty stores so the data files exist and are committable
        // right after init
        let products = project.product_store();
        if !products.path().exists() {
            products.write_all(&[])?;
        }
        let nomenclatures = project.nomenclature_store();
        if !nomenclatures.path().exists() {
            nomenclatures.write_all(&[])?;
        }
        let movements = project.movement_store();
        if !movements.path().exists() {
            movements.write_all(&[])?;
        }

        Ok(project)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .fabrik directory path
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(".fabrik")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the product store
    pub fn product_store(&self) -> JsonlStore<Product> {
        JsonlStore::for_project(&self.root)
    }

    /// Returns the nomenclature store
    pub fn nomenclature_store(&self) -> JsonlStore<NomenclatureVersion> {
        JsonlStore::for_project(&self.root)
    }

    /// Returns the stock movement store
    pub fn movement_store(&self) -> JsonlStore<StockMovement> {
        JsonlStore::for_project(&self.root)
    }

    /// Loads a full catalog snapshot from the stores
    pub fn catalog(&self) -> Result<Catalog> {
        Ok(Catalog::assemble(
            self.product_store().read_all()?,
            self.nomenclature_store().read_all()?,
            self.movement_store().read_all()?,
            self.config.project.active_version_policy,
        ))
    }

    /// Validates and persists a new nomenclature version.
    ///
    /// Validation runs inside the nomenclature store's exclusive lock
    /// window against the records on disk at that moment, so two
    /// concurrent submissions cannot both pass and jointly close a cycle.
    pub fn commit_nomenclature(
        &self,
        version: NomenclatureVersion,
    ) -> Result<Vec<ValidationWarning>> {
        let products = self.product_store().read_all()?;
        let policy = self.config.project.active_version_policy;

        self.nomenclature_store().modify(|records| {
            let catalog = Catalog::assemble(products, records.clone(), Vec::new(), policy);
            let resolver = BomResolver::new(&catalog);
            let warnings = resolver.validate(&version.parent, &version.components)?;

            records.push(version);
            Ok(warnings)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComponentLine, ProductKind, ResolveError};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn add_product(project: &Project, reference: &str, kind: ProductKind) -> Product {
        let product = Product::new(reference, format!("Product {}", reference), kind, "pcs");
        project.product_store().append(&product).unwrap();
        product
    }

    #[test]
    fn init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        assert!(project.data_dir().is_dir());
        assert!(project.data_dir().join("config.toml").is_file());
        assert!(project.data_dir().join(".gitignore").is_file());
        assert!(project.data_dir().join("products.jsonl").is_file());
        assert!(project.data_dir().join("nomenclatures.jsonl").is_file());
        assert!(project.data_dir().join("movements.jsonl").is_file());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        Project::init(dir.path()).unwrap();
        Project::init(dir.path()).unwrap();
    }

    #[test]
    fn open_fails_outside_project() {
        let dir = TempDir::new().unwrap();
        assert!(Project::open(dir.path()).is_err());
    }

    #[test]
    fn commit_nomenclature_persists_valid_submission() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let parent = add_product(&project, "A", ProductKind::Finished);
        let component = add_product(&project, "B", ProductKind::Raw);

        let version = NomenclatureVersion::new(
            parent.id.clone(),
            "1.0",
            vec![ComponentLine::new(component.id.clone(), Decimal::TWO)],
        );
        let warnings = project.commit_nomenclature(version).unwrap();

        assert!(warnings.is_empty());
        let catalog = project.catalog().unwrap();
        assert!(catalog.active_version(&parent.id).is_some());
    }

    #[test]
    fn commit_nomenclature_rejects_cycle_without_persisting() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let a = add_product(&project, "A", ProductKind::Finished);
        let b = add_product(&project, "B", ProductKind::Component);

        project
            .commit_nomenclature(NomenclatureVersion::new(
                a.id.clone(),
                "1.0",
                vec![ComponentLine::new(b.id.clone(), Decimal::ONE)],
            ))
            .unwrap();

        let err = project
            .commit_nomenclature(NomenclatureVersion::new(
                b.id.clone(),
                "1.0",
                vec![ComponentLine::new(a.id.clone(), Decimal::ONE)],
            ))
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::CycleDetected { .. })
        ));
        // The rejected version must not be on disk
        assert_eq!(project.nomenclature_store().read_all().unwrap().len(), 1);
    }

    #[test]
    fn concurrent_commits_both_persist() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let a = add_product(&project, "A", ProductKind::Finished);
        let b = add_product(&project, "B", ProductKind::Finished);
        let c = add_product(&project, "C", ProductKind::Raw);

        let root = dir.path().to_path_buf();
        let version_b = NomenclatureVersion::new(
            b.id.clone(),
            "1.0",
            vec![ComponentLine::new(c.id.clone(), Decimal::ONE)],
        );
        let other = std::thread::spawn(move || {
            let project = Project::open(root).unwrap();
            project.commit_nomenclature(version_b).unwrap();
        });

        project
            .commit_nomenclature(NomenclatureVersion::new(
                a.id.clone(),
                "1.0",
                vec![ComponentLine::new(c.id.clone(), Decimal::ONE)],
            ))
            .unwrap();
        other.join().unwrap();

        // Neither writer's version may be lost, whichever ran first
        assert_eq!(project.nomenclature_store().read_all().unwrap().len(), 2);
    }

    #[test]
    fn commit_nomenclature_reports_empty_warning() {
        let dir = TempDir::new().unwrap();
        let project = Project::init(dir.path()).unwrap();

        let parent = add_product(&project, "A", ProductKind::Finished);
        let warnings = project
            .commit_nomenclature(NomenclatureVersion::new(parent.id.clone(), "1.0", vec![]))
            .unwrap();

        assert_eq!(
            warnings,
            vec![ValidationWarning::EmptyComponents(parent.id)]
        );
    }
}
