//! In-memory catalog snapshot
//!
//! A [`Catalog`] is one consistent read of all three stores. Resolver
//! queries and reports run against the snapshot, never against the files,
//! so a concurrent write cannot be observed mid-traversal.

use std::collections::HashMap;

use crate::domain::{
    ActiveVersionPolicy, BomSource, ComponentLine, NomenclatureVersion, Product, ProductId,
    ProductKind, StockLevel, StockMovement,
};

/// Immutable snapshot of products, nomenclatures and stock
pub struct Catalog {
    products: Vec<Product>,
    product_by_id: HashMap<ProductId, usize>,
    product_by_reference: HashMap<String, usize>,
    nomenclatures: Vec<NomenclatureVersion>,
    /// Parent product -> index of its active version in `nomenclatures`
    active: HashMap<ProductId, usize>,
    movements: Vec<StockMovement>,
}

impl Catalog {
    /// Builds a snapshot from raw store contents
    pub fn assemble(
        products: Vec<Product>,
        nomenclatures: Vec<NomenclatureVersion>,
        movements: Vec<StockMovement>,
        policy: ActiveVersionPolicy,
    ) -> Self {
        let mut product_by_id = HashMap::new();
        let mut product_by_reference = HashMap::new();
        for (idx, product) in products.iter().enumerate() {
            product_by_id.insert(product.id.clone(), idx);
            product_by_reference.insert(product.reference.clone(), idx);
        }

        let mut grouped: HashMap<ProductId, Vec<usize>> = HashMap::new();
        for (idx, version) in nomenclatures.iter().enumerate() {
            grouped.entry(version.parent.clone()).or_default().push(idx);
        }

        let mut active = HashMap::new();
        for (parent, indexes) in grouped {
            let chosen = policy.select(indexes.iter().map(|&i| &nomenclatures[i]));
            if let Some(chosen) = chosen {
                if let Some(&idx) = indexes.iter().find(|&&i| nomenclatures[i].id == chosen.id) {
                    active.insert(parent, idx);
                }
            }
        }

        Self {
            products,
            product_by_id,
            product_by_reference,
            nomenclatures,
            active,
            movements,
        }
    }

    /// All products, in store order
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Looks up a product by id
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.product_by_id.get(id).map(|&idx| &self.products[idx])
    }

    /// Looks up a product by id string or reference code
    pub fn find_product(&self, query: &str) -> Option<&Product> {
        if let Ok(id) = query.parse::<ProductId>() {
            if let Some(product) = self.product(&id) {
                return Some(product);
            }
        }
        self.product_by_reference
            .get(query)
            .map(|&idx| &self.products[idx])
    }

    /// Returns true if a reference code is already taken
    pub fn reference_taken(&self, reference: &str) -> bool {
        self.product_by_reference.contains_key(reference)
    }

    /// All nomenclature versions, in store order
    pub fn nomenclatures(&self) -> &[NomenclatureVersion] {
        &self.nomenclatures
    }

    /// All versions for one parent, in store order
    pub fn versions_for(&self, parent: &ProductId) -> Vec<&NomenclatureVersion> {
        self.nomenclatures
            .iter()
            .filter(|v| &v.parent == parent)
            .collect()
    }

    /// The active version for one parent, per the configured policy
    pub fn active_version(&self, parent: &ProductId) -> Option<&NomenclatureVersion> {
        self.active.get(parent).map(|&idx| &self.nomenclatures[idx])
    }

    /// Parents that currently have an active version
    pub fn active_parent_count(&self) -> usize {
        self.active.len()
    }

    /// All stock movements, in store order
    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    /// Derived stock level for one product
    pub fn stock_level(&self, product: &ProductId) -> StockLevel {
        let mut level = StockLevel::empty(product.clone());
        for movement in self.movements.iter().filter(|m| &m.product == product) {
            level.apply(movement);
        }
        level
    }

    /// Derived levels for every product with at least one movement,
    /// sorted by product reference
    pub fn stock_levels(&self) -> Vec<StockLevel> {
        let mut levels: HashMap<ProductId, StockLevel> = HashMap::new();
        for movement in &self.movements {
            levels
                .entry(movement.product.clone())
                .or_insert_with(|| StockLevel::empty(movement.product.clone()))
                .apply(movement);
        }

        let mut levels: Vec<StockLevel> = levels.into_values().collect();
        levels.sort_by(|a, b| {
            let ref_a = self.product(&a.product).map(|p| p.reference.as_str());
            let ref_b = self.product(&b.product).map(|p| p.reference.as_str());
            ref_a.cmp(&ref_b)
        });
        levels
    }
}

impl BomSource for Catalog {
    fn active_nomenclatures(&self) -> Vec<(&ProductId, &[ComponentLine])> {
        self.active
            .values()
            .map(|&idx| {
                let version = &self.nomenclatures[idx];
                (&version.parent, version.components.as_slice())
            })
            .collect()
    }

    fn product_exists(&self, id: &ProductId) -> bool {
        self.product_by_id.contains_key(id)
    }

    fn product_kind(&self, id: &ProductId) -> Option<ProductKind> {
        self.product(id).map(|p| p.kind)
    }
}
