//! BOM resolver
//!
//! Validates candidate nomenclatures against the active-version graph and
//! computes multi-level explosions into leaf requirements. Uses petgraph
//! for the edge graph.
//!
//! The resolver is a pure query layer: it is built over an immutable
//! snapshot of the catalog ([`BomSource`]) and never persists anything.
//! Acceptance of a validated nomenclature is the store's job, inside its
//! write-lock window, so two concurrent inserts cannot jointly sneak a
//! cycle past the check.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use super::id::ProductId;
use super::nomenclature::ComponentLine;
use super::product::ProductKind;

/// Joins a product path for error messages
fn join_path(path: &[ProductId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("Product {0} cannot be listed as its own component")]
    SelfReference(ProductId),

    #[error("Component {0} appears more than once; merge the lines instead")]
    DuplicateComponent(ProductId),

    #[error("Quantity for {product} must be positive, got {quantity}")]
    NonPositiveQuantity {
        product: ProductId,
        quantity: Decimal,
    },

    #[error("Cycle detected: {}", join_path(.path))]
    CycleDetected { path: Vec<ProductId> },
}

impl ResolveError {
    /// Returns true for faults that indicate corrupted stored data rather
    /// than a bad submission (a cycle hit during traversal can only come
    /// from edges inserted out-of-band).
    pub fn is_integrity_fault(&self) -> bool {
        matches!(self, ResolveError::CycleDetected { .. })
    }
}

/// Non-fatal findings from validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Empty component list: valid as a leaf substitute, but usually a
    /// data-entry mistake
    EmptyComponents(ProductId),
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::EmptyComponents(parent) => {
                write!(f, "nomenclature for {} has no components", parent)
            }
        }
    }
}

/// Snapshot of the catalog as the resolver sees it
pub trait BomSource {
    /// Active nomenclature edges: one entry per parent with an active version
    fn active_nomenclatures(&self) -> Vec<(&ProductId, &[ComponentLine])>;

    /// Returns true if the product exists in the catalog
    fn product_exists(&self, id: &ProductId) -> bool;

    /// Returns the product's kind, if it exists
    fn product_kind(&self, id: &ProductId) -> Option<ProductKind>;
}

/// Resolver over one catalog snapshot
///
/// Edges point from parent to component and carry the quantity per unit
/// of the parent.
pub struct BomResolver<'a, S: BomSource> {
    source: &'a S,
    graph: DiGraph<ProductId, Decimal>,
    node_map: HashMap<ProductId, NodeIndex>,
}

impl<'a, S: BomSource> BomResolver<'a, S> {
    /// Builds the resolver from a catalog snapshot
    pub fn new(source: &'a S) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<ProductId, NodeIndex> = HashMap::new();

        for (parent, components) in source.active_nomenclatures() {
            let parent_idx = Self::intern(&mut graph, &mut node_map, parent);
            for line in components {
                let component_idx = Self::intern(&mut graph, &mut node_map, &line.product);
                graph.add_edge(parent_idx, component_idx, line.quantity);
            }
        }

        Self {
            source,
            graph,
            node_map,
        }
    }

    fn intern(
        graph: &mut DiGraph<ProductId, Decimal>,
        node_map: &mut HashMap<ProductId, NodeIndex>,
        id: &ProductId,
    ) -> NodeIndex {
        match node_map.get(id) {
            Some(idx) => *idx,
            None => {
                let idx = graph.add_node(id.clone());
                node_map.insert(id.clone(), idx);
                idx
            }
        }
    }

    /// Checks a candidate nomenclature before acceptance.
    ///
    /// Pure check: rejects unknown products, non-positive quantities,
    /// direct self-references, duplicate component lines and any component
    /// that can already reach the parent through the active graph (which
    /// would close a cycle). Returns warnings for accepted oddities.
    pub fn validate(
        &self,
        parent: &ProductId,
        components: &[ComponentLine],
    ) -> Result<Vec<ValidationWarning>, ResolveError> {
        if !self.source.product_exists(parent) {
            return Err(ResolveError::UnknownProduct(parent.clone()));
        }

        let mut seen = HashSet::new();
        for line in components {
            if !self.source.product_exists(&line.product) {
                return Err(ResolveError::UnknownProduct(line.product.clone()));
            }
            if line.quantity <= Decimal::ZERO {
                return Err(ResolveError::NonPositiveQuantity {
                    product: line.product.clone(),
                    quantity: line.quantity,
                });
            }
            if line.product == *parent {
                return Err(ResolveError::SelfReference(parent.clone()));
            }
            if !seen.insert(line.product.clone()) {
                return Err(ResolveError::DuplicateComponent(line.product.clone()));
            }
        }

        // Accepting parent -> component closes a cycle exactly when the
        // component already reaches the parent transitively.
        for line in components {
            if let Some(existing) = self.path_between(&line.product, parent) {
                let mut path = vec![parent.clone()];
                path.extend(existing);
                return Err(ResolveError::CycleDetected { path });
            }
        }

        let mut warnings = Vec::new();
        if components.is_empty() {
            warnings.push(ValidationWarning::EmptyComponents(parent.clone()));
        }
        Ok(warnings)
    }

    /// Explodes a product into total leaf requirements for `quantity` units.
    ///
    /// Leaves are products with no active nomenclature (or an explicitly
    /// empty one); their contributions sum across all paths from the root.
    pub fn explode(
        &self,
        parent: &ProductId,
        quantity: Decimal,
    ) -> Result<BTreeMap<ProductId, Decimal>, ResolveError> {
        if quantity <= Decimal::ZERO {
            return Err(ResolveError::NonPositiveQuantity {
                product: parent.clone(),
                quantity,
            });
        }
        if !self.source.product_exists(parent) {
            return Err(ResolveError::UnknownProduct(parent.clone()));
        }

        let mut totals = BTreeMap::new();
        let mut path = Vec::new();
        self.walk(parent, quantity, &mut path, &mut totals)?;
        Ok(totals)
    }

    fn walk(
        &self,
        product: &ProductId,
        multiplier: Decimal,
        path: &mut Vec<ProductId>,
        totals: &mut BTreeMap<ProductId, Decimal>,
    ) -> Result<(), ResolveError> {
        // Revisit within the current path means the stored graph itself is
        // cyclic: validation was bypassed. Report the loop, not the walk.
        if let Some(start) = path.iter().position(|p| p == product) {
            let mut cycle = path[start..].to_vec();
            cycle.push(product.clone());
            return Err(ResolveError::CycleDetected { path: cycle });
        }

        let children: Vec<(ProductId, Decimal)> = match self.node_map.get(product) {
            Some(idx) => self
                .graph
                .edges(*idx)
                .map(|edge| (self.graph[edge.target()].clone(), *edge.weight()))
                .collect(),
            None => Vec::new(),
        };

        if children.is_empty() {
            *totals.entry(product.clone()).or_default() += multiplier;
            return Ok(());
        }

        path.push(product.clone());
        for (child, per_unit) in children {
            self.walk(&child, multiplier * per_unit, path, totals)?;
        }
        path.pop();

        Ok(())
    }

    /// Returns a path `from -> ... -> to` through the active graph, if one
    /// exists. Used to report the full would-be cycle on rejection.
    fn path_between(&self, from: &ProductId, to: &ProductId) -> Option<Vec<ProductId>> {
        let from_idx = *self.node_map.get(from)?;
        let to_idx = *self.node_map.get(to)?;

        let mut visited = HashSet::new();
        let mut path = Vec::new();
        if self.dfs_path(from_idx, to_idx, &mut visited, &mut path) {
            Some(path.into_iter().map(|idx| self.graph[idx].clone()).collect())
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
    ) -> bool {
        if !visited.insert(current) {
            return false;
        }
        path.push(current);

        if current == target {
            return true;
        }
        for edge in self.graph.edges(current) {
            if self.dfs_path(edge.target(), target, visited, path) {
                return true;
            }
        }

        path.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// In-memory catalog double for resolver tests
    #[derive(Default)]
    struct MemorySource {
        products: HashMap<ProductId, ProductKind>,
        nomenclatures: Vec<(ProductId, Vec<ComponentLine>)>,
    }

    impl MemorySource {
        fn product(&mut self, reference: &str, kind: ProductKind) -> ProductId {
            let id = ProductId::new(reference, Utc::now());
            self.products.insert(id.clone(), kind);
            id
        }

        fn nomenclature(&mut self, parent: &ProductId, lines: &[(&ProductId, &str)]) {
            let components = lines
                .iter()
                .map(|(id, qty)| ComponentLine::new((*id).clone(), dec(qty)))
                .collect();
            self.nomenclatures.push((parent.clone(), components));
        }
    }

    impl BomSource for MemorySource {
        fn active_nomenclatures(&self) -> Vec<(&ProductId, &[ComponentLine])> {
            self.nomenclatures
                .iter()
                .map(|(parent, components)| (parent, components.as_slice()))
                .collect()
        }

        fn product_exists(&self, id: &ProductId) -> bool {
            self.products.contains_key(id)
        }

        fn product_kind(&self, id: &ProductId) -> Option<ProductKind> {
            self.products.get(id).copied()
        }
    }

    #[test]
    fn explode_worked_example() {
        // A = 2 x B + 1 x C; B = 3 x D; C and D are leaves.
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Component);
        let c = source.product("C", ProductKind::Raw);
        let d = source.product("D", ProductKind::Raw);
        source.nomenclature(&a, &[(&b, "2"), (&c, "1")]);
        source.nomenclature(&b, &[(&d, "3")]);

        let resolver = BomResolver::new(&source);
        let totals = resolver.explode(&a, Decimal::ONE).unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&d], dec("6"));
        assert_eq!(totals[&c], dec("1"));
    }

    #[test]
    fn explode_leaf_returns_itself() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Raw);

        let resolver = BomResolver::new(&source);
        let totals = resolver.explode(&a, dec("4.5")).unwrap();

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&a], dec("4.5"));
    }

    #[test]
    fn explode_scales_linearly() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Raw);
        let c = source.product("C", ProductKind::Raw);
        source.nomenclature(&a, &[(&b, "0.25"), (&c, "7")]);

        let resolver = BomResolver::new(&source);
        let single = resolver.explode(&a, dec("3")).unwrap();
        let double = resolver.explode(&a, dec("6")).unwrap();

        for (product, quantity) in &single {
            assert_eq!(double[product], quantity * dec("2"));
        }
    }

    #[test]
    fn explode_sums_across_paths() {
        // Diamond: A uses B and C, both use D.
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Component);
        let c = source.product("C", ProductKind::Component);
        let d = source.product("D", ProductKind::Raw);
        source.nomenclature(&a, &[(&b, "1"), (&c, "2")]);
        source.nomenclature(&b, &[(&d, "5")]);
        source.nomenclature(&c, &[(&d, "0.5")]);

        let resolver = BomResolver::new(&source);
        let totals = resolver.explode(&a, Decimal::ONE).unwrap();

        // 1*5 through B plus 2*0.5 through C
        assert_eq!(totals[&d], dec("6"));
    }

    #[test]
    fn explode_treats_empty_nomenclature_as_leaf() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Component);
        source.nomenclature(&a, &[(&b, "2")]);
        source.nomenclature(&b, &[]);

        let resolver = BomResolver::new(&source);
        let totals = resolver.explode(&a, Decimal::ONE).unwrap();

        assert_eq!(totals[&b], dec("2"));
    }

    #[test]
    fn explode_decimal_quantities_stay_exact() {
        // 10 levels of 0.1 each: naive floats drift, decimals must not.
        let mut source = MemorySource::default();
        let products: Vec<ProductId> = (0..11)
            .map(|i| source.product(&format!("P{}", i), ProductKind::Component))
            .collect();
        for pair in products.windows(2) {
            source.nomenclature(&pair[0], &[(&pair[1], "0.1")]);
        }

        let resolver = BomResolver::new(&source);
        let totals = resolver.explode(&products[0], dec("10000000000")).unwrap();

        assert_eq!(totals[&products[10]], dec("1"));
    }

    #[test]
    fn explode_rejects_non_positive_quantity() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Raw);

        let resolver = BomResolver::new(&source);
        let result = resolver.explode(&a, Decimal::ZERO);

        assert!(matches!(
            result,
            Err(ResolveError::NonPositiveQuantity { .. })
        ));
    }

    #[test]
    fn explode_rejects_unknown_product() {
        let source = MemorySource::default();
        let resolver = BomResolver::new(&source);
        let ghost = ProductId::new("ghost", Utc::now());

        assert_eq!(
            resolver.explode(&ghost, Decimal::ONE),
            Err(ResolveError::UnknownProduct(ghost))
        );
    }

    #[test]
    fn explode_detects_out_of_band_cycle() {
        // The source already contains A -> B -> A, bypassing validation.
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Component);
        let b = source.product("B", ProductKind::Component);
        source.nomenclature(&a, &[(&b, "1")]);
        source.nomenclature(&b, &[(&a, "1")]);

        let resolver = BomResolver::new(&source);
        let err = resolver.explode(&a, Decimal::ONE).unwrap_err();

        assert!(err.is_integrity_fault());
        match err {
            ResolveError::CycleDetected { path } => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&a));
                assert!(path.contains(&b));
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn validate_accepts_valid_submission() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Raw);

        let resolver = BomResolver::new(&source);
        let warnings = resolver
            .validate(&a, &[ComponentLine::new(b, dec("2"))])
            .unwrap();

        assert!(warnings.is_empty());
    }

    #[test]
    fn validate_warns_on_empty_components() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);

        let resolver = BomResolver::new(&source);
        let warnings = resolver.validate(&a, &[]).unwrap();

        assert_eq!(warnings, vec![ValidationWarning::EmptyComponents(a)]);
    }

    #[test]
    fn validate_rejects_self_reference() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);

        let resolver = BomResolver::new(&source);
        let result = resolver.validate(&a, &[ComponentLine::new(a.clone(), dec("1"))]);

        assert_eq!(result, Err(ResolveError::SelfReference(a)));
    }

    #[test]
    fn validate_rejects_duplicate_component() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Raw);

        let resolver = BomResolver::new(&source);
        let result = resolver.validate(
            &a,
            &[
                ComponentLine::new(b.clone(), dec("1")),
                ComponentLine::new(b.clone(), dec("2")),
            ],
        );

        assert_eq!(result, Err(ResolveError::DuplicateComponent(b)));
    }

    #[test]
    fn validate_rejects_unknown_parent_and_component() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let ghost = ProductId::new("ghost", Utc::now());

        let resolver = BomResolver::new(&source);

        assert_eq!(
            resolver.validate(&ghost, &[]),
            Err(ResolveError::UnknownProduct(ghost.clone()))
        );
        assert_eq!(
            resolver.validate(&a, &[ComponentLine::new(ghost.clone(), dec("1"))]),
            Err(ResolveError::UnknownProduct(ghost))
        );
    }

    #[test]
    fn validate_rejects_non_positive_quantity() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Raw);

        let resolver = BomResolver::new(&source);
        let result = resolver.validate(&a, &[ComponentLine::new(b.clone(), dec("-3"))]);

        assert_eq!(
            result,
            Err(ResolveError::NonPositiveQuantity {
                product: b,
                quantity: dec("-3"),
            })
        );
    }

    #[test]
    fn validate_rejects_transitive_cycle() {
        // A contains B, B contains C; a nomenclature for C containing A
        // would close the loop.
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Component);
        let c = source.product("C", ProductKind::Component);
        source.nomenclature(&a, &[(&b, "1")]);
        source.nomenclature(&b, &[(&c, "1")]);

        let resolver = BomResolver::new(&source);
        let err = resolver
            .validate(&c, &[ComponentLine::new(a.clone(), dec("1"))])
            .unwrap_err();

        match err {
            ResolveError::CycleDetected { path } => {
                // Reported as the full would-be cycle: C -> A -> B -> C
                assert_eq!(path.first(), Some(&c));
                assert_eq!(path.last(), Some(&c));
                assert!(path.contains(&a));
                assert!(path.contains(&b));
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn validate_accepts_edge_that_does_not_close_cycle() {
        // A contains B; a nomenclature for C containing B is fine.
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Component);
        let c = source.product("C", ProductKind::Finished);
        source.nomenclature(&a, &[(&b, "1")]);

        let resolver = BomResolver::new(&source);
        let warnings = resolver
            .validate(&c, &[ComponentLine::new(b, dec("4"))])
            .unwrap();

        assert!(warnings.is_empty());
    }

    #[test]
    fn validation_does_not_mutate_the_graph() {
        let mut source = MemorySource::default();
        let a = source.product("A", ProductKind::Finished);
        let b = source.product("B", ProductKind::Raw);
        source.nomenclature(&a, &[(&b, "2")]);

        let resolver = BomResolver::new(&source);
        let _ = resolver.validate(&b, &[ComponentLine::new(a.clone(), dec("1"))]);

        // Rejected submission leaves the snapshot untouched
        let totals = resolver.explode(&a, Decimal::ONE).unwrap();
        assert_eq!(totals[&b], dec("2"));
    }
}
