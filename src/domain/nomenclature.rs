//! Nomenclature (bill-of-materials) model
//!
//! A nomenclature version lists the components and quantities needed to
//! build one unit of a parent product. Versions are created atomically
//! with their full component list and are immutable afterwards: edits
//! create a new version so historical explosions stay reproducible.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{NomenclatureId, ProductId};

/// One component line of a nomenclature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentLine {
    /// The component product
    pub product: ProductId,

    /// Quantity per unit of the parent, in the component's own unit
    pub quantity: Decimal,
}

impl ComponentLine {
    pub fn new(product: ProductId, quantity: Decimal) -> Self {
        Self { product, quantity }
    }
}

/// A versioned bill of materials for a parent product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NomenclatureVersion {
    /// Unique identifier
    pub id: NomenclatureId,

    /// The product this nomenclature builds
    pub parent: ProductId,

    /// Version label, not required to be numeric ("1.0", "2024-rev-b", ...)
    pub version: String,

    /// Ordered component lines
    pub components: Vec<ComponentLine>,

    /// Explicit active flag, honored by the `flagged` selection policy
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub active: bool,

    /// When the version was created
    pub created_at: DateTime<Utc>,
}

impl NomenclatureVersion {
    /// Creates a new version with its full component list
    pub fn new(
        parent: ProductId,
        version: impl Into<String>,
        components: Vec<ComponentLine>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NomenclatureId::new(&parent.to_string(), now),
            parent,
            version: version.into(),
            components,
            active: false,
            created_at: now,
        }
    }

    /// Marks this version as explicitly active
    pub fn flag_active(mut self) -> Self {
        self.active = true;
        self
    }

    /// Returns true if the component list is empty (leaf substitute)
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// How the active version is selected among a parent's versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActiveVersionPolicy {
    /// Most recently created version wins
    #[default]
    Latest,
    /// Most recent version flagged active wins, falling back to latest
    Flagged,
}

impl ActiveVersionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveVersionPolicy::Latest => "latest",
            ActiveVersionPolicy::Flagged => "flagged",
        }
    }

    /// Selects the active version among all versions of one parent.
    ///
    /// Ties on `created_at` are broken by position: the later entry wins,
    /// matching insertion order in the store.
    pub fn select<'a>(
        &self,
        versions: impl IntoIterator<Item = &'a NomenclatureVersion>,
    ) -> Option<&'a NomenclatureVersion> {
        let mut latest: Option<&NomenclatureVersion> = None;
        let mut flagged: Option<&NomenclatureVersion> = None;

        for version in versions {
            if latest.map_or(true, |best| version.created_at >= best.created_at) {
                latest = Some(version);
            }
            if version.active
                && flagged.map_or(true, |best| version.created_at >= best.created_at)
            {
                flagged = Some(version);
            }
        }

        match self {
            ActiveVersionPolicy::Latest => latest,
            ActiveVersionPolicy::Flagged => flagged.or(latest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn make_parent() -> ProductId {
        ProductId::new("PARENT", Utc::now())
    }

    fn make_version(parent: &ProductId, label: &str) -> NomenclatureVersion {
        NomenclatureVersion::new(
            parent.clone(),
            label,
            vec![ComponentLine::new(
                ProductId::new("COMP", Utc::now()),
                dec("2.5"),
            )],
        )
    }

    #[test]
    fn new_version_is_not_flagged() {
        let parent = make_parent();
        let version = make_version(&parent, "1.0");

        assert!(!version.active);
        assert!(!version.is_empty());
        assert_eq!(version.version, "1.0");
    }

    #[test]
    fn latest_policy_picks_most_recent() {
        let parent = make_parent();
        let v1 = make_version(&parent, "1.0");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let v2 = make_version(&parent, "2.0");

        let selected = ActiveVersionPolicy::Latest.select([&v1, &v2]).unwrap();
        assert_eq!(selected.version, "2.0");
    }

    #[test]
    fn flagged_policy_prefers_flagged_version() {
        let parent = make_parent();
        let v1 = make_version(&parent, "1.0").flag_active();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let v2 = make_version(&parent, "2.0");

        // Latest would pick 2.0; flagged picks the explicitly active 1.0
        let selected = ActiveVersionPolicy::Flagged.select([&v1, &v2]).unwrap();
        assert_eq!(selected.version, "1.0");
    }

    #[test]
    fn flagged_policy_falls_back_to_latest() {
        let parent = make_parent();
        let v1 = make_version(&parent, "1.0");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let v2 = make_version(&parent, "2.0");

        let selected = ActiveVersionPolicy::Flagged.select([&v1, &v2]).unwrap();
        assert_eq!(selected.version, "2.0");
    }

    #[test]
    fn select_on_empty_set_is_none() {
        assert!(ActiveVersionPolicy::Latest.select([]).is_none());
        assert!(ActiveVersionPolicy::Flagged.select([]).is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let parent = make_parent();
        let version = make_version(&parent, "1.0").flag_active();

        let json = serde_json::to_string(&version).unwrap();
        let parsed: NomenclatureVersion = serde_json::from_str(&json).unwrap();

        assert_eq!(version, parsed);
    }

    #[test]
    fn inactive_flag_is_omitted_from_json() {
        let parent = make_parent();
        let version = make_version(&parent, "1.0");

        let json = serde_json::to_string(&version).unwrap();
        assert!(!json.contains("\"active\""));
    }
}
