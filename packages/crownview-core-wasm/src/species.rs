use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::{Attributes, CrownPolygon};

/// Attribute fields that may hold the species label, tried in this order.
pub const SPECIES_FIELDS: &[&str] = &["species", "Species", "SPECIES", "sp", "class", "label"];

/// Spellings found in survey tables, mapped to the ids used in the viewer config.
/// Keys are compared after lower-casing and whitespace collapsing.
pub const SPECIES_ALIASES: &[(&str, &str)] = &[
    ("dead", "dead-understory"),
    ("dead understory", "dead-understory"),
    ("lime", "lime spp."),
    ("lime spp", "lime spp."),
];

/// The species ids listed in the viewer config.
#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    known: Vec<String>,
}

impl SpeciesCatalog {
    pub fn new<I, S>(species: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SpeciesCatalog {
            known: species.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    // Case-insensitive lookup returning the catalog's own spelling
    fn canonical(&self, name: &str) -> Option<&str> {
        self.known
            .iter()
            .find(|known| known.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Resolve the species of an attribute record.
    ///
    /// Takes the first non-empty text value among [`SPECIES_FIELDS`], normalises
    /// it through [`SPECIES_ALIASES`], and checks it against the catalog. An
    /// empty catalog accepts any normalised name.
    pub fn resolve(&self, attributes: &Attributes) -> Option<String> {
        let raw = SPECIES_FIELDS
            .iter()
            .filter_map(|field| attributes.get(*field))
            .filter_map(|value| value.as_text())
            .map(str::trim)
            .find(|text| !text.is_empty())?;

        let normalized = normalize_species(raw);
        if self.is_empty() {
            return Some(normalized);
        }
        self.canonical(&normalized).map(str::to_string)
    }
}

pub fn normalize_species(raw: &str) -> String {
    let collapsed = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    SPECIES_ALIASES
        .iter()
        .find(|(alias, _)| *alias == collapsed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(collapsed)
}

/// Keep the crowns whose resolved species is in `selected`.
pub fn filter_by_species(
    crowns: &[CrownPolygon],
    selected: &[String],
    catalog: &SpeciesCatalog,
) -> Vec<CrownPolygon> {
    let selected: HashSet<String> = selected.iter().map(|s| normalize_species(s)).collect();
    crowns
        .iter()
        .filter(|crown| {
            catalog
                .resolve(crown.properties())
                .is_some_and(|species| selected.contains(&normalize_species(&species)))
        })
        .cloned()
        .collect()
}

/// Crown totals per resolved species.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesCounts {
    pub by_species: BTreeMap<String, usize>,
    /// Crowns with no species label, or one the catalog does not know.
    pub unresolved: usize,
}

pub fn count_by_species(crowns: &[CrownPolygon], catalog: &SpeciesCatalog) -> SpeciesCounts {
    let mut counts = SpeciesCounts::default();
    for crown in crowns {
        match catalog.resolve(crown.properties()) {
            Some(species) => *counts.by_species.entry(species).or_insert(0) += 1,
            None => counts.unresolved += 1,
        }
    }
    counts
}
