//! Region projection for desired function definitions.
//!
//! A desired definition names the regions it should run in. Projection turns
//! it into one independent, fully qualified record per region and groups the
//! records by region.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{FunctionDefinition, QualifiedName};

/// Fully qualified desired records grouped by region.
///
/// Every record in a region's list carries that region in its name and has no
/// `regions` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegionMap {
    regions: BTreeMap<String, Vec<FunctionDefinition>>,
}

/// Projects desired definitions into per-region records.
#[derive(Debug, Clone)]
pub struct RegionMapper {
    /// Project the records are qualified with.
    project_id: String,
}

impl RegionMapper {
    /// Creates a mapper for the given project.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }

    /// Projects each definition into every region it targets.
    ///
    /// Definitions without regions go to the default region. Input order is
    /// preserved within each region's list.
    #[must_use]
    pub fn map(&self, definitions: &[FunctionDefinition]) -> RegionMap {
        let mut map = RegionMap::default();

        for definition in definitions {
            for region in definition.effective_regions() {
                let mut record = definition.clone();
                record.regions = None;
                record.name = QualifiedName::format(&self.project_id, region, &definition.name);

                debug!("Projected {} into {region}", definition.name);
                map.push(region, record);
            }
        }

        map
    }
}

impl RegionMap {
    /// Appends a record to a region's list.
    pub fn push(&mut self, region: impl Into<String>, record: FunctionDefinition) {
        self.regions.entry(region.into()).or_default().push(record);
    }

    /// Returns the records for a region.
    #[must_use]
    pub fn get(&self, region: &str) -> Option<&[FunctionDefinition]> {
        self.regions.get(region).map(Vec::as_slice)
    }

    /// Iterates over region identifiers in order.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Iterates over `(region, records)` pairs in region order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FunctionDefinition])> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true if no region has any record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Returns the total number of records across all regions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }

    /// Concatenates every region's records in region order.
    #[must_use]
    pub fn flatten(&self) -> Vec<FunctionDefinition> {
        self.regions.values().flatten().cloned().collect()
    }
}

impl IntoIterator for RegionMap {
    type Item = (String, Vec<FunctionDefinition>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Vec<FunctionDefinition>>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}

impl FromIterator<(String, FunctionDefinition)> for RegionMap {
    fn from_iter<I: IntoIterator<Item = (String, FunctionDefinition)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (region, record) in iter {
            map.push(region, record);
        }
        map
    }
}
