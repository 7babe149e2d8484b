use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::core::types::{DocId, Document};

/// Search response: projected hits plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub hits: Vec<Hit>,
    pub meta: SearchMeta,
}

impl SearchResult {
    pub fn found(&self) -> usize {
        self.meta.found
    }

    pub fn facet(&self, field: &str) -> Option<&FacetDistribution> {
        self.meta.facets.get(field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMeta {
    pub found: usize,  // Candidates after filtering, before pagination
    pub facets: BTreeMap<String, FacetDistribution>,
    pub page: PageInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current: usize,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub doc: Value,
    pub meta: HitMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitMeta {
    pub text_match: TextMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatch {
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_distance: Option<f32>,
}

/// Per-value counts for one facet field, most frequent first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetDistribution {
    pub counts: Vec<FacetCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<FacetStats>,
}

impl FacetDistribution {
    /// Count for `value`, 0 when absent
    pub fn count(&self, value: &str) -> u64 {
        self.counts.iter()
            .find(|c| c.value == value)
            .map_or(0, |c| c.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: u64,
}

/// Aggregates over the numeric values of a facet field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacetStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
    pub count: u64,
}

/// Candidate carried through the executor pipeline
#[derive(Debug, Clone)]
pub struct ScoredDocument<'a> {
    pub doc_id: DocId,
    pub score: f32,
    pub vector_distance: Option<f32>,
    pub document: &'a Document,
}
