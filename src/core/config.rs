use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::core::error::Result;

/// Which candidate set facet counts are computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetScope {
    #[default]
    Filtered,   // After filter_by, before pagination
    Unfiltered, // Before filter_by
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strict_fields: bool,                // Missing/unknown filter and sort fields are errors
    pub facet_scope: FacetScope,
    pub default_facet_size: usize,          // Distinct values reported per facet field
    pub field_weights: HashMap<String, f32>, // Text match weight per field, 1.0 when absent
    pub query_cache_size: usize,            // 0 disables the result cache
    pub default_page_size: Option<usize>,   // None returns every hit
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strict_fields: false,
            facet_scope: FacetScope::Filtered,
            default_facet_size: 10,
            field_weights: HashMap::new(),
            query_cache_size: 256,
            default_page_size: None,
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn field_weight(&self, field: &str) -> f32 {
        self.field_weights.get(field).copied().unwrap_or(1.0)
    }
}
