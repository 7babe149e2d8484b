use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time statistics for one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub name: String,
    pub documents: usize,
    pub terms: usize,             // Distinct terms summed over text fields
    pub text_fields: Vec<String>,
    pub facet_fields: Vec<String>,
    pub vector_fields: Vec<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Index listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
