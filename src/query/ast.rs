use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::query::filter::Filter;
use crate::query::sort::SortKey;

/// Search request. Every part is optional; the empty query returns all documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub q: Option<String>,
    pub search_fields: Vec<String>,  // Empty: every searchable text field
    pub filter_by: Option<Filter>,
    pub facet_by: Vec<FacetField>,
    #[serde(with = "crate::query::sort::sort_keys")]
    pub sort_by: Vec<SortKey>,       // Empty: relevance order
    pub include_fields: Vec<String>,
    pub exclude_fields: Vec<String>,
    pub vector_query: Option<VectorQuery>,
    pub page: Option<usize>,         // 1-based
    pub page_size: Option<usize>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetField {
    pub field: String,
    pub size: Option<usize>,  // Distinct values reported, config default when None
}

impl FacetField {
    pub fn new(field: &str) -> Self {
        FacetField { field: field.to_string(), size: None }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
}

impl From<&str> for FacetField {
    fn from(field: &str) -> Self {
        FacetField::new(field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQuery {
    pub field: String,
    pub vector: Vec<f32>,
    pub top_k: Option<usize>,  // Nearest neighbours among documents passing filter_by; None keeps all
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(q: &str) -> Self {
        Query {
            q: Some(q.to_string()),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn search_fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.search_fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter_by = Some(filter);
        self
    }

    pub fn facet(mut self, facet: impl Into<FacetField>) -> Self {
        self.facet_by.push(facet.into());
        self
    }

    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort_by.push(key);
        self
    }

    pub fn include<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.include_fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    pub fn exclude<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.exclude_fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    pub fn vector(mut self, field: &str, vector: Vec<f32>) -> Self {
        self.vector_query = Some(VectorQuery {
            field: field.to_string(),
            vector,
            top_k: None,
        });
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        if let Some(vq) = self.vector_query.as_mut() {
            vq.top_k = Some(k);
        }
        self
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Resolve paging into `(offset, limit)`. `page`/`page_size` take
    /// precedence over raw offset/limit.
    pub fn window(&self, default_page_size: Option<usize>) -> (usize, Option<usize>) {
        let size = self.page_size.or(self.limit).or(default_page_size);
        let offset = match (self.page, size) {
            (Some(page), Some(size)) => page.saturating_sub(1).saturating_mul(size),
            (Some(page), None) if page > 1 => usize::MAX,
            _ => self.offset.unwrap_or(0),
        };
        (offset, size)
    }
}
