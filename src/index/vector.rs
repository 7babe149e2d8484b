use std::collections::HashMap;
use rayon::prelude::*;
use roaring::RoaringTreemap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, FieldValue};

/// Fixed-dimension vectors of one field, searched by exhaustive L2 scan
pub struct VectorIndex {
    pub field: String,
    pub dimensions: usize,
    vectors: HashMap<DocId, Vec<f32>>,
}

impl VectorIndex {
    pub fn new(field: &str, dimensions: usize) -> Self {
        VectorIndex {
            field: field.to_string(),
            dimensions,
            vectors: HashMap::new(),
        }
    }

    pub fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::new(
                ErrorKind::DimensionMismatch,
                format!("field '{}' has {} dimensions, vector has {}", self.field, self.dimensions, vector.len()),
            ));
        }
        Ok(())
    }

    pub fn insert(&mut self, doc_id: DocId, vector: Vec<f32>) -> Result<()> {
        self.check_dimensions(&vector)?;
        self.vectors.insert(doc_id, vector);
        Ok(())
    }

    pub fn remove(&mut self, doc_id: DocId) -> bool {
        self.vectors.remove(&doc_id).is_some()
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.vectors.contains_key(&doc_id)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Nearest neighbours of `query` among `candidates` (all vectors when None),
    /// ascending by distance, ties by doc id. `top_k` of None keeps every match.
    pub fn search(
        &self,
        query: &[f32],
        top_k: Option<usize>,
        candidates: Option<&RoaringTreemap>,
    ) -> Result<Vec<(DocId, f32)>> {
        self.check_dimensions(query)?;

        let mut hits: Vec<(DocId, f32)> = self.vectors
            .par_iter()
            .filter(|(doc_id, _)| candidates.is_none_or(|c| c.contains(doc_id.0)))
            .map(|(doc_id, vector)| (*doc_id, euclidean_distance(query, vector)))
            .collect();

        hits.sort_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| a.0.cmp(&b.0))
        });

        if let Some(k) = top_k {
            hits.truncate(k);
        }
        Ok(hits)
    }
}

/// Numeric array as a vector; None when any element is not a number
pub fn vector_from_value(value: &FieldValue) -> Option<Vec<f32>> {
    value.as_array()?
        .iter()
        .map(|v| v.as_number().map(|n| n as f32))
        .collect()
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embeddings() -> VectorIndex {
        let mut index = VectorIndex::new("embeddings", 3);
        index.insert(DocId(1), vec![1.2, 2.3, 4.5]).unwrap();
        index.insert(DocId(2), vec![6.7, 8.2, 9.2]).unwrap();
        index
    }

    #[test]
    fn results_ascend_by_distance() {
        let hits = embeddings().search(&[1.0, 2.1, 3.2], None, None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, DocId(1));
        assert!(hits[0].1 < hits[1].1);
        assert!((hits[0].1 - euclidean_distance(&[1.0, 2.1, 3.2], &[1.2, 2.3, 4.5])).abs() < 1e-6);
    }

    #[test]
    fn candidates_and_top_k_restrict() {
        let index = embeddings();
        let only_two: RoaringTreemap = [2u64].into_iter().collect();
        let hits = index.search(&[1.0, 2.1, 3.2], None, Some(&only_two)).unwrap();
        assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![DocId(2)]);

        let hits = index.search(&[1.0, 2.1, 3.2], Some(1), None).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut index = embeddings();
        let err = index.search(&[1.0, 2.0], None, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DimensionMismatch);
        assert_eq!(index.insert(DocId(3), vec![0.0; 4]).unwrap_err().kind, ErrorKind::DimensionMismatch);
    }

    #[test]
    fn vectors_from_stored_values() {
        let value = FieldValue::Array(vec![FieldValue::from(1.5), FieldValue::from(2)]);
        assert_eq!(vector_from_value(&value), Some(vec![1.5, 2.0]));
        assert_eq!(vector_from_value(&FieldValue::Array(vec![FieldValue::from("x")])), None);
        assert_eq!(vector_from_value(&FieldValue::from(1.0)), None);
    }

    #[test]
    fn equal_distances_tie_break_on_doc_id() {
        let mut index = VectorIndex::new("v", 1);
        index.insert(DocId(9), vec![1.0]).unwrap();
        index.insert(DocId(4), vec![-1.0]).unwrap();
        let hits = index.search(&[0.0], None, None).unwrap();
        assert_eq!(hits[0].0, DocId(4));
        assert_eq!(hits[1].0, DocId(9));
    }
}
