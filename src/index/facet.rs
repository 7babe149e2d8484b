use std::collections::{BTreeMap, HashMap};
use roaring::RoaringTreemap;
use crate::core::types::{DocId, FieldValue};
use crate::search::results::{FacetCount, FacetDistribution, FacetStats};

/// Value -> document set for one facet-enabled field
pub struct FacetIndex {
    pub field: String,
    buckets: BTreeMap<String, RoaringTreemap>,
    doc_values: HashMap<DocId, Vec<FieldValue>>,  // Scalars indexed per document
}

impl FacetIndex {
    pub fn new(field: &str) -> Self {
        FacetIndex {
            field: field.to_string(),
            buckets: BTreeMap::new(),
            doc_values: HashMap::new(),
        }
    }

    /// Arrays contribute one bucket entry per element
    pub fn add_document(&mut self, doc_id: DocId, value: &FieldValue) {
        self.remove_document(doc_id);

        let scalars: Vec<FieldValue> = match value {
            FieldValue::Array(items) => items.iter().filter(|v| v.facet_key().is_some()).cloned().collect(),
            other if other.facet_key().is_some() => vec![other.clone()],
            _ => Vec::new(),
        };
        if scalars.is_empty() {
            return;
        }

        for scalar in &scalars {
            if let Some(key) = scalar.facet_key() {
                self.buckets.entry(key).or_default().insert(doc_id.0);
            }
        }
        self.doc_values.insert(doc_id, scalars);
    }

    pub fn remove_document(&mut self, doc_id: DocId) -> bool {
        let Some(values) = self.doc_values.remove(&doc_id) else {
            return false;
        };

        for key in values.iter().filter_map(FieldValue::facet_key) {
            if let Some(bucket) = self.buckets.get_mut(&key) {
                bucket.remove(doc_id.0);
                if bucket.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
        true
    }

    pub fn bucket(&self, key: &str) -> Option<&RoaringTreemap> {
        self.buckets.get(key)
    }

    pub fn value_count(&self) -> usize {
        self.buckets.len()
    }

    /// Count candidates per value: each bucket is intersected with the
    /// candidate set. At most `size` values, most frequent first.
    pub fn counts(&self, candidates: &RoaringTreemap, size: usize) -> FacetDistribution {
        let mut counts: Vec<FacetCount> = self.buckets
            .iter()
            .map(|(value, bucket)| FacetCount {
                value: value.clone(),
                count: (bucket & candidates).len(),
            })
            .filter(|c| c.count > 0)
            .collect();

        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        counts.truncate(size);

        FacetDistribution {
            counts,
            stats: self.numeric_stats(candidates),
        }
    }

    fn numeric_stats(&self, candidates: &RoaringTreemap) -> Option<FacetStats> {
        let mut stats: Option<FacetStats> = None;

        for (doc_id, values) in &self.doc_values {
            if !candidates.contains(doc_id.0) {
                continue;
            }
            for n in values.iter().filter_map(FieldValue::as_number) {
                let s = stats.get_or_insert(FacetStats {
                    min: n,
                    max: n,
                    sum: 0.0,
                    avg: 0.0,
                    count: 0,
                });
                s.min = s.min.min(n);
                s.max = s.max.max(n);
                s.sum += n;
                s.count += 1;
            }
        }

        stats.map(|mut s| {
            s.avg = s.sum / s.count as f64;
            s
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brands() -> FacetIndex {
        let mut index = FacetIndex::new("brand");
        for (id, brand) in [(1, "michael kors"), (2, "coach"), (3, "coach"), (4, "adidas"), (5, "nike"), (6, "adidas")] {
            index.add_document(DocId(id), &FieldValue::from(brand));
        }
        index
    }

    #[test]
    fn counts_only_candidates() {
        let index = brands();
        let candidates: RoaringTreemap = [2u64, 3, 4].into_iter().collect();
        let dist = index.counts(&candidates, 10);

        assert_eq!(dist.counts, vec![
            FacetCount { value: "coach".into(), count: 2 },
            FacetCount { value: "adidas".into(), count: 1 },
        ]);
        assert_eq!(dist.count("nike"), 0);
        assert!(dist.stats.is_none());
    }

    #[test]
    fn size_truncates_least_frequent() {
        let index = brands();
        let all: RoaringTreemap = (1u64..=6).collect();
        let dist = index.counts(&all, 2);
        let values: Vec<&str> = dist.counts.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["adidas", "coach"]);
    }

    #[test]
    fn removal_empties_buckets() {
        let mut index = brands();
        assert!(index.remove_document(DocId(5)));
        assert!(index.bucket("nike").is_none());
        assert_eq!(index.value_count(), 3);
        assert!(!index.remove_document(DocId(5)));
    }

    #[test]
    fn arrays_and_numeric_stats() {
        let mut index = FacetIndex::new("sizes");
        index.add_document(DocId(1), &FieldValue::Array(vec![FieldValue::from(40), FieldValue::from(42)]));
        index.add_document(DocId(2), &FieldValue::from(42));

        let all: RoaringTreemap = [1u64, 2].into_iter().collect();
        let dist = index.counts(&all, 10);
        assert_eq!(dist.count("42"), 2);
        assert_eq!(dist.count("40"), 1);

        let stats = dist.stats.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 40.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.sum, 124.0);
    }
}
