use std::collections::{BTreeMap, HashMap};
use crate::analysis::token::Token;
use crate::core::types::DocId;
use crate::index::inverted::{InvertedIndex, Term};

/// One inverted index per searchable text field
pub struct TextIndex {
    pub fields: BTreeMap<String, InvertedIndex>,
}

impl TextIndex {
    pub fn new<I: IntoIterator<Item = String>>(fields: I) -> Self {
        TextIndex {
            fields: fields.into_iter()
                .map(|field| {
                    let index = InvertedIndex::new(&field);
                    (field, index)
                })
                .collect(),
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Index analysed field values. Fields without an inverted index are ignored.
    pub fn index_document(&mut self, doc_id: DocId, field_tokens: &[(String, Vec<Token>)]) {
        for (field, tokens) in field_tokens {
            if let Some(index) = self.fields.get_mut(field) {
                index.add_document(doc_id, tokens);
            }
        }
    }

    pub fn remove_document(&mut self, doc_id: DocId) {
        for index in self.fields.values_mut() {
            index.remove_document(doc_id);
        }
    }

    /// OR-match `terms` over `fields`; each candidate scores
    /// the sum of term frequency times field weight.
    pub fn query<W>(&self, terms: &[Term], fields: &[String], weight: W) -> HashMap<DocId, f32>
    where
        W: Fn(&str) -> f32,
    {
        let mut scores = HashMap::new();
        for field in fields {
            if let Some(index) = self.fields.get(field) {
                index.accumulate_scores(terms, weight(field), &mut scores);
            }
        }
        scores
    }

    pub fn term_count(&self) -> usize {
        self.fields.values().map(|index| index.term_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::Analyzer;

    #[test]
    fn query_unions_fields_with_weights() {
        let analyzer = Analyzer::standard();
        let mut text = TextIndex::new(vec!["name".to_string(), "labels".to_string()]);
        text.index_document(DocId(1), &[
            ("name".to_string(), analyzer.analyze("running shoes")),
            ("labels".to_string(), analyzer.analyze("shoes")),
        ]);
        text.index_document(DocId(2), &[("name".to_string(), analyzer.analyze("running shorts"))]);
        text.index_document(DocId(3), &[("unknown".to_string(), analyzer.analyze("shoes"))]);

        let fields = text.field_names();
        let scores = text.query(&[Term::new("shoes")], &fields, |f| if f == "labels" { 2.0 } else { 1.0 });
        assert_eq!(scores.len(), 1);
        assert_eq!(scores.get(&DocId(1)), Some(&3.0));

        let scores = text.query(&[Term::new("running")], &["labels".to_string()], |_| 1.0);
        assert!(scores.is_empty());
    }

    #[test]
    fn removal_clears_all_fields() {
        let analyzer = Analyzer::standard();
        let mut text = TextIndex::new(vec!["name".to_string()]);
        text.index_document(DocId(7), &[("name".to_string(), analyzer.analyze("tote bag"))]);
        text.remove_document(DocId(7));
        assert_eq!(text.term_count(), 0);
    }
}
