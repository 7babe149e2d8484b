use std::collections::HashMap;
use crate::analysis::token::Token;
use crate::core::types::DocId;
use crate::index::posting::{Posting, PostingList};

/// Term representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term(String);

impl Term {
    pub fn new(text: &str) -> Self {
        Term(text.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Inverted index over a single text field
pub struct InvertedIndex {
    pub field: String,
    pub postings: HashMap<Term, PostingList>,
    doc_terms: HashMap<DocId, Vec<Term>>,  // Reverse map, used on delete/update
}

impl InvertedIndex {
    pub fn new(field: &str) -> Self {
        InvertedIndex {
            field: field.to_string(),
            postings: HashMap::new(),
            doc_terms: HashMap::new(),
        }
    }

    pub fn add_document(&mut self, doc_id: DocId, tokens: &[Token]) {
        // Re-indexing replaces whatever the document had before
        self.remove_document(doc_id);
        if tokens.is_empty() {
            return;
        }

        let mut term_freqs: HashMap<Term, u32> = HashMap::new();
        for token in tokens {
            *term_freqs.entry(Term::new(&token.text)).or_insert(0) += 1;
        }

        let mut terms = Vec::with_capacity(term_freqs.len());
        for (term, term_freq) in term_freqs {
            self.postings.entry(term.clone())
                .or_insert_with(PostingList::new)
                .add_posting(Posting { doc_id, term_freq });
            terms.push(term);
        }
        self.doc_terms.insert(doc_id, terms);
    }

    pub fn remove_document(&mut self, doc_id: DocId) -> bool {
        let Some(terms) = self.doc_terms.remove(&doc_id) else {
            return false;
        };

        for term in terms {
            if let Some(list) = self.postings.get_mut(&term) {
                list.remove(doc_id);
                if list.is_empty() {
                    self.postings.remove(&term);
                }
            }
        }
        true
    }

    pub fn search_term(&self, term: &Term) -> Option<&PostingList> {
        self.postings.get(term)
    }

    /// Add `term_freq * weight` for every posting of every term into `scores`
    pub fn accumulate_scores(&self, terms: &[Term], weight: f32, scores: &mut HashMap<DocId, f32>) {
        for term in terms {
            if let Some(list) = self.search_term(term) {
                for posting in list.iter() {
                    *scores.entry(posting.doc_id).or_insert(0.0) += posting.term_freq as f32 * weight;
                }
            }
        }
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }
}
