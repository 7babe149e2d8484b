use crate::core::types::DocId;

#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,       // Term frequency within the field
}

/// Posting list for a term
/// Note: Sorted by doc_id so lookups and removals are binary searches
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    pub postings: Vec<Posting>,  // Sorted by doc_id
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    pub fn add_posting(&mut self, posting: Posting) {
        match self.postings.binary_search_by_key(&posting.doc_id, |p| p.doc_id) {
            Ok(pos) => {
                // Update existing posting
                self.postings[pos] = posting;
            }
            Err(pos) => {
                self.postings.insert(pos, posting);
            }
        }
    }

    pub fn remove(&mut self, doc_id: DocId) -> bool {
        match self.postings.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(pos) => {
                self.postings.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|pos| &self.postings[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Posting> {
        self.postings.iter()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
