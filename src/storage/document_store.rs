use std::collections::{BTreeMap, HashMap};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};

/// Primary document storage for one index.
///
/// Documents are keyed by caller id; each id is bound to a `DocId`
/// sequence number on first insert and keeps it across replacements,
/// so the sequence doubles as the insertion-order tie-break.
#[derive(Default)]
pub struct DocumentStore {
    documents: BTreeMap<DocId, Document>,
    ids: HashMap<String, DocId>,
    next_id: u64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id. Returns the sequence number and the replaced document.
    pub fn put(&mut self, doc: Document) -> (DocId, Option<Document>) {
        match self.ids.get(&doc.id) {
            Some(&doc_id) => {
                let previous = self.documents.insert(doc_id, doc);
                (doc_id, previous)
            }
            None => {
                let doc_id = DocId(self.next_id);
                self.next_id += 1;
                self.ids.insert(doc.id.clone(), doc_id);
                self.documents.insert(doc_id, doc);
                (doc_id, None)
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<&Document> {
        self.ids
            .get(id)
            .and_then(|doc_id| self.documents.get(doc_id))
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("document '{}' not found", id)))
    }

    /// Found documents in request order; missing ids are skipped
    pub fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&Document> {
        ids.iter()
            .filter_map(|id| self.get(id.as_ref()).ok())
            .collect()
    }

    pub fn delete(&mut self, id: &str) -> Option<(DocId, Document)> {
        let doc_id = self.ids.remove(id)?;
        self.documents.remove(&doc_id).map(|doc| (doc_id, doc))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.documents.get(&doc_id)
    }

    /// Documents in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.documents.iter().map(|(id, doc)| (*id, doc))
    }

    /// Drop every document, handing them back in insertion order
    pub fn drain(&mut self) -> Vec<Document> {
        self.ids.clear();
        std::mem::take(&mut self.documents).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
