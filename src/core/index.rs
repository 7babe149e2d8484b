use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::analysis::analyzer::Analyzer;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{IndexInfo, IndexStats};
use crate::core::types::{DocId, Document};
use crate::index::facet::FacetIndex;
use crate::index::text::TextIndex;
use crate::index::vector::VectorIndex;
use crate::parallel::indexer::{ParallelIndexer, PreparedDocument};
use crate::query::ast::Query;
use crate::query::cache::{CacheStats, QueryCache, QueryKey};
use crate::schema::schema::Schema;
use crate::search::executor::QueryExecutor;
use crate::search::results::SearchResult;
use crate::storage::document_store::DocumentStore;

/// Outcome of a single document write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocStatus {
    pub id: String,
    pub error: Option<String>,  // None on success
}

impl DocStatus {
    pub fn ok(id: impl Into<String>) -> Self {
        DocStatus { id: id.into(), error: None }
    }

    pub fn failed(id: impl Into<String>, err: &Error) -> Self {
        DocStatus { id: id.into(), error: Some(err.context.clone()) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Upsert,
    Create,  // Existing ids are rejected
}

/// Everything one index owns, guarded as a unit by the index lock
pub struct IndexState {
    pub schema: Schema,
    pub store: DocumentStore,
    pub text: TextIndex,
    pub facets: BTreeMap<String, FacetIndex>,
    pub vectors: BTreeMap<String, VectorIndex>,
    pub version: u64,  // Bumped by every write that changes something
    pub updated_at: DateTime<Utc>,
}

impl IndexState {
    pub fn new(schema: Schema) -> Self {
        let text = TextIndex::new(schema.text_fields());
        let facets = schema.facet_fields()
            .into_iter()
            .map(|field| {
                let index = FacetIndex::new(&field);
                (field, index)
            })
            .collect();
        let vectors = schema.vector_fields()
            .into_iter()
            .map(|(field, dimensions)| {
                let index = VectorIndex::new(&field, dimensions);
                (field, index)
            })
            .collect();

        IndexState {
            schema,
            store: DocumentStore::new(),
            text,
            facets,
            vectors,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Store and index one prepared document. Nothing is touched on error.
    fn apply(&mut self, prepared: PreparedDocument, mode: WriteMode) -> Result<DocId> {
        let PreparedDocument { document, field_tokens, vectors } = prepared;

        if mode == WriteMode::Create && self.store.contains(&document.id) {
            return Err(Error::new(
                ErrorKind::InvalidDocument,
                format!("document with id '{}' already exists", document.id),
            ));
        }
        for (field, vector) in &vectors {
            if let Some(index) = self.vectors.get(field) {
                index.check_dimensions(vector)?;
            }
        }

        let (doc_id, previous) = self.store.put(document);
        if previous.is_some() {
            self.unindex(doc_id);
        }

        self.text.index_document(doc_id, &field_tokens);
        if let Some(document) = self.store.document(doc_id) {
            for (field, facet) in self.facets.iter_mut() {
                if let Some(value) = document.get_path(field) {
                    facet.add_document(doc_id, value);
                }
            }
        }
        for (field, vector) in vectors {
            if let Some(index) = self.vectors.get_mut(&field) {
                index.insert(doc_id, vector)?;
            }
        }
        Ok(doc_id)
    }

    fn unindex(&mut self, doc_id: DocId) {
        self.text.remove_document(doc_id);
        for facet in self.facets.values_mut() {
            facet.remove_document(doc_id);
        }
        for index in self.vectors.values_mut() {
            index.remove(doc_id);
        }
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let (doc_id, _) = self.store
            .delete(id)
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("document '{}' not found", id)))?;
        self.unindex(doc_id);
        Ok(())
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

/// A named collection: document store plus its text, facet and vector indexes.
///
/// Readers share the state lock for a whole query; every write batch holds
/// the exclusive lock from validation to the last index update, so a reader
/// sees a batch either entirely or not at all.
pub struct Index {
    name: String,
    config: Config,
    analyzer: Analyzer,
    state: RwLock<IndexState>,
    cache: QueryCache,
    created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl Index {
    pub fn new(name: &str, schema: Schema, config: Config) -> Self {
        let cache = QueryCache::new(config.query_cache_size);
        Index {
            name: name.to_string(),
            config,
            analyzer: Analyzer::standard(),
            state: RwLock::new(IndexState::new(schema)),
            cache,
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Schema {
        self.state.read().schema.clone()
    }

    /// Insert or replace one document
    pub fn put(&self, doc: Document) -> DocStatus {
        let id = doc.id.clone();
        self.write_batch(vec![(id.clone(), Ok(doc))], WriteMode::Upsert)
            .pop()
            .unwrap_or_else(|| DocStatus::ok(id))
    }

    /// Insert or replace each document independently; one status per input, in order
    pub fn put_many(&self, docs: Vec<Value>) -> Vec<DocStatus> {
        self.write_batch(parse_batch(docs), WriteMode::Upsert)
    }

    /// Insert new documents; ids that already exist fail individually
    pub fn create_many(&self, docs: Vec<Value>) -> Vec<DocStatus> {
        self.write_batch(parse_batch(docs), WriteMode::Create)
    }

    pub fn replace_many(&self, docs: Vec<Value>) -> Vec<DocStatus> {
        self.put_many(docs)
    }

    fn write_batch(&self, batch: Vec<(String, Result<Document>)>, mode: WriteMode) -> Vec<DocStatus> {
        let (ids, docs): (Vec<String>, Vec<Result<Document>>) = batch.into_iter().unzip();

        let mut state = self.state.write();
        let prepared = ParallelIndexer::new(&state.schema, &self.analyzer).prepare(docs);

        let mut written = 0;
        let statuses: Vec<DocStatus> = ids.into_iter()
            .zip(prepared)
            .map(|(id, prepared)| match prepared.and_then(|p| state.apply(p, mode)) {
                Ok(_) => {
                    written += 1;
                    DocStatus::ok(id)
                }
                Err(err) => DocStatus::failed(id, &err),
            })
            .collect();

        if written > 0 {
            state.touch();
        }
        tracing::debug!(
            index = %self.name,
            written,
            failed = statuses.len() - written,
            version = state.version,
            "write batch applied"
        );
        statuses
    }

    pub fn get(&self, id: &str) -> Result<Document> {
        self.state.read().store.get(id).cloned()
    }

    /// Found documents in request order; missing ids are dropped
    pub fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Document> {
        self.state.read()
            .store
            .get_many(ids)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Remove a document from the store and every index
    pub fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.write();
        state.delete(id)?;
        state.touch();
        Ok(())
    }

    pub fn delete_many<S: AsRef<str>>(&self, ids: &[S]) -> Vec<DocStatus> {
        let mut state = self.state.write();
        let statuses: Vec<DocStatus> = ids.iter()
            .map(|id| match state.delete(id.as_ref()) {
                Ok(()) => DocStatus::ok(id.as_ref()),
                Err(err) => DocStatus::failed(id.as_ref(), &err),
            })
            .collect();

        if statuses.iter().any(DocStatus::is_ok) {
            state.touch();
        }
        statuses
    }

    pub fn count(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn search(&self, query: &Query) -> Result<SearchResult> {
        let state = self.state.read();

        let key = if self.cache.is_enabled() {
            let key = QueryKey {
                query: serde_json::to_string(query)?,
                version: state.version,
            };
            if let Some(result) = self.cache.get(&key) {
                tracing::debug!(index = %self.name, "query served from cache");
                return Ok(result);
            }
            Some(key)
        } else {
            None
        };

        let result = QueryExecutor::new(&state, &self.config, &self.analyzer).execute(query)?;

        if let Some(key) = key {
            self.cache.put(key, result.clone());
        }
        Ok(result)
    }

    /// Swap in a new schema and re-index every stored document against it.
    /// Documents the new schema rejects are dropped.
    pub fn rebuild(&self, schema: Schema) {
        let mut state = self.state.write();
        let documents = state.store.drain();
        let version = state.version;

        let mut rebuilt = IndexState::new(schema);
        rebuilt.version = version;

        let prepared = ParallelIndexer::new(&rebuilt.schema, &self.analyzer)
            .prepare(documents.into_iter().map(Ok).collect());
        let mut dropped = 0;
        for prepared in prepared {
            let id = prepared.as_ref().map(|p| p.document.id.clone()).ok();
            if let Err(err) = prepared.and_then(|p| rebuilt.apply(p, WriteMode::Upsert)) {
                dropped += 1;
                tracing::warn!(
                    index = %self.name,
                    id = id.as_deref().unwrap_or_default(),
                    error = %err,
                    "dropping document rejected by new schema"
                );
            }
        }

        rebuilt.touch();
        tracing::info!(index = %self.name, documents = rebuilt.store.len(), dropped, "index rebuilt");
        *state = rebuilt;
        self.cache.clear();
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            name: self.name.clone(),
            documents: state.store.len(),
            terms: state.text.term_count(),
            text_fields: state.text.field_names(),
            facet_fields: state.facets.keys().cloned().collect(),
            vector_fields: state.vectors.keys().cloned().collect(),
            version: state.version,
            created_at: self.created_at,
            updated_at: state.updated_at,
        }
    }

    pub fn info(&self) -> IndexInfo {
        IndexInfo {
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.state.read().updated_at,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Pair each raw document with the id to report in its status
fn parse_batch(docs: Vec<Value>) -> Vec<(String, Result<Document>)> {
    docs.into_iter()
        .map(|value| {
            let id = value.get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (id, Document::from_json(value))
        })
        .collect()
}
