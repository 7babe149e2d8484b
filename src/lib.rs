pub mod core;
pub mod storage;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod search;
pub mod query;
pub mod parallel;

pub use crate::core::config::{Config, FacetScope};
pub use crate::core::database::Database;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::index::{DocStatus, Index};
pub use crate::core::types::{DocId, Document, FieldValue};
pub use crate::query::ast::{FacetField, Query, VectorQuery};
pub use crate::query::filter::{Comparison, Filter};
pub use crate::query::sort::{SortKey, SortOrder};
pub use crate::schema::schema::{FieldDefinition, FieldType, Schema};
pub use crate::search::results::{FacetDistribution, Hit, SearchResult};

/*
┌──────────────────────────────────────── CORE LAYER ─────────────────────────────────────────┐
│                                                                                              │
│  ┌──────────────────────────────────────┐   ┌──────────────────────────────────────────┐   │
│  │ struct Database                      │   │ struct Index                             │   │
│  │ • config: Config                     │──▶│ • config: Config                         │   │
│  │ • indexes: RwLock<HashMap<String,    │   │ • analyzer: Analyzer                     │   │
│  │            Arc<Index>>>              │   │ • state: RwLock<IndexState>              │   │
│  └──────────────────────────────────────┘   │ • cache: QueryCache                      │   │
│                                             └──────────────────────────────────────────┘   │
│  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────────────────────────┐  │
│  │ struct Config    │  │ struct Document  │  │ struct IndexState                        │  │
│  │ • strict_fields  │  │ • id: String     │  │ • schema: Schema                         │  │
│  │ • facet_scope    │  │ • fields: BTree  │  │ • store: DocumentStore                   │  │
│  │ • field_weights  │  │   <String,       │  │ • text: TextIndex                        │  │
│  │ • query_cache_   │  │   FieldValue>    │  │ • facets: BTreeMap<String, FacetIndex>   │  │
│  │   size           │  └──────────────────┘  │ • vectors: BTreeMap<String, VectorIndex> │  │
│  └──────────────────┘                        │ • version: u64                           │  │
│                                              └──────────────────────────────────────────┘  │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌────────────────────────────────────── INDEXING LAYER ───────────────────────────────────────┐
│                                                                                              │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌──────────────────────────────────┐  │
│  │ struct TextIndex     │  │ struct FacetIndex    │  │ struct VectorIndex               │  │
│  │ • fields: BTreeMap<  │  │ • buckets: value →   │  │ • dimensions: usize              │  │
│  │   String,            │  │   RoaringTreemap     │  │ • vectors: DocId → Vec<f32>      │  │
│  │   InvertedIndex>     │  │ • doc_values         │  │ • L2 scan with rayon             │  │
│  └──────────────────────┘  └──────────────────────┘  └──────────────────────────────────┘  │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌──────────────────────────────────┐  │
│  │ struct InvertedIndex │  │ struct PostingList   │  │ struct ParallelIndexer           │  │
│  │ • postings: Term →   │  │ • postings: sorted   │  │ • validate + analyse a batch     │  │
│  │   PostingList        │  │   Vec<Posting>       │  │   across the rayon pool          │  │
│  └──────────────────────┘  └──────────────────────┘  └──────────────────────────────────┘  │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────────── SEARCH LAYER ────────────────────────────────────────┐
│                                                                                              │
│  QueryValidator → CollectCandidates → ApplyFilter → ComputeFacets → Sort → Paginate →       │
│  Project → Done                                                                              │
│                                                                                              │
│  ┌──────────────────────┐  ┌──────────────────────┐  ┌──────────────────────────────────┐  │
│  │ struct Query         │  │ enum Filter          │  │ struct SearchResult              │  │
│  │ • q, search_fields   │  │ • Leaf{op,field,val} │  │ • hits: Vec<Hit>                 │  │
│  │ • filter_by, sort_by │  │ • And(l, r)          │  │ • meta: {found, facets, page}    │  │
│  │ • facet_by           │  │ • Or(l, r)           │  └──────────────────────────────────┘  │
│  │ • vector_query       │  └──────────────────────┘  ┌──────────────────────────────────┐  │
│  │ • include/exclude    │                            │ struct QueryCache                │  │
│  │ • page/offset/limit  │                            │ • LRU (query json, version)      │  │
│  └──────────────────────┘                            └──────────────────────────────────┘  │
└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/
