use std::collections::BTreeMap;
use roaring::RoaringTreemap;
use crate::analysis::analyzer::Analyzer;
use crate::core::config::{Config, FacetScope};
use crate::core::error::Result;
use crate::core::index::IndexState;
use crate::index::inverted::Term;
use crate::index::vector::VectorIndex;
use crate::query::ast::Query;
use crate::query::evaluator::FilterEvaluator;
use crate::query::filter::Filter;
use crate::query::sort::SortEngine;
use crate::query::validator::QueryValidator;
use crate::search::projection::project;
use crate::search::results::{
    FacetDistribution, Hit, HitMeta, PageInfo, ScoredDocument, SearchMeta, SearchResult, TextMatch,
};

/// Pipeline stages, run strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CollectCandidates,
    ApplyFilter,
    ComputeFacets,
    Sort,
    Paginate,
    Project,
    Done,
}

/// Runs one query against a read-locked index snapshot
pub struct QueryExecutor<'a> {
    state: &'a IndexState,
    config: &'a Config,
    analyzer: &'a Analyzer,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(state: &'a IndexState, config: &'a Config, analyzer: &'a Analyzer) -> Self {
        QueryExecutor { state, config, analyzer }
    }

    pub fn execute(&self, query: &Query) -> Result<SearchResult> {
        QueryValidator::new(&self.state.schema, self.config.strict_fields).validate(query)?;

        let candidates = self.collect_candidates(query)?;
        trace_stage(Stage::CollectCandidates, candidates.len());

        // Unfiltered facets count over the candidate set as retrieved
        let unfiltered = match self.config.facet_scope {
            FacetScope::Unfiltered if !query.facet_by.is_empty() => Some(bitmap(&candidates)),
            _ => None,
        };

        let mut hits = self.apply_filter(query, candidates)?;
        let found = hits.len();
        trace_stage(Stage::ApplyFilter, found);

        let facets = match unfiltered {
            Some(all) => self.compute_facets(query, &all),
            None if !query.facet_by.is_empty() => self.compute_facets(query, &bitmap(&hits)),
            None => BTreeMap::new(),
        };
        trace_stage(Stage::ComputeFacets, facets.len());

        if !query.sort_by.is_empty() {
            SortEngine::sort(&mut hits, &query.sort_by);
        } else if query.vector_query.is_some() {
            SortEngine::sort_by_distance(&mut hits);
        } else {
            SortEngine::sort_by_score(&mut hits);
        }
        trace_stage(Stage::Sort, hits.len());

        let (offset, size) = query.window(self.config.default_page_size);
        let page: Vec<ScoredDocument<'_>> = hits
            .into_iter()
            .skip(offset)
            .take(size.unwrap_or(usize::MAX))
            .collect();
        trace_stage(Stage::Paginate, page.len());

        let hits: Vec<Hit> = page
            .into_iter()
            .map(|scored| Hit {
                doc: project(scored.document, &query.include_fields, &query.exclude_fields),
                meta: HitMeta {
                    text_match: TextMatch {
                        score: scored.score,
                        vector_distance: scored.vector_distance,
                    },
                },
            })
            .collect();
        trace_stage(Stage::Project, hits.len());

        let page = PageInfo {
            current: query.page.unwrap_or_else(|| size.filter(|s| *s > 0).map_or(1, |s| offset / s + 1)),
            size: size.unwrap_or(found),
        };
        trace_stage(Stage::Done, found);

        Ok(SearchResult {
            hits,
            meta: SearchMeta { found, facets, page },
        })
    }

    /// Vector scan when a vector query is present, else text match when `q`
    /// has terms, else every document with a zero score
    fn collect_candidates(&self, query: &Query) -> Result<Vec<ScoredDocument<'a>>> {
        let store = &self.state.store;

        if let Some(vq) = &query.vector_query {
            let Some(index) = self.state.vectors.get(&vq.field) else {
                return Ok(Vec::new());
            };
            // top_k counts only documents that can pass the filter
            let allowed = match (&query.filter_by, vq.top_k) {
                (Some(filter), Some(_)) => Some(self.filtered_vector_ids(filter, index)?),
                _ => None,
            };
            let nearest = index.search(&vq.vector, vq.top_k, allowed.as_ref())?;
            return Ok(nearest
                .into_iter()
                .filter_map(|(doc_id, distance)| {
                    store.document(doc_id).map(|document| ScoredDocument {
                        doc_id,
                        score: 0.0,
                        vector_distance: Some(distance),
                        document,
                    })
                })
                .collect());
        }

        let terms: Vec<Term> = query.q.as_deref()
            .map(|q| self.analyzer.query_terms(q).iter().map(|t| Term::new(t)).collect())
            .unwrap_or_default();

        if terms.is_empty() {
            return Ok(store
                .iter()
                .map(|(doc_id, document)| ScoredDocument {
                    doc_id,
                    score: 0.0,
                    vector_distance: None,
                    document,
                })
                .collect());
        }

        let fields = if query.search_fields.is_empty() {
            self.state.text.field_names()
        } else {
            query.search_fields.clone()
        };

        let scores = self.state.text.query(&terms, &fields, |field| self.config.field_weight(field));
        Ok(scores
            .into_iter()
            .filter_map(|(doc_id, score)| {
                store.document(doc_id).map(|document| ScoredDocument {
                    doc_id,
                    score,
                    vector_distance: None,
                    document,
                })
            })
            .collect())
    }

    fn filtered_vector_ids(&self, filter: &Filter, index: &VectorIndex) -> Result<RoaringTreemap> {
        let evaluator = FilterEvaluator::new(self.config.strict_fields);
        let mut ids = RoaringTreemap::new();
        for (doc_id, document) in self.state.store.iter() {
            if index.contains(doc_id) && evaluator.evaluate(document, filter)? {
                ids.insert(doc_id.0);
            }
        }
        Ok(ids)
    }

    fn apply_filter(
        &self,
        query: &Query,
        candidates: Vec<ScoredDocument<'a>>,
    ) -> Result<Vec<ScoredDocument<'a>>> {
        let Some(filter) = &query.filter_by else {
            return Ok(candidates);
        };

        let evaluator = FilterEvaluator::new(self.config.strict_fields);
        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if evaluator.evaluate(candidate.document, filter)? {
                kept.push(candidate);
            }
        }
        Ok(kept)
    }

    /// Facet fields without a facet index are skipped; strict mode has
    /// already rejected them during validation
    fn compute_facets(&self, query: &Query, candidates: &RoaringTreemap) -> BTreeMap<String, FacetDistribution> {
        query.facet_by
            .iter()
            .filter_map(|facet| {
                let index = self.state.facets.get(&facet.field)?;
                let size = facet.size.unwrap_or(self.config.default_facet_size);
                Some((facet.field.clone(), index.counts(candidates, size)))
            })
            .collect()
    }
}

fn bitmap(hits: &[ScoredDocument<'_>]) -> RoaringTreemap {
    hits.iter().map(|h| h.doc_id.0).collect()
}

fn trace_stage(stage: Stage, count: usize) {
    tracing::debug!(stage = ?stage, count, "query stage complete");
}
