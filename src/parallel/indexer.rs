use rayon::prelude::*;
use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::Token;
use crate::core::error::Result;
use crate::core::types::{Document, FieldValue};
use crate::index::vector::vector_from_value;
use crate::schema::schema::Schema;

/// A validated document with its analysed text and extracted vectors,
/// ready to be applied to the index structures
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub document: Document,
    pub field_tokens: Vec<(String, Vec<Token>)>,
    pub vectors: Vec<(String, Vec<f32>)>,
}

/// Validates and analyses write batches across the rayon pool
pub struct ParallelIndexer<'a> {
    schema: &'a Schema,
    analyzer: &'a Analyzer,
    text_fields: Vec<String>,
    vector_fields: Vec<String>,
}

impl<'a> ParallelIndexer<'a> {
    pub fn new(schema: &'a Schema, analyzer: &'a Analyzer) -> Self {
        ParallelIndexer {
            schema,
            analyzer,
            text_fields: schema.text_fields(),
            vector_fields: schema.vector_fields().into_iter().map(|(path, _)| path).collect(),
        }
    }

    /// One result per input, in input order. Inputs that already failed
    /// to parse pass their error through.
    pub fn prepare(&self, documents: Vec<Result<Document>>) -> Vec<Result<PreparedDocument>> {
        documents
            .into_par_iter()
            .map(|doc| doc.and_then(|doc| self.prepare_document(doc)))
            .collect()
    }

    pub fn prepare_document(&self, document: Document) -> Result<PreparedDocument> {
        self.schema.validate(&document)?;

        let field_tokens = self.text_fields
            .iter()
            .filter_map(|field| {
                let value = document.get_path(field)?;
                let tokens = self.analyze_value(value);
                (!tokens.is_empty()).then(|| (field.clone(), tokens))
            })
            .collect();

        let vectors = self.vector_fields
            .iter()
            .filter_map(|field| {
                let vector = vector_from_value(document.get_path(field)?)?;
                Some((field.clone(), vector))
            })
            .collect();

        Ok(PreparedDocument {
            document,
            field_tokens,
            vectors,
        })
    }

    /// Text arrays are analysed element by element with continuous positions
    fn analyze_value(&self, value: &FieldValue) -> Vec<Token> {
        match value {
            FieldValue::Text(text) => self.analyzer.analyze(text),
            FieldValue::Array(items) => {
                let mut tokens = Vec::new();
                for text in items.iter().filter_map(FieldValue::as_text) {
                    let base = tokens.len() as u32;
                    tokens.extend(self.analyzer.analyze(text).into_iter().map(|mut token| {
                        token.position += base;
                        token
                    }));
                }
                tokens
            }
            _ => Vec::new(),
        }
    }
}
