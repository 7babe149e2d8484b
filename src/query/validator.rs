use crate::core::error::{Error, ErrorKind, Result};
use crate::query::ast::Query;
use crate::schema::schema::{FieldType, Schema};

/// Rejects queries that cannot run against a schema, before any index is touched
pub struct QueryValidator<'a> {
    schema: &'a Schema,
    strict: bool,
}

impl<'a> QueryValidator<'a> {
    pub fn new(schema: &'a Schema, strict: bool) -> Self {
        QueryValidator { schema, strict }
    }

    pub fn validate(&self, query: &Query) -> Result<()> {
        if !query.include_fields.is_empty() && !query.exclude_fields.is_empty() {
            return Err(invalid("include_fields and exclude_fields are mutually exclusive"));
        }

        if query.page == Some(0) {
            return Err(invalid("page numbers start at 1"));
        }
        if query.page_size == Some(0) {
            return Err(invalid("page_size must be positive"));
        }

        self.validate_vector_query(query)?;
        self.validate_search_fields(query)?;

        if self.strict {
            let filter_fields = query.filter_by.iter().flat_map(|f| f.fields());
            let sort_fields = query.sort_by.iter().map(|k| k.field.as_str());
            for field in filter_fields.chain(sort_fields) {
                if !self.schema.knows_path(field) {
                    return Err(invalid(format!("unknown field '{}'", field)));
                }
            }
            for facet in &query.facet_by {
                if !self.schema.field(&facet.field).is_some_and(|f| f.facet) {
                    return Err(invalid(format!("field '{}' is not a facet field", facet.field)));
                }
            }
        }
        Ok(())
    }

    fn validate_vector_query(&self, query: &Query) -> Result<()> {
        let Some(vq) = &query.vector_query else {
            return Ok(());
        };
        if vq.vector.iter().any(|x| !x.is_finite()) {
            return Err(invalid(format!("query vector for '{}' holds a non-finite value", vq.field)));
        }
        match self.schema.field(&vq.field).map(|f| &f.field_type) {
            Some(FieldType::Vector { dimensions }) if *dimensions == vq.vector.len() => Ok(()),
            Some(FieldType::Vector { dimensions }) => Err(Error::new(
                ErrorKind::DimensionMismatch,
                format!("field '{}' has {} dimensions, query vector has {}", vq.field, dimensions, vq.vector.len()),
            )),
            _ => Err(invalid(format!("field '{}' is not a vector field", vq.field))),
        }
    }

    fn validate_search_fields(&self, query: &Query) -> Result<()> {
        if query.search_fields.is_empty() {
            return Ok(());
        }
        let text_fields = self.schema.text_fields();
        match query.search_fields.iter().find(|f| !text_fields.contains(f)) {
            Some(field) => Err(invalid(format!("'{}' is not a searchable text field", field))),
            None => Ok(()),
        }
    }
}

fn invalid(context: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidQuery, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::Filter;
    use crate::query::sort::SortKey;
    use crate::schema::schema::FieldDefinition;

    fn schema() -> Schema {
        Schema::new()
            .with_field(FieldDefinition::text("name"))
            .with_field(FieldDefinition::number("price").with_facet())
            .with_field(FieldDefinition::vector("embeddings", 3))
    }

    fn kind(query: &Query, strict: bool) -> Option<ErrorKind> {
        let schema = schema();
        QueryValidator::new(&schema, strict).validate(query).err().map(|e| e.kind)
    }

    #[test]
    fn projection_is_exclusive() {
        let query = Query::new().include(&["name"]).exclude(&["price"]);
        assert_eq!(kind(&query, false), Some(ErrorKind::InvalidQuery));
    }

    #[test]
    fn vector_queries_are_checked() {
        assert_eq!(kind(&Query::new().vector("embeddings", vec![1.0, 2.0, 3.0]), false), None);
        assert_eq!(kind(&Query::new().vector("embeddings", vec![1.0]), false), Some(ErrorKind::DimensionMismatch));
        assert_eq!(kind(&Query::new().vector("name", vec![1.0]), false), Some(ErrorKind::InvalidQuery));
        assert_eq!(
            kind(&Query::new().vector("embeddings", vec![1.0, f32::NAN, 3.0]), false),
            Some(ErrorKind::InvalidQuery)
        );
    }

    #[test]
    fn search_fields_must_be_text() {
        assert_eq!(kind(&Query::text("x").search_fields(&["name"]), false), None);
        assert_eq!(kind(&Query::text("x").search_fields(&["price"]), false), Some(ErrorKind::InvalidQuery));
    }

    #[test]
    fn unknown_fields_only_fail_when_strict() {
        let query = Query::new()
            .filter(Filter::eq("color", "red"))
            .sort(SortKey::ascending("weight"))
            .facet("brand");
        assert_eq!(kind(&query, false), None);
        assert_eq!(kind(&query, true), Some(ErrorKind::InvalidQuery));
        assert_eq!(kind(&Query::new().facet("price"), true), None);
    }

    #[test]
    fn zero_pages_are_rejected() {
        assert_eq!(kind(&Query::new().page(0, 10), false), Some(ErrorKind::InvalidQuery));
        assert_eq!(kind(&Query::new().page(1, 0), false), Some(ErrorKind::InvalidQuery));
    }
}
