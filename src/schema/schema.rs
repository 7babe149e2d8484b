use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{Document, FieldValue};

/// Compiled field type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Object(Vec<FieldDefinition>),  // Empty: free-form object, contents unchecked
    Vector { dimensions: usize },
    Array(Box<FieldType>),         // Array of scalars
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object(_) => "object",
            FieldType::Vector { .. } => "vector",
            FieldType::Array(_) => "array",
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Number | FieldType::Boolean)
    }

    fn is_text(&self) -> bool {
        match self {
            FieldType::Text => true,
            FieldType::Array(inner) => **inner == FieldType::Text,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub facet: bool,
    pub searchable: bool,  // Only meaningful for text fields
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        let searchable = field_type.is_text();
        FieldDefinition {
            name: name.to_string(),
            field_type,
            facet: false,
            searchable,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn object(name: &str, fields: Vec<FieldDefinition>) -> Self {
        Self::new(name, FieldType::Object(fields))
    }

    pub fn vector(name: &str, dimensions: usize) -> Self {
        Self::new(name, FieldType::Vector { dimensions })
    }

    pub fn with_facet(mut self) -> Self {
        self.facet = true;
        self
    }

    pub fn not_searchable(mut self) -> Self {
        self.searchable = false;
        self
    }
}

/// Index schema compiled from a JSON-Schema-like definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub title: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub additional_properties: bool,
}

impl Schema {
    pub fn new() -> Self {
        Schema {
            title: None,
            fields: Vec::new(),
            additional_properties: true,
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = allowed;
        self
    }

    /// Compile a JSON schema:
    /// `{"title", "type": "object", "additionalProperties", "properties": {..}}`
    pub fn from_json(value: &Value) -> Result<Self> {
        let root = value.as_object()
            .ok_or_else(|| invalid_schema("schema must be a JSON object"))?;

        if let Some(kind) = root.get("type") {
            if kind.as_str() != Some("object") {
                return Err(invalid_schema("top-level schema type must be 'object'"));
            }
        }

        let properties = root.get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| invalid_schema("schema requires a 'properties' object"))?;

        let schema = Schema {
            title: root.get("title").and_then(Value::as_str).map(str::to_string),
            fields: parse_properties(properties, "")?,
            additional_properties: match root.get("additionalProperties") {
                None => true,
                Some(Value::Bool(allowed)) => *allowed,
                Some(_) => return Err(invalid_schema("'additionalProperties' must be a boolean")),
            },
        };

        schema.check()?;
        Ok(schema)
    }

    /// Structural checks that the builder API cannot enforce
    pub fn check(&self) -> Result<()> {
        check_fields(&self.fields, "")?;

        if let Some(id) = self.fields.iter().find(|f| f.name == "id") {
            if id.field_type != FieldType::Text {
                return Err(invalid_schema("field 'id' must be of type string"));
            }
        }
        Ok(())
    }

    /// Every declared field with its dotted path, depth-first
    pub fn flatten(&self) -> Vec<(String, &FieldDefinition)> {
        let mut out = Vec::new();
        flatten_into(&self.fields, "", &mut out);
        out
    }

    pub fn field(&self, path: &str) -> Option<&FieldDefinition> {
        let mut fields = &self.fields;
        let mut found = None;
        for segment in path.split('.') {
            let field = fields.iter().find(|f| f.name == segment)?;
            if let FieldType::Object(nested) = &field.field_type {
                fields = nested;
            } else {
                fields = &EMPTY;
            }
            found = Some(field);
        }
        found
    }

    /// Whether `path` names something a document may carry: a declared field,
    /// anything beneath a free-form object, or `id`.
    pub fn knows_path(&self, path: &str) -> bool {
        if path == "id" {
            return true;
        }
        let mut fields = &self.fields;
        for segment in path.split('.') {
            let Some(field) = fields.iter().find(|f| f.name == segment) else {
                return false;
            };
            match &field.field_type {
                FieldType::Object(nested) if nested.is_empty() => return true,
                FieldType::Object(nested) => fields = nested,
                _ => fields = &EMPTY,
            }
        }
        true
    }

    pub fn text_fields(&self) -> Vec<String> {
        self.flatten()
            .into_iter()
            .filter(|(_, f)| f.searchable && f.field_type.is_text())
            .map(|(path, _)| path)
            .collect()
    }

    pub fn facet_fields(&self) -> Vec<String> {
        self.flatten()
            .into_iter()
            .filter(|(_, f)| f.facet)
            .map(|(path, _)| path)
            .collect()
    }

    pub fn vector_fields(&self) -> Vec<(String, usize)> {
        self.flatten()
            .into_iter()
            .filter_map(|(path, f)| match f.field_type {
                FieldType::Vector { dimensions } => Some((path, dimensions)),
                _ => None,
            })
            .collect()
    }

    /// Check a document against the compiled schema
    pub fn validate(&self, doc: &Document) -> Result<()> {
        validate_id(doc)?;
        for (name, value) in &doc.fields {
            ensure_finite(name, value)?;
            match self.fields.iter().find(|f| &f.name == name) {
                Some(field) => validate_value(name, &field.field_type, value)?,
                None if name == "id" || self.additional_properties => {}
                None => {
                    return Err(Error::new(
                        ErrorKind::InvalidDocument,
                        format!("field '{}' is not declared in the schema", name),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

static EMPTY: Vec<FieldDefinition> = Vec::new();

fn invalid_schema(context: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidSchema, context)
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn parse_properties(properties: &Map<String, Value>, prefix: &str) -> Result<Vec<FieldDefinition>> {
    properties
        .iter()
        .map(|(name, prop)| parse_property(name, prop, &join_path(prefix, name)))
        .collect()
}

fn parse_property(name: &str, prop: &Value, path: &str) -> Result<FieldDefinition> {
    let prop = prop.as_object()
        .ok_or_else(|| invalid_schema(format!("definition of '{}' must be an object", path)))?;
    let field_type = parse_type(prop, path)?;

    let facet = optional_bool(prop, "facet", path)?.unwrap_or(false);
    let searchable = match optional_bool(prop, "searchable", path)? {
        Some(true) if !field_type.is_text() => {
            return Err(invalid_schema(format!(
                "field '{}' of type {} cannot be searchable", path, field_type.name()
            )));
        }
        Some(flag) => flag,
        None => field_type.is_text(),
    };

    Ok(FieldDefinition {
        name: name.to_string(),
        field_type,
        facet,
        searchable,
    })
}

fn parse_type(prop: &Map<String, Value>, path: &str) -> Result<FieldType> {
    let kind = prop.get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_schema(format!("field '{}' has no type", path)))?;

    match kind {
        "string" => Ok(FieldType::Text),
        "number" | "integer" => Ok(FieldType::Number),
        "boolean" => Ok(FieldType::Boolean),
        "object" => match prop.get("properties") {
            None => Ok(FieldType::Object(Vec::new())),
            Some(Value::Object(props)) => Ok(FieldType::Object(parse_properties(props, path)?)),
            Some(_) => Err(invalid_schema(format!("'properties' of '{}' must be an object", path))),
        },
        "array" if prop.get("format").and_then(Value::as_str) == Some("vector") => {
            let dimensions = prop.get("dimensions")
                .and_then(Value::as_u64)
                .filter(|d| *d > 0)
                .ok_or_else(|| invalid_schema(format!(
                    "vector field '{}' requires a positive integer 'dimensions'", path
                )))?;
            Ok(FieldType::Vector { dimensions: dimensions as usize })
        }
        "array" => {
            let items = prop.get("items")
                .and_then(Value::as_object)
                .ok_or_else(|| invalid_schema(format!("array field '{}' requires 'items'", path)))?;
            let inner = parse_type(items, path)?;
            if !inner.is_scalar() {
                return Err(invalid_schema(format!(
                    "array field '{}' must hold strings, numbers or booleans", path
                )));
            }
            Ok(FieldType::Array(Box::new(inner)))
        }
        other => Err(invalid_schema(format!("field '{}' has unsupported type '{}'", path, other))),
    }
}

fn optional_bool(prop: &Map<String, Value>, key: &str, path: &str) -> Result<Option<bool>> {
    match prop.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(invalid_schema(format!("'{}' of field '{}' must be a boolean", key, path))),
    }
}

fn check_fields(fields: &[FieldDefinition], prefix: &str) -> Result<()> {
    for (i, field) in fields.iter().enumerate() {
        let path = join_path(prefix, &field.name);
        if field.name.is_empty() || field.name.contains('.') {
            return Err(invalid_schema(format!("invalid field name '{}'", path)));
        }
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(invalid_schema(format!("duplicate field '{}'", path)));
        }

        let facetable = match &field.field_type {
            FieldType::Array(inner) => inner.is_scalar(),
            other => other.is_scalar(),
        };
        if field.facet && !facetable {
            return Err(invalid_schema(format!(
                "field '{}' of type {} cannot be a facet", path, field.field_type.name()
            )));
        }
        if field.searchable && !field.field_type.is_text() {
            return Err(invalid_schema(format!(
                "field '{}' of type {} cannot be searchable", path, field.field_type.name()
            )));
        }

        match &field.field_type {
            FieldType::Vector { dimensions: 0 } => {
                return Err(invalid_schema(format!("vector field '{}' needs dimensions > 0", path)));
            }
            FieldType::Object(nested) => check_fields(nested, &path)?,
            _ => {}
        }
    }
    Ok(())
}

fn flatten_into<'a>(fields: &'a [FieldDefinition], prefix: &str, out: &mut Vec<(String, &'a FieldDefinition)>) {
    for field in fields {
        let path = join_path(prefix, &field.name);
        if let FieldType::Object(nested) = &field.field_type {
            flatten_into(nested, &path, out);
        }
        out.push((path, field));
    }
}

fn validate_id(doc: &Document) -> Result<()> {
    if doc.id.is_empty() {
        return Err(Error::new(ErrorKind::InvalidDocument, "field 'id' must not be empty"));
    }
    match doc.fields.get("id") {
        Some(FieldValue::Text(id)) if *id == doc.id => Ok(()),
        Some(FieldValue::Text(id)) => Err(Error::new(
            ErrorKind::InvalidDocument,
            format!("field 'id' is '{}' but the document id is '{}'", id, doc.id),
        )),
        Some(other) => Err(Error::new(
            ErrorKind::InvalidDocument,
            format!("field 'id' must be a string, got {}", other.type_name()),
        )),
        None => Err(Error::new(ErrorKind::InvalidDocument, "missing field 'id'")),
    }
}

/// NaN and infinities cannot be ordered or faceted, declared field or not
fn ensure_finite(path: &str, value: &FieldValue) -> Result<()> {
    match value {
        FieldValue::Number(n) if !n.is_finite() => Err(Error::new(
            ErrorKind::InvalidDocument,
            format!("field '{}' holds a non-finite number", path),
        )),
        FieldValue::Array(items) => items.iter().try_for_each(|item| ensure_finite(path, item)),
        FieldValue::Object(map) => map
            .iter()
            .try_for_each(|(name, inner)| ensure_finite(&join_path(path, name), inner)),
        _ => Ok(()),
    }
}

fn validate_value(path: &str, field_type: &FieldType, value: &FieldValue) -> Result<()> {
    let matches = match (field_type, value) {
        (_, FieldValue::Null) => true,
        (FieldType::Text, FieldValue::Text(_)) => true,
        (FieldType::Number, FieldValue::Number(_)) => true,
        (FieldType::Boolean, FieldValue::Boolean(_)) => true,
        (FieldType::Object(nested), FieldValue::Object(map)) => {
            for field in nested {
                if let Some(inner) = map.get(&field.name) {
                    validate_value(&join_path(path, &field.name), &field.field_type, inner)?;
                }
            }
            true
        }
        (FieldType::Vector { dimensions }, FieldValue::Array(items)) => {
            if let Some(bad) = items.iter().find(|v| v.as_number().is_none()) {
                return Err(Error::new(
                    ErrorKind::InvalidDocument,
                    format!("vector field '{}' holds a non-numeric {}", path, bad.type_name()),
                ));
            }
            if items.len() != *dimensions {
                return Err(Error::new(
                    ErrorKind::DimensionMismatch,
                    format!("vector field '{}' expects {} dimensions, got {}", path, dimensions, items.len()),
                ));
            }
            true
        }
        (FieldType::Array(inner), FieldValue::Array(items)) => {
            for item in items {
                validate_value(path, inner, item)?;
            }
            true
        }
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        Err(Error::new(
            ErrorKind::InvalidDocument,
            format!("field '{}' expects {}, got {}", path, field_type.name(), value.type_name()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Value {
        json!({
            "title": "catalog",
            "additionalProperties": false,
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "price": {"type": "number"},
                "brand": {"type": "string", "facet": true},
                "labels": {"type": "string", "facet": true},
                "popularity": {"type": "number"},
                "review": {
                    "type": "object",
                    "properties": {
                        "author": {"type": "string"},
                        "rating": {"type": "number"}
                    }
                }
            }
        })
    }

    #[test]
    fn compiles_catalog_schema() {
        let schema = Schema::from_json(&catalog()).unwrap();
        assert_eq!(schema.title.as_deref(), Some("catalog"));
        assert!(!schema.additional_properties);

        let mut text = schema.text_fields();
        text.sort();
        assert_eq!(text, vec!["brand", "id", "labels", "name", "review.author"]);

        let mut facets = schema.facet_fields();
        facets.sort();
        assert_eq!(facets, vec!["brand", "labels"]);

        assert_eq!(schema.field("review.rating").map(|f| &f.field_type), Some(&FieldType::Number));
        assert!(schema.field("review.missing").is_none());
    }

    #[test]
    fn compiles_vector_schema() {
        let schema = Schema::from_json(&json!({
            "title": "my_embeddings",
            "type": "object",
            "properties": {
                "id": {"type": "string"},
                "document": {"type": "string"},
                "metadata": {"type": "object"},
                "embeddings": {"type": "array", "format": "vector", "dimensions": 3}
            }
        }))
        .unwrap();

        assert_eq!(schema.vector_fields(), vec![("embeddings".to_string(), 3)]);
        assert!(schema.knows_path("metadata.category"));
        assert!(!schema.knows_path("document.category"));
        assert!(!schema.knows_path("unknown"));
    }

    #[test]
    fn rejects_malformed_schemas() {
        let cases = vec![
            json!({"type": "object"}),
            json!({"properties": {"v": {"type": "array", "format": "vector"}}}),
            json!({"properties": {"v": {"type": "array", "format": "vector", "dimensions": 0}}}),
            json!({"properties": {"x": {"type": "date"}}}),
            json!({"properties": {"x": {"type": "object"}, "y": {"type": "number", "searchable": true}}}),
            json!({"properties": {"meta": {"type": "object", "facet": true}}}),
            json!({"properties": {"id": {"type": "number"}}}),
            json!({"properties": {"tags": {"type": "array"}}}),
        ];
        for case in cases {
            let err = Schema::from_json(&case).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidSchema, "{}", case);
        }
    }

    #[test]
    fn builder_duplicates_are_caught_by_check() {
        let schema = Schema::new()
            .with_field(FieldDefinition::text("name"))
            .with_field(FieldDefinition::number("name"));
        assert_eq!(schema.check().unwrap_err().kind, ErrorKind::InvalidSchema);
    }

    #[test]
    fn validates_documents() {
        let schema = Schema::from_json(&catalog()).unwrap();

        let ok = Document::from_json(json!({
            "id": "1", "name": "tote bag", "price": 49, "review": {"author": "olivia", "rating": 8.3}
        }))
        .unwrap();
        assert!(schema.validate(&ok).is_ok());

        let wrong_type = Document::from_json(json!({"id": "2", "price": "cheap"})).unwrap();
        assert_eq!(schema.validate(&wrong_type).unwrap_err().kind, ErrorKind::InvalidDocument);

        let nested_wrong = Document::from_json(json!({"id": "3", "review": {"rating": "high"}})).unwrap();
        assert_eq!(schema.validate(&nested_wrong).unwrap_err().kind, ErrorKind::InvalidDocument);

        let unknown = Document::from_json(json!({"id": "4", "color": "red"})).unwrap();
        assert_eq!(schema.validate(&unknown).unwrap_err().kind, ErrorKind::InvalidDocument);
    }

    #[test]
    fn vector_length_must_match() {
        let schema = Schema::new().with_field(FieldDefinition::vector("embeddings", 3));
        let doc = Document::from_json(json!({"id": "a", "embeddings": [1.0, 2.0]})).unwrap();
        assert_eq!(schema.validate(&doc).unwrap_err().kind, ErrorKind::DimensionMismatch);

        let doc = Document::from_json(json!({"id": "a", "embeddings": [1.0, "x", 2.0]})).unwrap();
        assert_eq!(schema.validate(&doc).unwrap_err().kind, ErrorKind::InvalidDocument);
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let schema = Schema::from_json(&catalog()).unwrap();

        let mut doc = Document::new("5");
        doc.add_field("price", f64::NAN);
        assert_eq!(schema.validate(&doc).unwrap_err().kind, ErrorKind::InvalidDocument);

        let mut doc = Document::new("6");
        doc.add_field("review", FieldValue::Object(
            [("rating".to_string(), FieldValue::Number(f64::INFINITY))].into_iter().collect(),
        ));
        let err = schema.validate(&doc).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidDocument);
        assert!(err.context.contains("review.rating"));
    }

    #[test]
    fn document_ids_are_checked() {
        let schema = Schema::new().with_field(FieldDefinition::text("name"));
        assert_eq!(schema.validate(&Document::new("")).unwrap_err().kind, ErrorKind::InvalidDocument);

        let mut doc = Document::new("a");
        doc.add_field("id", "b");
        assert_eq!(schema.validate(&doc).unwrap_err().kind, ErrorKind::InvalidDocument);

        let mut doc = Document::new("a");
        doc.fields.remove("id");
        assert_eq!(schema.validate(&doc).unwrap_err().kind, ErrorKind::InvalidDocument);

        assert!(schema.validate(&Document::new("a")).is_ok());
    }
}
