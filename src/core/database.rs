use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use serde_json::Value;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::index::Index;
use crate::core::stats::IndexInfo;
use crate::schema::schema::Schema;

/// Registry of named indexes sharing one configuration
pub struct Database {
    config: Config,
    indexes: RwLock<HashMap<String, Arc<Index>>>,
}

impl Database {
    pub fn new(config: Config) -> Self {
        Database {
            config,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create the index from a JSON schema, or update an existing one
    pub fn create_or_update_index(&self, name: &str, schema: &Value) -> Result<Arc<Index>> {
        self.create_or_update_index_with(name, Schema::from_json(schema)?)
    }

    /// Idempotent for an unchanged schema. A changed schema rebuilds the
    /// existing index in place, so handles already given out stay valid.
    pub fn create_or_update_index_with(&self, name: &str, schema: Schema) -> Result<Arc<Index>> {
        if name.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidSchema, "index name must not be empty"));
        }
        schema.check()?;

        let mut indexes = self.indexes.write();
        if let Some(index) = indexes.get(name) {
            if index.schema() != schema {
                index.rebuild(schema);
            }
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(Index::new(name, schema, self.config.clone()));
        indexes.insert(name.to_string(), Arc::clone(&index));
        tracing::info!(index = %name, "index created");
        Ok(index)
    }

    pub fn get_index(&self, name: &str) -> Result<Arc<Index>> {
        self.indexes
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| index_not_found(name))
    }

    /// Drop an index and everything it owns
    pub fn delete_index(&self, name: &str) -> Result<bool> {
        self.indexes
            .write()
            .remove(name)
            .ok_or_else(|| index_not_found(name))?;
        tracing::info!(index = %name, "index deleted");
        Ok(true)
    }

    /// Every index, ordered by name
    pub fn list_indexes(&self) -> Vec<IndexInfo> {
        let mut infos: Vec<IndexInfo> = self.indexes
            .read()
            .values()
            .map(|index| index.info())
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn index_not_found(name: &str) -> Error {
    Error::new(ErrorKind::NotFound, format!("index '{}' not found", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users_schema() -> Value {
        json!({
            "title": "users",
            "properties": {
                "id": {"type": "string"},
                "name": {"type": "string"},
                "balance": {"type": "number"}
            }
        })
    }

    #[test]
    fn create_is_idempotent() {
        let db = Database::default();
        let first = db.create_or_update_index("users", &users_schema()).unwrap();
        first.put_many(vec![json!({"id": "1", "name": "Tom", "balance": 3.4})]);

        let second = db.create_or_update_index("users", &users_schema()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn delete_missing_index_is_not_found() {
        let db = Database::default();
        db.create_or_update_index("users", &users_schema()).unwrap();

        assert!(db.delete_index("users").unwrap());
        assert_eq!(db.delete_index("users").unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(db.get_index("users").unwrap_err().kind, ErrorKind::NotFound);
    }

    #[test]
    fn lists_indexes_by_name() {
        let db = Database::default();
        db.create_or_update_index("users", &users_schema()).unwrap();
        db.create_or_update_index("catalog", &users_schema()).unwrap();

        let names: Vec<String> = db.list_indexes().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["catalog", "users"]);
    }

    #[test]
    fn rejects_bad_names_and_schemas() {
        let db = Database::default();
        assert_eq!(db.create_or_update_index("", &users_schema()).unwrap_err().kind, ErrorKind::InvalidSchema);

        let bad = json!({"properties": {"v": {"type": "array", "format": "vector", "dimensions": 0}}});
        assert_eq!(db.create_or_update_index("vectors", &bad).unwrap_err().kind, ErrorKind::InvalidSchema);
    }
}
