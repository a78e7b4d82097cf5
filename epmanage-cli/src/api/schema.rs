use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use epmanage_shared::schema::{CollectionSchema, SchemaDocument};
use reqwest::Method;
use tracing::{debug, warn};

use crate::api::{api_error, read_json};
use crate::error::ClientError;
use crate::session::Session;

/// Schemas of every collection, fetched once from `GET /schema`.
///
/// Shared by all clients built from the same cache; a collection's schema is
/// immutable once stored.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: Mutex<Option<HashMap<String, Arc<CollectionSchema>>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated cache, for callers that already hold the document.
    pub fn from_document(document: SchemaDocument) -> Self {
        let cache = Self::new();
        cache.store(document);
        cache
    }

    /// Schema of `collection`, fetching the document on first use.
    ///
    /// A failed fetch is logged and yields `None`; the next call retries.
    pub async fn schema_for(&self, session: &Session, collection: &str) -> Option<Arc<CollectionSchema>> {
        if self.is_loaded() {
            return self.cached(collection);
        }

        match fetch_document(session).await {
            Ok(document) => {
                self.store(document);
                let schema = self.cached(collection);
                if schema.is_none() {
                    warn!(collection, "backend schema has no entry for collection");
                }
                schema
            }
            Err(e) => {
                warn!(collection, error = %e, "Cannot fetch schema");
                None
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        let schemas = self.schemas.lock().unwrap_or_else(PoisonError::into_inner);
        schemas.is_some()
    }

    fn cached(&self, collection: &str) -> Option<Arc<CollectionSchema>> {
        let schemas = self.schemas.lock().unwrap_or_else(PoisonError::into_inner);
        schemas.as_ref()?.get(collection).cloned()
    }

    fn store(&self, document: SchemaDocument) {
        let mut schemas = self.schemas.lock().unwrap_or_else(PoisonError::into_inner);
        let entries = schemas.get_or_insert_with(HashMap::new);
        for (name, schema) in document {
            entries.entry(name).or_insert_with(|| Arc::new(schema));
        }
    }
}

async fn fetch_document(session: &Session) -> Result<SchemaDocument, ClientError> {
    let res = session.request(Method::GET, "/schema")?.send().await?;
    if !res.status().is_success() {
        return Err(api_error(res).await);
    }
    let document: SchemaDocument = read_json(res).await?;
    debug!(collections = document.len(), "fetched schema document");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use epmanage_shared::schema::{FieldDescriptor, FieldType};

    #[test]
    fn test_from_document_serves_collection() {
        let mut agent = CollectionSchema::new();
        agent.insert(
            "uuid".to_string(),
            FieldDescriptor {
                field_type: Some(FieldType::String),
                readonly: true,
            },
        );
        let mut doc = SchemaDocument::new();
        doc.insert("agent".to_string(), agent);

        let cache = SchemaCache::from_document(doc);
        assert!(cache.cached("agent").unwrap()["uuid"].readonly);
        assert!(cache.cached("user").is_none());
    }

    #[test]
    fn test_stored_schema_is_not_replaced() {
        let mut first = SchemaDocument::new();
        first.insert("app".to_string(), CollectionSchema::new());
        let cache = SchemaCache::from_document(first);

        let mut second = CollectionSchema::new();
        second.insert("name".to_string(), FieldDescriptor::default());
        let mut doc = SchemaDocument::new();
        doc.insert("app".to_string(), second);
        cache.store(doc);

        assert!(cache.cached("app").unwrap().is_empty());
    }
}
