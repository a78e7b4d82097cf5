use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use epmanage_shared::envelope::ItemsEnvelope;
use epmanage_shared::schema::CollectionSchema;
use reqwest::header::IF_MATCH;
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::api::item::ResourceItem;
use crate::api::schema::SchemaCache;
use crate::api::value::FieldValue;
use crate::api::{api_error, read_json};
use crate::error::ClientError;
use crate::session::Session;

/// A record type stored in a named backend collection.
pub trait Resource: Sized {
    const COLLECTION: &'static str;

    fn from_item(item: ResourceItem) -> Self;
    fn item(&self) -> &ResourceItem;
    fn item_mut(&mut self) -> &mut ResourceItem;
}

/// Outcome of a lookup that must match exactly one record.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    Missing,
    Ambiguous(usize),
}

impl<T> Lookup<T> {
    pub fn from_matches(mut matches: Vec<T>) -> Self {
        match matches.len() {
            0 => Lookup::Missing,
            1 => matches.pop().map(Lookup::Found).unwrap_or(Lookup::Missing),
            n => Lookup::Ambiguous(n),
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(item) => Some(item),
            _ => None,
        }
    }
}

/// Schema-aware CRUD access to one collection.
pub struct ResourceClient<T: Resource> {
    session: Arc<Session>,
    schema: Option<Arc<CollectionSchema>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> ResourceClient<T> {
    /// Resolves the collection schema through `schemas`. Without a schema the
    /// client still works, but items expose no attributes.
    pub async fn new(session: Arc<Session>, schemas: &SchemaCache) -> Self {
        let schema = schemas.schema_for(&session, T::COLLECTION).await;
        Self {
            session,
            schema,
            _marker: PhantomData,
        }
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    pub fn schema(&self) -> Option<&CollectionSchema> {
        self.schema.as_deref()
    }

    /// An empty vector means the backend holds no matching record; a failed
    /// request is an error.
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<T>, ClientError> {
        let mut req = self
            .session
            .request(Method::GET, &format!("/{}", T::COLLECTION))?;
        if let Some(filter) = filter {
            req = req.query(&[("filter", filter)]);
        }

        let res = req.send().await?;
        if res.status() != StatusCode::OK {
            return Err(api_error(res).await);
        }

        let envelope: ItemsEnvelope<Value> = read_json(res).await?;
        debug!(collection = T::COLLECTION, count = envelope.items.len(), "listed items");
        envelope
            .items
            .into_iter()
            .map(|raw| self.wrap(raw))
            .collect()
    }

    pub async fn get(&self, id: &str) -> Result<T, ClientError> {
        let res = self
            .session
            .request(Method::GET, &format!("/{}/{}", T::COLLECTION, id))?
            .send()
            .await?;
        if res.status() != StatusCode::OK {
            return Err(api_error(res).await);
        }
        let raw: Value = read_json(res).await?;
        self.wrap(raw)
    }

    /// Server-side filtered lookup that keeps the match count.
    pub async fn find_by_field(&self, field: &str, value: &str) -> Result<Lookup<T>, ClientError> {
        let filter = format!("{}={}", field, value);
        let matches = self.list(Some(&filter)).await?;
        Ok(Lookup::from_matches(matches))
    }

    /// `None` unless exactly one record matches.
    pub async fn get_by_field(&self, field: &str, value: &str) -> Result<Option<T>, ClientError> {
        Ok(self.find_by_field(field, value).await?.found())
    }

    /// Conditional update of `changes` only, guarded by the item's etag.
    ///
    /// On success the item carries the new values and the server's new etag.
    pub async fn patch(
        &self,
        resource: &mut T,
        changes: BTreeMap<String, FieldValue>,
    ) -> Result<(), ClientError> {
        let item = resource.item();
        let etag = item.etag().ok_or(ClientError::MissingEtag)?.to_string();
        let link = item.self_link().ok_or(ClientError::MissingSelfLink)?.to_string();

        let body: Map<String, Value> = changes
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        let res = self
            .session
            .request(Method::PATCH, &link)?
            .header(IF_MATCH, etag.as_str())
            .json(&body)
            .send()
            .await?;
        if res.status() != StatusCode::OK {
            return Err(api_error(res).await);
        }

        let response: Value = read_json(res).await?;
        let item = resource.item_mut();
        item.apply(&changes);
        item.merge(&response);
        info!(collection = T::COLLECTION, %link, "updated item");
        Ok(())
    }

    /// Validate one user-supplied edit, then patch it.
    pub async fn edit(&self, resource: &mut T, field: &str, raw: &str) -> Result<(), ClientError> {
        let value = resource.item().prepare_edit(field, raw)?;
        let mut changes = BTreeMap::new();
        changes.insert(field.to_string(), value);
        self.patch(resource, changes).await
    }

    /// Conditional delete; only `204 No Content` counts as success.
    pub async fn delete(&self, resource: &T) -> Result<(), ClientError> {
        let item = resource.item();
        let etag = item.etag().ok_or(ClientError::MissingEtag)?;
        let link = item.self_link().ok_or(ClientError::MissingSelfLink)?;

        let res = self
            .session
            .request(Method::DELETE, link)?
            .header(IF_MATCH, etag)
            .send()
            .await?;
        if res.status() != StatusCode::NO_CONTENT {
            return Err(api_error(res).await);
        }
        info!(collection = T::COLLECTION, %link, "deleted item");
        Ok(())
    }

    fn wrap(&self, raw: Value) -> Result<T, ClientError> {
        ResourceItem::from_json(raw, self.schema.clone()).map(T::from_item)
    }
}
