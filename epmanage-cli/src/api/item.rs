use std::collections::BTreeMap;
use std::sync::Arc;

use epmanage_shared::envelope::{ETAG_FIELD, LINKS_FIELD, Links};
use epmanage_shared::schema::{CollectionSchema, FieldDescriptor};
use serde_json::{Map, Value};

use crate::api::value::{FieldValue, convert};
use crate::error::{ClientError, ValidationError};

const ID_FIELD: &str = "_id";

/// A record of a schema-described collection.
///
/// Only fields declared in the schema are kept; anything else the server
/// sends (internal bookkeeping, undocumented fields) is dropped on load.
#[derive(Debug, Clone)]
pub struct ResourceItem {
    schema: Option<Arc<CollectionSchema>>,
    fields: BTreeMap<String, FieldValue>,
    id: Option<String>,
    self_link: Option<String>,
    etag: Option<String>,
}

impl ResourceItem {
    pub fn from_json(value: Value, schema: Option<Arc<CollectionSchema>>) -> Result<Self, ClientError> {
        let Value::Object(data) = value else {
            return Err(ClientError::InvalidResponse(format!(
                "expected an object, got {}",
                value
            )));
        };

        let mut item = Self {
            schema,
            fields: BTreeMap::new(),
            id: None,
            self_link: None,
            etag: None,
        };
        if let Some(schema) = item.schema.clone() {
            for (name, descriptor) in schema.iter() {
                let raw = data.get(name).unwrap_or(&Value::Null);
                let value = FieldValue::from_json(descriptor.field_type.as_ref(), raw);
                item.fields.insert(name.clone(), value);
            }
        }
        item.absorb_meta(&data);
        Ok(item)
    }

    /// Schema fields sorted by name, `Null` where the record has no value.
    pub fn attributes(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str)
    }

    /// Without a schema every field counts as writable.
    pub fn is_read_only(&self, field: &str) -> bool {
        self.descriptor(field).is_some_and(|d| d.readonly)
    }

    pub fn field_type(&self, field: &str) -> FieldDescriptor {
        self.descriptor(field).cloned().unwrap_or_default()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn self_link(&self) -> Option<&str> {
        self.self_link.as_deref()
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Validate a user edit and convert it to the declared type.
    pub fn prepare_edit(&self, field: &str, raw: &str) -> Result<FieldValue, ValidationError> {
        if !self.fields.contains_key(field) {
            return Err(ValidationError::InvalidParameter(field.to_string()));
        }
        if self.is_read_only(field) {
            return Err(ValidationError::ReadOnly(field.to_string()));
        }
        let descriptor = self.field_type(field);
        Ok(convert(descriptor.field_type.as_ref(), raw)?)
    }

    /// Record locally the values a successful update sent.
    pub(crate) fn apply(&mut self, changes: &BTreeMap<String, FieldValue>) {
        for (name, value) in changes {
            if let Some(slot) = self.fields.get_mut(name) {
                *slot = value.clone();
            }
        }
    }

    /// Merge an update response: new concurrency token, links and any
    /// schema fields the server echoed back.
    pub(crate) fn merge(&mut self, response: &Value) {
        let Some(data) = response.as_object() else {
            return;
        };
        if let Some(schema) = self.schema.clone() {
            for (name, raw) in data {
                if let Some(descriptor) = schema.get(name) {
                    let value = FieldValue::from_json(descriptor.field_type.as_ref(), raw);
                    self.fields.insert(name.clone(), value);
                }
            }
        }
        self.absorb_meta(data);
    }

    fn absorb_meta(&mut self, data: &Map<String, Value>) {
        if let Some(etag) = data.get(ETAG_FIELD).and_then(Value::as_str) {
            self.etag = Some(etag.to_string());
        }
        if let Some(id) = data.get(ID_FIELD).and_then(Value::as_str) {
            self.id = Some(id.to_string());
        }
        let href = data
            .get(LINKS_FIELD)
            .and_then(|links| serde_json::from_value::<Links>(links.clone()).ok())
            .and_then(|links| links.self_link)
            .map(|link| link.href);
        if href.is_some() {
            self.self_link = href;
        }
    }

    fn descriptor(&self, field: &str) -> Option<&FieldDescriptor> {
        self.schema.as_ref()?.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epmanage_shared::schema::FieldType;
    use serde_json::json;

    fn schema() -> Arc<CollectionSchema> {
        let mut s = CollectionSchema::new();
        s.insert(
            "uuid".into(),
            FieldDescriptor {
                field_type: Some(FieldType::String),
                readonly: true,
            },
        );
        s.insert(
            "hostname".into(),
            FieldDescriptor {
                field_type: Some(FieldType::String),
                readonly: false,
            },
        );
        s.insert(
            "enabled".into(),
            FieldDescriptor {
                field_type: Some(FieldType::Boolean),
                readonly: false,
            },
        );
        s.insert(
            "tags".into(),
            FieldDescriptor {
                field_type: Some(FieldType::List),
                readonly: false,
            },
        );
        Arc::new(s)
    }

    fn agent_json() -> Value {
        json!({
            "_id": "5890c1a1",
            "_etag": "etag-1",
            "_links": {"self": {"href": "agent/5890c1a1", "title": "Agent"}},
            "uuid": "0c5a",
            "hostname": "ws-01",
            "enabled": true,
            "secret_key": "do-not-show"
        })
    }

    #[test]
    fn test_attributes_only_schema_fields_sorted() {
        let item = ResourceItem::from_json(agent_json(), Some(schema())).unwrap();
        let names: Vec<&str> = item.attributes().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["enabled", "hostname", "tags", "uuid"]);
        assert!(item.get("secret_key").is_none());
        assert_eq!(item.get("tags"), Some(&FieldValue::Null));
        assert_eq!(item.get("enabled"), Some(&FieldValue::Boolean(true)));
    }

    #[test]
    fn test_reserved_fields() {
        let item = ResourceItem::from_json(agent_json(), Some(schema())).unwrap();
        assert_eq!(item.etag(), Some("etag-1"));
        assert_eq!(item.self_link(), Some("agent/5890c1a1"));
        assert_eq!(item.id(), Some("5890c1a1"));
    }

    #[test]
    fn test_edit_of_unknown_field_rejected() {
        let item = ResourceItem::from_json(agent_json(), Some(schema())).unwrap();
        assert_eq!(
            item.prepare_edit("secret_key", "x"),
            Err(ValidationError::InvalidParameter("secret_key".into()))
        );
        assert_eq!(
            item.prepare_edit("nope", "x").unwrap_err().to_string(),
            "Invalid parameter"
        );
    }

    #[test]
    fn test_edit_of_read_only_field_rejected() {
        let item = ResourceItem::from_json(agent_json(), Some(schema())).unwrap();
        let err = item.prepare_edit("uuid", "other").unwrap_err();
        assert_eq!(err, ValidationError::ReadOnly("uuid".into()));
        assert_eq!(err.to_string(), "The specified parameter is read-only");
    }

    #[test]
    fn test_edit_converts_to_declared_type() {
        let item = ResourceItem::from_json(agent_json(), Some(schema())).unwrap();
        assert_eq!(item.prepare_edit("enabled", "False").unwrap(), FieldValue::Boolean(false));
        assert_eq!(
            item.prepare_edit("tags", "prod|eu").unwrap(),
            FieldValue::List(vec![json!("prod"), json!("eu")])
        );
    }

    #[test]
    fn test_without_schema_nothing_visible_nothing_read_only() {
        let item = ResourceItem::from_json(agent_json(), None).unwrap();
        assert!(item.attributes().is_empty());
        assert!(!item.is_read_only("uuid"));
        assert_eq!(item.field_type("uuid"), FieldDescriptor::default());
        assert_eq!(item.etag(), Some("etag-1"));
        assert!(matches!(
            item.prepare_edit("hostname", "x"),
            Err(ValidationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_merge_refreshes_etag_and_fields() {
        let mut item = ResourceItem::from_json(agent_json(), Some(schema())).unwrap();
        let mut changes = BTreeMap::new();
        changes.insert("hostname".to_string(), FieldValue::String("ws-02".into()));
        item.apply(&changes);
        item.merge(&json!({"_status": "OK", "_etag": "etag-2", "enabled": false, "bogus": 1}));

        assert_eq!(item.etag(), Some("etag-2"));
        assert_eq!(item.get_str("hostname"), Some("ws-02"));
        assert_eq!(item.get("enabled"), Some(&FieldValue::Boolean(false)));
        assert!(item.get("bogus").is_none());
        assert_eq!(item.self_link(), Some("agent/5890c1a1"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(ResourceItem::from_json(json!([1, 2]), None).is_err());
    }
}
