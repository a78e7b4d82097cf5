use serde::Deserialize;
use serde_json::Value;

use crate::api::item::ResourceItem;
use crate::api::resource::{Resource, ResourceClient};
use crate::api::value::FieldValue;

/// A managed endpoint agent.
#[derive(Debug, Clone)]
pub struct Agent(ResourceItem);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl Tag {
    pub fn is_system(&self) -> bool {
        self.kind.as_deref() == Some("system")
    }
}

impl Agent {
    pub fn uuid(&self) -> Option<&str> {
        self.0.get_str("uuid")
    }

    pub fn hostname(&self) -> Option<&str> {
        self.0.get_str("hostname")
    }

    pub fn os(&self) -> Option<&str> {
        self.0.get_str("os")
    }

    pub fn osversion(&self) -> Option<&str> {
        self.0.get_str("osversion")
    }

    /// Tags that parse as `{name, type}`; anything else is skipped.
    pub fn tags(&self) -> Vec<Tag> {
        let items = match self.0.get("tags") {
            Some(FieldValue::List(items)) => items.clone(),
            Some(FieldValue::Raw(Value::Array(items))) => items.clone(),
            _ => return Vec::new(),
        };
        items
            .into_iter()
            .filter_map(|t| serde_json::from_value(t).ok())
            .collect()
    }
}

impl Resource for Agent {
    const COLLECTION: &'static str = "agent";

    fn from_item(item: ResourceItem) -> Self {
        Agent(item)
    }

    fn item(&self) -> &ResourceItem {
        &self.0
    }

    fn item_mut(&mut self) -> &mut ResourceItem {
        &mut self.0
    }
}

pub type AgentClient = ResourceClient<Agent>;
