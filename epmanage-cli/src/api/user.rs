use crate::api::item::ResourceItem;
use crate::api::resource::{Lookup, Resource, ResourceClient};
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct User(ResourceItem);

impl User {
    pub fn email(&self) -> Option<&str> {
        self.0.get_str("email")
    }
}

impl Resource for User {
    const COLLECTION: &'static str = "user";

    fn from_item(item: ResourceItem) -> Self {
        User(item)
    }

    fn item(&self) -> &ResourceItem {
        &self.0
    }

    fn item_mut(&mut self) -> &mut ResourceItem {
        &mut self.0
    }
}

pub type UserClient = ResourceClient<User>;

impl ResourceClient<User> {
    pub async fn from_email(&self, email: &str) -> Result<Option<User>, ClientError> {
        self.get_by_field("email", email).await
    }

    pub async fn lookup_email(&self, email: &str) -> Result<Lookup<User>, ClientError> {
        self.find_by_field("email", email).await
    }
}
