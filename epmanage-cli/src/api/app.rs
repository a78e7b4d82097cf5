use epmanage_shared::app::{AdminAppsResponse, AppActionRequest};
use reqwest::{Method, StatusCode};
use tracing::info;

use crate::api::item::ResourceItem;
use crate::api::resource::{Resource, ResourceClient};
use crate::api::{api_error, read_json};
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct App(ResourceItem);

impl App {
    pub fn name(&self) -> Option<&str> {
        self.0.get_str("name")
    }
}

impl Resource for App {
    const COLLECTION: &'static str = "app";

    fn from_item(item: ResourceItem) -> Self {
        App(item)
    }

    fn item(&self) -> &ResourceItem {
        &self.0
    }

    fn item_mut(&mut self) -> &mut ResourceItem {
        &mut self.0
    }
}

pub type AppClient = ResourceClient<App>;

impl ResourceClient<App> {
    pub async fn from_name(&self, name: &str) -> Result<Option<App>, ClientError> {
        self.get_by_field("name", name).await
    }

    /// Apps known to the deployment's admin registry.
    pub async fn admin_list(&self) -> Result<Vec<String>, ClientError> {
        let res = self
            .session()
            .request(Method::GET, "/admin/apps")?
            .send()
            .await?;
        if res.status() != StatusCode::OK {
            return Err(api_error(res).await);
        }
        let body: AdminAppsResponse = read_json(res).await?;
        Ok(body.apps)
    }

    /// Run an admin action (install, remove, ...) on an app.
    pub async fn manage(&self, name: &str, action: &str) -> Result<(), ClientError> {
        let res = self
            .session()
            .request(Method::POST, &format!("/admin/apps/{}", name))?
            .json(&AppActionRequest {
                action: action.to_string(),
            })
            .send()
            .await?;
        match res.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT => {
                info!(app = name, action, "app action accepted");
                Ok(())
            }
            _ => Err(api_error(res).await),
        }
    }
}
