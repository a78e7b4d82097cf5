use serde::{Deserialize, Serialize};

/// Body of `GET /admin/apps`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminAppsResponse {
    #[serde(default)]
    pub apps: Vec<String>,
}

/// Body of `POST /admin/apps/<name>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppActionRequest {
    pub action: String,
}
