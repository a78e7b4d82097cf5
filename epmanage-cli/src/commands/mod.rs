//! Handlers behind each CLI command.

pub mod agent;
pub mod app;
pub mod auth;
pub mod config;
pub mod package;
pub mod user;

use std::sync::Arc;

use epmanage_shared::privilege::Privilege;

use crate::api::item::ResourceItem;
use crate::api::package::PackageError;
use crate::api::resource::{Resource, ResourceClient};
use crate::api::schema::SchemaCache;
use crate::auth::{AuthError, Claims, Credentials, TokenStore, TokenValidation, require_privilege};
use crate::config::Config;
use crate::error::ClientError;
use crate::session::Session;
use crate::util::format::{GREEN, format_attribute, paint};

/// Outcome of a command that did not complete; both kinds exit with 1.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Printed as `<command> failed: <msg>`.
    #[error("{0}")]
    Fail(String),

    /// Printed as `<command> error: <msg>`.
    #[error("{0}")]
    Warning(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<AuthError> for CommandError {
    fn from(e: AuthError) -> Self {
        CommandError::Fail(e.to_string())
    }
}

impl From<ClientError> for CommandError {
    fn from(e: ClientError) -> Self {
        CommandError::Fail(e.to_string())
    }
}

impl From<PackageError> for CommandError {
    fn from(e: PackageError) -> Self {
        CommandError::Fail(e.to_string())
    }
}

pub type CommandResult = Result<(), CommandError>;

/// Everything a handler needs, built once per process.
pub struct Context {
    pub session: Arc<Session>,
    pub schemas: SchemaCache,
    pub validation: TokenValidation,
    pub credentials: Option<Credentials>,
    pub token_store: TokenStore,
    pub config: Config,
    pub ansi: bool,
}

impl Context {
    /// Privilege gate; every protected handler calls it first.
    pub fn require(&self, privilege: Privilege) -> Result<Claims, CommandError> {
        Ok(require_privilege(
            self.credentials.as_ref(),
            privilege,
            &self.session,
        )?)
    }

    pub async fn client<T: Resource>(&self) -> ResourceClient<T> {
        ResourceClient::new(self.session.clone(), &self.schemas).await
    }

    pub fn success(&self, message: &str) {
        println!("{}", paint(message, GREEN, self.ansi));
    }

    pub fn print_attributes(&self, item: &ResourceItem) {
        for (name, value) in item.attributes() {
            println!("{}", format_attribute(name, &value.to_string(), self.ansi));
        }
    }
}

/// Validate and send one field update, reporting the outcome.
pub(crate) async fn apply_edit<T: Resource>(
    ctx: &Context,
    client: &ResourceClient<T>,
    resource: &mut T,
    param: &str,
    value: &str,
) -> CommandResult {
    match client.edit(resource, param, value).await {
        Ok(()) => {
            ctx.success("Update successful");
            Ok(())
        }
        Err(ClientError::Validation(e)) => Err(CommandError::Fail(e.to_string())),
        Err(e) => Err(CommandError::Fail(format!("Update error: {}", e))),
    }
}

/// Asks unless `assume_yes`, then deletes.
pub(crate) async fn confirm_and_delete<T: Resource>(
    ctx: &Context,
    client: &ResourceClient<T>,
    resource: &T,
    kind: &str,
    assume_yes: bool,
) -> CommandResult {
    let question = format!("Do you really want to delete this {}?", kind.to_lowercase());
    if !assume_yes && !crate::util::prompt::confirm(&question)? {
        return Ok(());
    }
    client
        .delete(resource)
        .await
        .map_err(|e| CommandError::Fail(format!("Deletion error: {}", e)))?;
    ctx.success(&format!("{} deleted", kind));
    Ok(())
}
