use std::collections::HashSet;

use epmanage_shared::privilege::Privilege;

use super::{CommandError, CommandResult, Context};
use crate::api::app::{App, AppClient};
use crate::util::format::{GREEN, RED, YELLOW, paint};

pub async fn list(ctx: &Context) -> CommandResult {
    ctx.require(Privilege::ReadOnly)?;
    let apps = ctx.client::<App>().await.list(None).await?;
    if apps.is_empty() {
        return Err(CommandError::Warning("No data".to_string()));
    }
    for (i, app) in apps.iter().enumerate() {
        println!("[{}] {}", i, paint(app.name().unwrap_or("None"), YELLOW, ctx.ansi));
    }
    Ok(())
}

/// Registry entries, green when the app is installed and red otherwise.
pub async fn admin_list(ctx: &Context) -> CommandResult {
    ctx.require(Privilege::SuperAdmin)?;
    let client: AppClient = ctx.client().await;

    let installed = client.list(None).await?;
    if installed.is_empty() {
        return Err(CommandError::Warning("No data".to_string()));
    }
    let installed: HashSet<&str> = installed.iter().filter_map(App::name).collect();

    let registry = client.admin_list().await?;
    if registry.is_empty() {
        return Err(CommandError::Warning("No apps in adminlist".to_string()));
    }
    for name in &registry {
        let color = if installed.contains(name.as_str()) { GREEN } else { RED };
        println!("{}", paint(name, color, ctx.ansi));
    }
    Ok(())
}

pub async fn manage(ctx: &Context, action: &str, name: &str) -> CommandResult {
    ctx.require(Privilege::SuperAdmin)?;
    let client: AppClient = ctx.client().await;
    client.manage(name, action).await?;
    ctx.success("Success");
    Ok(())
}
