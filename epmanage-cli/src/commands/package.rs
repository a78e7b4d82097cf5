use chrono::Utc;
use epmanage_shared::package::Package;
use epmanage_shared::privilege::Privilege;

use super::{CommandError, CommandResult, Context};
use crate::api::package::PackageClient;
use crate::util::format::{GREEN, format_relative_time, paint};
use crate::util::prompt::select_index;

pub async fn list(ctx: &Context) -> CommandResult {
    ctx.require(Privilege::ReadOnly)?;
    let groups = PackageClient::new(ctx.session.clone()).list().await?;
    if groups.is_empty() {
        return Err(CommandError::Warning("No data".to_string()));
    }

    for group in &groups {
        let generated = match group.generated_at() {
            Some(at) => format_relative_time(at, Utc::now()),
            None => group.date.clone().unwrap_or_else(|| "unknown".to_string()),
        };
        println!(
            "Packages for {}\t(Generated {})",
            paint(&group.os, GREEN, ctx.ansi),
            generated
        );
        for package in &group.packages {
            println!("  {}", describe(package));
        }
    }
    Ok(())
}

/// Fetches the package and writes it under its served name.
pub async fn download(
    ctx: &Context,
    os: &str,
    osversion: Option<&str>,
    arch: Option<&str>,
) -> CommandResult {
    ctx.require(Privilege::ReadOnly)?;

    let mut prompt_error = None;
    let mut choose = |candidates: &[&Package]| {
        for (i, package) in candidates.iter().enumerate() {
            println!("[{}] {}", i, describe(package));
        }
        select_index("Select a package", candidates.len()).unwrap_or_else(|e| {
            prompt_error = Some(e);
            candidates.len()
        })
    };

    let result = PackageClient::new(ctx.session.clone())
        .download(os, osversion, arch, Some(&mut choose))
        .await;
    if let Some(e) = prompt_error {
        return Err(CommandError::Other(e));
    }
    let package = result?;

    std::fs::write(&package.filename, &package.content).map_err(|e| {
        CommandError::Fail(format!("Cannot save file to disk: {}", e))
    })?;
    ctx.success(&format!("Download successful : {}", package.filename));
    Ok(())
}

/// `[osversion] [arch] name`
fn describe(package: &Package) -> String {
    [package.osversion.as_deref(), package.arch.as_deref(), Some(package.name.as_str())]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}
