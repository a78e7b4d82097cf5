use super::{CommandError, CommandResult, Context};
use crate::config::Config;
use crate::util::format::format_attribute;

pub fn show(ctx: &Context) -> CommandResult {
    let path = Config::config_file_path()?;
    println!("{}", format_attribute("config_file", &path.display().to_string(), ctx.ansi));

    let config = &ctx.config;
    let base_url = ctx.session.base_url().unwrap_or_else(|| "None".to_string());
    println!("{}", format_attribute("base_url", &base_url, ctx.ansi));
    println!(
        "{}",
        format_attribute("token_file", &ctx.token_store.path().display().to_string(), ctx.ansi)
    );
    let key = config
        .token_public_key
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "None (signatures not verified)".to_string());
    println!("{}", format_attribute("token_public_key", &key, ctx.ansi));
    let timeout = config
        .timeout_secs
        .map(|s| format!("{}s", s))
        .unwrap_or_else(|| "None".to_string());
    println!("{}", format_attribute("timeout", &timeout, ctx.ansi));
    Ok(())
}

pub fn set_url(ctx: &Context, url: &str) -> CommandResult {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CommandError::Fail(format!("Invalid url: {}", url)));
    }
    let config = Config {
        base_url: Some(url.trim_end_matches('/').to_string()),
        ..ctx.config.clone()
    };
    config.save()?;
    ctx.success("Configuration saved");
    Ok(())
}

pub fn clear(ctx: &Context) -> CommandResult {
    if Config::clear()? {
        ctx.success("Configuration removed");
        Ok(())
    } else {
        Err(CommandError::Warning("No configuration file".to_string()))
    }
}
