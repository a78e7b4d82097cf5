use epmanage_shared::privilege::Privilege;

use super::{CommandError, CommandResult, Context, apply_edit, confirm_and_delete};
use crate::api::agent::{Agent, AgentClient, Tag};
use crate::api::resource::Resource;
use crate::util::format::{GREEN, YELLOW, paint};
use crate::util::prompt::select_index;

pub async fn list(ctx: &Context) -> CommandResult {
    ctx.require(Privilege::ReadOnly)?;
    let agents = ctx.client::<Agent>().await.list(None).await?;
    print_numbered(ctx, &agents)
}

/// Without a uuid, lists the agents and asks which one to show.
pub async fn print(ctx: &Context, uuid: Option<String>) -> CommandResult {
    ctx.require(Privilege::ReadOnly)?;
    let client: AgentClient = ctx.client().await;

    let uuid = match uuid {
        Some(uuid) => uuid,
        None => {
            let agents = client.list(None).await?;
            print_numbered(ctx, &agents)?;
            let index = select_index("Select an agent", agents.len())?;
            agents[index]
                .uuid()
                .map(str::to_string)
                .ok_or_else(|| CommandError::Fail("Agent not found".to_string()))?
        }
    };

    let agent = fetch(&client, &uuid).await?;
    ctx.print_attributes(agent.item());
    Ok(())
}

pub async fn set(ctx: &Context, uuid: &str, param: &str, value: &str) -> CommandResult {
    ctx.require(Privilege::ReadWrite)?;
    let client: AgentClient = ctx.client().await;
    let mut agent = fetch(&client, uuid).await?;
    apply_edit(ctx, &client, &mut agent, param, value).await
}

pub async fn delete(ctx: &Context, uuid: &str, assume_yes: bool) -> CommandResult {
    ctx.require(Privilege::ReadWrite)?;
    let client: AgentClient = ctx.client().await;
    let agent = fetch(&client, uuid).await?;
    confirm_and_delete(ctx, &client, &agent, "Agent", assume_yes).await
}

async fn fetch(client: &AgentClient, uuid: &str) -> Result<Agent, CommandError> {
    client
        .get(uuid)
        .await
        .map_err(|_| CommandError::Fail("Agent not found".to_string()))
}

fn print_numbered(ctx: &Context, agents: &[Agent]) -> CommandResult {
    if agents.is_empty() {
        return Err(CommandError::Warning("No data".to_string()));
    }
    for (i, agent) in agents.iter().enumerate() {
        println!("[{}] {}", i, summary(agent, ctx.ansi));
    }
    Ok(())
}

/// `uuid hostname (os osversion) [tag]...`
fn summary(agent: &Agent, ansi: bool) -> String {
    let mut line = format!(
        "{} {} ({} {})",
        paint(agent.uuid().unwrap_or("None"), YELLOW, ansi),
        agent.hostname().unwrap_or("None"),
        agent.os().unwrap_or("None"),
        agent.osversion().unwrap_or("None"),
    );
    for tag in agent.tags() {
        line.push(' ');
        line.push_str(&format_tag(&tag, ansi));
    }
    line
}

fn format_tag(tag: &Tag, ansi: bool) -> String {
    if tag.is_system() {
        format!("[{}]", paint(&tag.name, GREEN, ansi))
    } else {
        format!("[{}]", tag.name)
    }
}
