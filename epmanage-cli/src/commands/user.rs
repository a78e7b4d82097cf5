use epmanage_shared::privilege::Privilege;

use super::{CommandError, CommandResult, Context, apply_edit, confirm_and_delete};
use crate::api::resource::{Lookup, Resource};
use crate::api::user::{User, UserClient};
use crate::util::format::{YELLOW, paint};
use crate::util::prompt::select_index;

pub async fn list(ctx: &Context) -> CommandResult {
    ctx.require(Privilege::Admin)?;
    let users = ctx.client::<User>().await.list(None).await?;
    print_numbered(ctx, &users)
}

pub async fn print(ctx: &Context, email: Option<String>) -> CommandResult {
    ctx.require(Privilege::Admin)?;
    let client: UserClient = ctx.client().await;

    let email = match email {
        Some(email) => email,
        None => {
            let users = client.list(None).await?;
            print_numbered(ctx, &users)?;
            let index = select_index("Select a user", users.len())?;
            users[index]
                .email()
                .map(str::to_string)
                .ok_or_else(|| CommandError::Fail("User not found".to_string()))?
        }
    };

    let user = fetch(&client, &email).await?;
    ctx.print_attributes(user.item());
    Ok(())
}

pub async fn set(ctx: &Context, email: &str, param: &str, value: &str) -> CommandResult {
    ctx.require(Privilege::Admin)?;
    let client: UserClient = ctx.client().await;
    let mut user = fetch(&client, email).await?;
    apply_edit(ctx, &client, &mut user, param, value).await
}

pub async fn delete(ctx: &Context, email: &str, assume_yes: bool) -> CommandResult {
    ctx.require(Privilege::ReadWrite)?;
    let client: UserClient = ctx.client().await;
    let user = fetch(&client, email).await?;
    confirm_and_delete(ctx, &client, &user, "User", assume_yes).await
}

async fn fetch(client: &UserClient, email: &str) -> Result<User, CommandError> {
    match client.lookup_email(email).await? {
        Lookup::Found(user) => Ok(user),
        Lookup::Missing => Err(CommandError::Fail("User not found".to_string())),
        Lookup::Ambiguous(n) => Err(CommandError::Fail(format!(
            "{} users match {}",
            n, email
        ))),
    }
}

fn print_numbered(ctx: &Context, users: &[User]) -> CommandResult {
    if users.is_empty() {
        return Err(CommandError::Warning("No data".to_string()));
    }
    for (i, user) in users.iter().enumerate() {
        println!("[{}] {}", i, paint(user.email().unwrap_or("None"), YELLOW, ctx.ansi));
    }
    Ok(())
}
