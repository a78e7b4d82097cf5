use std::path::PathBuf;

use chrono::Utc;
use epmanage_shared::privilege::Privilege;
use tracing::warn;

use super::{CommandError, CommandResult, Context, apply_edit};
use crate::api::resource::Resource;
use crate::api::user::User;
use crate::auth::token::UNVERIFIED_SIGNATURE_NOTICE;
use crate::auth::{AuthPhase, Authenticator, Claims, TokenStore, privileges_of};
use crate::util::format::{GREEN, format_failure, format_relative_time, paint};
use crate::util::prompt::{prompt_line, prompt_password};

pub fn version(ctx: &Context) -> CommandResult {
    println!(
        "EPManage-cli {}",
        paint(env!("CARGO_PKG_VERSION"), GREEN, ctx.ansi)
    );
    Ok(())
}

pub struct LoginArgs {
    pub email: Option<String>,
    pub password: Option<String>,
    pub mfa: Option<String>,
    pub tokenfile: Option<PathBuf>,
}

pub async fn login(ctx: &Context, args: LoginArgs) -> CommandResult {
    let email = match args.email {
        Some(email) => email,
        None => prompt_line("Email")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => prompt_password("Password")?,
    };
    if !ctx.validation.is_signature_verified() {
        warn!("{}", UNVERIFIED_SIGNATURE_NOTICE);
    }

    let mut auth = Authenticator::new(ctx.session.clone(), ctx.validation.clone());
    auth.login(&email, &password).await?;

    if auth.phase() == AuthPhase::MfaPending {
        let expires = auth.claims().and_then(Claims::expires_at);
        match args.mfa {
            Some(code) => {
                auth.complete_mfa(&code).await?;
            }
            None => {
                while auth.phase() == AuthPhase::MfaPending
                    && expires.is_none_or(|exp| exp > Utc::now())
                {
                    let code = prompt_line("Enter MFA token")?;
                    if let Err(e) = auth.complete_mfa(&code).await {
                        println!("{}", format_failure("auth", &e.to_string(), ctx.ansi));
                    }
                }
            }
        }
        if auth.phase() != AuthPhase::Authenticated {
            return Err(CommandError::Fail("Invalid MFA token".to_string()));
        }
    }

    let (Some(token), Some(claims)) = (auth.token(), auth.claims()) else {
        return Err(CommandError::Fail("Invalid token".to_string()));
    };

    ctx.success("Auth success");
    print_token_summary(claims);

    let store = match args.tokenfile {
        Some(path) => TokenStore::new(path),
        None => ctx.token_store.clone(),
    };
    store.save(token)?;
    Ok(())
}

pub fn check_token(ctx: &Context) -> CommandResult {
    let claims = ctx
        .credentials
        .as_ref()
        .and_then(|c| c.claims())
        .ok_or_else(|| CommandError::Fail("Invalid token".to_string()))?;
    ctx.success("Valid token");
    print_token_summary(claims);
    Ok(())
}

pub fn logout(ctx: &Context) -> CommandResult {
    if ctx.token_store.clear()? {
        ctx.success("Token removed");
        Ok(())
    } else {
        Err(CommandError::Warning("No token".to_string()))
    }
}

/// Show, or with `param` and `value` edit, the logged-in user's record.
pub async fn profile(ctx: &Context, param: Option<String>, value: Option<String>) -> CommandResult {
    let claims = ctx.require(Privilege::ReadOnly)?;
    let user_id = claims
        .subject()
        .ok_or_else(|| CommandError::Fail("Invalid token".to_string()))?;

    let users = ctx.client::<User>().await;
    let mut user = users
        .get(user_id)
        .await
        .map_err(|e| CommandError::Fail(format!("Cannot get profile, {}", e)))?;

    match (param, value) {
        (Some(param), Some(value)) => apply_edit(ctx, &users, &mut user, &param, &value).await,
        _ => {
            ctx.print_attributes(user.item());
            Ok(())
        }
    }
}

fn print_token_summary(claims: &Claims) {
    if let Some(exp) = claims.expires_at() {
        println!(
            "  token expires {} ({})",
            format_relative_time(exp, Utc::now()),
            exp.to_rfc3339()
        );
    }
    println!("  privileges: {}", privileges_of(claims).join(","));
}
