use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::api::schema::SchemaCache;
use crate::auth::{Credentials, TokenStore};
use crate::commands::{self, CommandError, Context};
use crate::config::Config;
use crate::session::Session;
use crate::util::format::{format_failure, format_warning};

#[derive(Parser)]
#[command(name = "epmanage")]
#[command(version, about = "Command line client for the EPControl management backend", long_about = None)]
pub struct Cli {
    /// Location of the token
    #[arg(long, global = true, env = "EPMANAGE_TOKEN")]
    tokenfile: Option<PathBuf>,

    /// API base url
    #[arg(long, global = true, env = "EPMANAGE_URL")]
    baseurl: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,

    /// Log in and store the token
    Auth {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// MFA token
        #[arg(long)]
        mfa: Option<String>,

        /// Where to write the token (defaults to --tokenfile)
        #[arg(value_name = "TOKENFILE")]
        output: Option<PathBuf>,
    },

    /// Validate the stored token and show its privileges
    CheckToken,

    /// Remove the stored token
    Logout,

    /// Show or edit your own user record
    Profile {
        param: Option<String>,
        value: Option<String>,
    },

    /// Local configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Agent management commands
    #[command(subcommand)]
    Agent(AgentCommands),

    /// Application management commands
    #[command(subcommand)]
    App(AppCommands),

    /// Agent installer packages
    #[command(subcommand)]
    Package(PackageCommands),

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Store the API base url
    SetUrl { url: String },
    /// Remove the configuration file
    Clear,
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List all agents
    List,
    /// Show every attribute of an agent
    Print { uuid: Option<String> },
    /// Change one attribute of an agent
    Set {
        uuid: String,
        param: String,
        value: String,
    },
    /// Delete an agent
    Delete {
        uuid: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AppCommands {
    /// List installed applications
    List,
    /// Compare the admin registry with installed applications
    Adminlist,
    /// Run an admin action on an application
    Manage { action: String, name: String },
}

#[derive(Subcommand)]
enum PackageCommands {
    /// List available packages
    List,
    /// Download a package into the current directory
    Download {
        os: String,
        /// OS version
        #[arg(long)]
        osversion: Option<String>,
        /// Architecture
        #[arg(long)]
        arch: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List all users
    List,
    /// Show every attribute of a user
    Print { email: Option<String> },
    /// Change one attribute of a user
    Set {
        email: String,
        param: String,
        value: String,
    },
    /// Delete a user
    Delete {
        email: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Version => "version",
            Commands::Auth { .. } => "auth",
            Commands::CheckToken => "check-token",
            Commands::Logout => "logout",
            Commands::Profile { .. } => "profile",
            Commands::Config(cmd) => match cmd {
                ConfigCommands::Show => "config show",
                ConfigCommands::SetUrl { .. } => "config set-url",
                ConfigCommands::Clear => "config clear",
            },
            Commands::Agent(cmd) => match cmd {
                AgentCommands::List => "agent list",
                AgentCommands::Print { .. } => "agent print",
                AgentCommands::Set { .. } => "agent set",
                AgentCommands::Delete { .. } => "agent delete",
            },
            Commands::App(cmd) => match cmd {
                AppCommands::List => "app list",
                AppCommands::Adminlist => "app adminlist",
                AppCommands::Manage { .. } => "app manage",
            },
            Commands::Package(cmd) => match cmd {
                PackageCommands::List => "package list",
                PackageCommands::Download { .. } => "package download",
            },
            Commands::User(cmd) => match cmd {
                UserCommands::List => "user list",
                UserCommands::Print { .. } => "user print",
                UserCommands::Set { .. } => "user set",
                UserCommands::Delete { .. } => "user delete",
            },
        }
    }
}

pub async fn cli() -> ExitCode {
    let cli = Cli::parse();
    let name = cli.command.name();
    let ansi = std::io::stdout().is_terminal();

    match run(cli, ansi).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let line = match &e {
                CommandError::Fail(msg) => format_failure(name, msg, ansi),
                CommandError::Warning(msg) => format_warning(name, msg, ansi),
                CommandError::Other(e) => format_failure(name, &format!("{:#}", e), ansi),
            };
            eprintln!("{}", line);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, ansi: bool) -> Result<(), CommandError> {
    let config = Config::load_or_default();
    let ctx = build_context(&cli, config, ansi)?;

    match cli.command {
        Commands::Version => commands::auth::version(&ctx),
        Commands::Auth {
            email,
            password,
            mfa,
            output,
        } => {
            let args = commands::auth::LoginArgs {
                email,
                password,
                mfa,
                tokenfile: output,
            };
            commands::auth::login(&ctx, args).await
        }
        Commands::CheckToken => commands::auth::check_token(&ctx),
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Profile { param, value } => commands::auth::profile(&ctx, param, value).await,
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(&ctx),
            ConfigCommands::SetUrl { url } => commands::config::set_url(&ctx, &url),
            ConfigCommands::Clear => commands::config::clear(&ctx),
        },
        Commands::Agent(cmd) => match cmd {
            AgentCommands::List => commands::agent::list(&ctx).await,
            AgentCommands::Print { uuid } => commands::agent::print(&ctx, uuid).await,
            AgentCommands::Set { uuid, param, value } => {
                commands::agent::set(&ctx, &uuid, &param, &value).await
            }
            AgentCommands::Delete { uuid, yes } => commands::agent::delete(&ctx, &uuid, yes).await,
        },
        Commands::App(cmd) => match cmd {
            AppCommands::List => commands::app::list(&ctx).await,
            AppCommands::Adminlist => commands::app::admin_list(&ctx).await,
            AppCommands::Manage { action, name } => {
                commands::app::manage(&ctx, &action, &name).await
            }
        },
        Commands::Package(cmd) => match cmd {
            PackageCommands::List => commands::package::list(&ctx).await,
            PackageCommands::Download {
                os,
                osversion,
                arch,
            } => {
                commands::package::download(&ctx, &os, osversion.as_deref(), arch.as_deref()).await
            }
        },
        Commands::User(cmd) => match cmd {
            UserCommands::List => commands::user::list(&ctx).await,
            UserCommands::Print { email } => commands::user::print(&ctx, email).await,
            UserCommands::Set {
                email,
                param,
                value,
            } => commands::user::set(&ctx, &email, &param, &value).await,
            UserCommands::Delete { email, yes } => {
                commands::user::delete(&ctx, &email, yes).await
            }
        },
    }
}

/// Resolve settings (flag > environment > config file > default) and read
/// the stored token.
fn build_context(cli: &Cli, config: Config, ansi: bool) -> anyhow::Result<Context> {
    let session = Session::with_timeout(config.timeout())?;
    if let Some(base_url) = config.base_url_or(cli.baseurl.as_deref()) {
        session.set_base_url(base_url);
    }

    let validation = config.token_validation()?;
    let token_store = TokenStore::new(config.token_file_or(cli.tokenfile.as_deref()));
    let credentials = match token_store.load() {
        Ok(raw) => raw.map(|raw| Credentials::new(raw, validation.clone())),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable token file");
            None
        }
    };

    Ok(Context {
        session: Arc::new(session),
        schemas: SchemaCache::new(),
        validation,
        credentials,
        token_store,
        config,
        ansi,
    })
}
