//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use evento_core::client::{ClientConfig, EventoClient};
use evento_core::forms::{NewEventForm, RegistrationForm};
use evento_core::session::CookieFileSession;
use evento_core::{config, logging};

mod commands;
pub mod output;

use output::Output;

/// Client type used by every API command.
pub(crate) type Client = EventoClient<CookieFileSession>;

#[derive(Parser)]
#[command(name = "evento")]
#[command(version)]
#[command(about = "Browse, join and create events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print the raw result envelope as JSON
    #[arg(long, global = true)]
    json: bool,

    /// API base URL (overrides EVENTO_BASE_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Browse and manage events
    Events {
        #[command(subcommand)]
        command: EventCommands,
    },
    /// List event categories
    Categories,
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "EVENTO_PASSWORD", hide_env_values = true)]
        password: String,
        /// Must match --password
        #[arg(long, value_name = "PASSWORD")]
        password_confirmation: String,
    },
    /// Sign in and store the session
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long, env = "EVENTO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Signout,
    /// Check whether the stored session is still valid
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum EventCommands {
    /// List all events
    List {
        /// Only show events whose title, description or location matches
        #[arg(short, long, value_name = "QUERY")]
        filter: Option<String>,
    },
    /// Show a single event
    Show {
        #[arg(value_name = "EVENT_ID")]
        id: u64,
    },
    /// List events of the signed-in user
    Mine,
    /// List who attends an event
    Attendees {
        #[arg(value_name = "EVENT_ID")]
        id: u64,
    },
    /// Join an event
    Attend {
        #[arg(value_name = "EVENT_ID")]
        id: u64,
    },
    /// Leave an event
    Leave {
        #[arg(value_name = "EVENT_ID")]
        id: u64,
    },
    /// Create a new event
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Category name
        #[arg(long)]
        category: String,
        /// Start time, RFC 3339 (e.g. 2026-10-20T18:00:00+03:00)
        #[arg(long, value_name = "TIME")]
        time: Option<String>,
        #[arg(long, default_value = "")]
        location: String,
        /// Image URL
        #[arg(long, value_name = "URL")]
        image: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // A broken config file only fails the commands that need it.
    let config = config::Config::load().context("load config");
    let logging_config = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let _log_guard = logging::init(&logging_config).context("init logging")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli, config).await })
}

async fn dispatch(cli: Cli, config: Result<config::Config>) -> Result<()> {
    let Cli {
        command,
        json,
        base_url,
    } = cli;
    let out = Output::new(json);

    // Resolved up front, surfaced only by commands that talk to the API.
    let client = config.and_then(|config| connect(&config, base_url.as_deref()));

    match command {
        Commands::Events { command } => {
            let client = client?;
            match command {
                EventCommands::List { filter } => {
                    commands::events::list(&client, &out, filter.as_deref()).await
                }
                EventCommands::Show { id } => commands::events::show(&client, &out, id).await,
                EventCommands::Mine => commands::events::mine(&client, &out).await,
                EventCommands::Attendees { id } => {
                    commands::events::attendees(&client, &out, id).await
                }
                EventCommands::Attend { id } => {
                    commands::events::attend(&client, &out, id, true).await
                }
                EventCommands::Leave { id } => {
                    commands::events::attend(&client, &out, id, false).await
                }
                EventCommands::Create {
                    title,
                    description,
                    category,
                    time,
                    location,
                    image,
                } => {
                    let form = NewEventForm {
                        title,
                        description,
                        category,
                        start_time: time,
                        location,
                        image,
                    };
                    commands::events::create(&client, &out, &form).await
                }
            }
        }

        Commands::Categories => commands::categories::list(&client?, &out).await,

        Commands::Register {
            name,
            email,
            password,
            password_confirmation,
        } => {
            let form = RegistrationForm {
                name,
                email,
                password,
                password_confirmation,
            };
            commands::auth::register(&client?, &out, &form).await
        }
        Commands::Signin { email, password } => {
            commands::auth::signin(&client?, &out, &email, &password).await
        }
        Commands::Signout => commands::auth::signout(&client?, &out),
        Commands::Status => commands::auth::status(&client?, &out).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

fn connect(config: &config::Config, base_url: Option<&str>) -> Result<Client> {
    let client_config = ClientConfig::from_config(config, base_url).context("resolve base URL")?;
    tracing::debug!(base_url = %client_config.base_url, "using API");
    EventoClient::new(client_config, CookieFileSession::default_location())
}
