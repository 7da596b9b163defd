//! CLI argument definitions

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::commands::{
    BoundsGet, BoundsList, CloneGet, FetchAuthRules, Register, WebhookCreate, WebhookDelete,
    WebhookGet, WebhookList, WebhookUpdate,
};
use crate::config::{ClientConfig, DEFAULT_PORT, DEFAULT_URL};
use crate::dispatch::{Operation, Options};

#[derive(Parser, Debug)]
#[command(name = "hecate")]
#[command(author, version, about = "Command line client for the Hecate geodata server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Never prompt; use only the flags and credentials given
    #[arg(long, global = true)]
    pub script: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server host, optionally with scheme
    #[arg(long, global = true, env = "HECATE_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Server port
    #[arg(long, global = true, env = "HECATE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Request timeout in seconds (default: none)
    #[arg(long, global = true, env = "HECATE_TIMEOUT")]
    pub timeout: Option<u64>,

    #[arg(long, global = true, env = "HECATE_USERNAME")]
    pub username: Option<String>,

    #[arg(long, global = true, env = "HECATE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Cli {
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            url: self.url.clone(),
            port: self.port,
            timeout: self.timeout.map(Duration::from_secs),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the server's auth rules
    Auth,

    /// Query the bounds API
    Bounds {
        #[command(subcommand)]
        action: Option<BoundsAction>,
    },

    /// Fetch a complete dataset from the server
    Clone {
        #[command(subcommand)]
        action: Option<CloneAction>,
    },

    /// Register a new user account
    Register(RegisterArgs),

    /// Manage webhooks
    Webhooks {
        #[command(subcommand)]
        action: Option<WebhookAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BoundsAction {
    /// List the bounds available on the server
    List,
    /// Stream the data within a bound
    Get {
        #[arg(long)]
        bound: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum CloneAction {
    /// Stream LDgeoJSON of all the data on the server
    Get,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Name of the new account
    #[arg(long = "user")]
    pub account: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Password of the new account (prompted for when omitted)
    #[arg(long = "new-password")]
    pub account_password: Option<String>,
}

#[derive(Args, Debug)]
pub struct WebhookFields {
    #[arg(long)]
    pub name: Option<String>,
    /// URL the server posts to
    #[arg(long = "hook-url")]
    pub hook_url: Option<String>,
    /// Comma separated server actions, e.g. `create,modify`
    #[arg(long)]
    pub actions: Option<String>,
}

impl WebhookFields {
    fn into_options(self, mut options: Options) -> Options {
        options.set_opt("name", self.name);
        options.set_opt("url", self.hook_url);
        options.set_opt("actions", self.actions);
        options
    }
}

#[derive(Subcommand, Debug)]
pub enum WebhookAction {
    /// List webhooks currently active on the server
    List,
    /// Get a specific webhook
    Get {
        #[arg(long)]
        id: Option<String>,
    },
    /// Create a new webhook
    Create(WebhookFields),
    /// Update an existing webhook
    Update {
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        fields: WebhookFields,
    },
    /// Delete an existing webhook
    Delete {
        #[arg(long)]
        id: Option<String>,
    },
}

/// What the parsed command line asks for.
pub enum Selection {
    Run(Box<dyn Operation>, Options),
    /// A command group without a subcommand: print its usage.
    Help(Box<dyn Operation>),
}

impl Commands {
    pub fn select(self) -> Selection {
        match self {
            Commands::Auth => Selection::Run(Box::new(FetchAuthRules), Options::new()),
            Commands::Bounds { action } => match action {
                None => Selection::Help(Box::new(BoundsGet)),
                Some(BoundsAction::List) => Selection::Run(Box::new(BoundsList), Options::new()),
                Some(BoundsAction::Get { bound }) => {
                    let mut options = Options::new();
                    options.set_opt("bound", bound);
                    Selection::Run(Box::new(BoundsGet), options)
                }
            },
            Commands::Clone { action } => match action {
                None => Selection::Help(Box::new(CloneGet)),
                Some(CloneAction::Get) => Selection::Run(Box::new(CloneGet), Options::new()),
            },
            Commands::Register(args) => {
                let mut options = Options::new();
                options.set_opt("username", args.account);
                options.set_opt("email", args.email);
                options.set_opt("password", args.account_password);
                Selection::Run(Box::new(Register), options)
            }
            Commands::Webhooks { action } => match action {
                None => Selection::Help(Box::new(WebhookList)),
                Some(WebhookAction::List) => Selection::Run(Box::new(WebhookList), Options::new()),
                Some(WebhookAction::Get { id }) => {
                    let mut options = Options::new();
                    options.set_opt("id", id);
                    Selection::Run(Box::new(WebhookGet), options)
                }
                Some(WebhookAction::Create(fields)) => {
                    Selection::Run(Box::new(WebhookCreate), fields.into_options(Options::new()))
                }
                Some(WebhookAction::Update { id, fields }) => {
                    let mut options = Options::new();
                    options.set_opt("id", id);
                    Selection::Run(Box::new(WebhookUpdate), fields.into_options(options))
                }
                Some(WebhookAction::Delete { id }) => {
                    let mut options = Options::new();
                    options.set_opt("id", id);
                    Selection::Run(Box::new(WebhookDelete), options)
                }
            },
        }
    }
}
