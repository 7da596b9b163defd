// Library root
// -----------
// A client for the Hecate geodata server, usable as a script, from a
// terminal, or embedded as a library call. The binary (`main.rs`) parses
// arguments and hands the selected operation to [`Hecate::run`].
//
// Module responsibilities:
// - `api`: HTTP plumbing (URLs, basic auth, status classification).
// - `auth`: credentials and the server's auth rules, shared per process.
// - `eot`: framing of the streamed clone transfer.
// - `dispatch`: the scripted / interactive / embedded invocation pattern.
// - `commands`: the operations themselves.
// - `ui`: terminal prompting; `cli`: argument definitions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod eot;
pub mod error;
pub mod ui;

use std::io::Write;

use serde_json::Value;

pub use api::{ApiClient, CancelToken};
pub use auth::{AuthContext, AuthRules, Credentials, Policy};
pub use config::ClientConfig;
pub use dispatch::{EmbeddedMode, Invocation, Mode, ModeStrategy, Operation, Options, Output};
pub use eot::TransferOutcome;
pub use error::{HecateError, Result};

/// Top-level client: one server connection and the auth state every
/// invocation shares.
pub struct Hecate {
    api: ApiClient,
    auth: AuthContext,
}

impl Hecate {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api = ApiClient::new(config)?;
        let auth = config
            .credentials()
            .map(AuthContext::with_credentials)
            .unwrap_or_default();
        Ok(Self { api, auth })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthContext {
        &mut self.auth
    }

    /// Handle for aborting an in-flight transfer from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.api.cancel_token()
    }

    /// Run `op` under the given mode.
    pub fn run(
        &mut self,
        strategy: &mut dyn ModeStrategy,
        op: &dyn Operation,
        invocation: Invocation<'_>,
    ) -> Result<Output> {
        dispatch::dispatch(&self.api, &mut self.auth, strategy, op, invocation)
    }

    /// Run `op` as a library call; no prompting, nothing printed.
    pub fn embedded(&mut self, op: &dyn Operation, options: Options) -> Result<Output> {
        self.run(&mut EmbeddedMode, op, Invocation::new(options))
    }

    /// Run a streaming `op` as a library call, writing into `sink`.
    pub fn embedded_to<W: Write>(&mut self, op: &dyn Operation, options: Options, sink: W) -> Result<Output> {
        self.run(&mut EmbeddedMode, op, Invocation::new(options).with_sink(sink))
    }

    /// Fetch the server's auth rules and keep them for policy lookups.
    pub fn load_auth_rules(&mut self) -> Result<Value> {
        let rules = json_of(self.embedded(&commands::FetchAuthRules, Options::new())?)?;
        self.auth.set_rules(AuthRules::from_value(rules.clone())?);
        Ok(rules)
    }

    /// Clone the whole dataset into `sink`, returning the record count.
    ///
    /// On `TruncatedTransfer` the sink holds a partial dataset that must be
    /// discarded.
    pub fn clone_to<W: Write>(&mut self, sink: W) -> Result<u64> {
        match self.embedded_to(&commands::CloneGet, Options::new(), sink)? {
            Output::Streamed { records } => Ok(records.unwrap_or_default()),
            _ => Ok(0),
        }
    }

    pub fn bounds_list(&mut self) -> Result<Value> {
        json_of(self.embedded(&commands::BoundsList, Options::new())?)
    }

    /// Stream the raw data inside `bound` into `sink`.
    pub fn bounds_get<W: Write>(&mut self, bound: &str, sink: W) -> Result<()> {
        self.embedded_to(&commands::BoundsGet, Options::new().with("bound", bound), sink)?;
        Ok(())
    }

    pub fn register(&mut self, username: &str, email: &str, password: &str) -> Result<bool> {
        let options = Options::new()
            .with("username", username)
            .with("email", email)
            .with("password", password);
        ack_of(self.embedded(&commands::Register, options)?)
    }

    pub fn webhooks_list(&mut self) -> Result<Value> {
        json_of(self.embedded(&commands::WebhookList, Options::new())?)
    }

    pub fn webhook_get(&mut self, id: &str) -> Result<Value> {
        json_of(self.embedded(&commands::WebhookGet, Options::new().with("id", id))?)
    }

    /// `actions` is comma separated, e.g. `create,modify`.
    pub fn webhook_create(&mut self, name: &str, url: &str, actions: &str) -> Result<bool> {
        let options = Options::new()
            .with("name", name)
            .with("url", url)
            .with("actions", actions);
        ack_of(self.embedded(&commands::WebhookCreate, options)?)
    }

    pub fn webhook_update(&mut self, id: &str, name: &str, url: &str, actions: &str) -> Result<bool> {
        let options = Options::new()
            .with("id", id)
            .with("name", name)
            .with("url", url)
            .with("actions", actions);
        ack_of(self.embedded(&commands::WebhookUpdate, options)?)
    }

    pub fn webhook_delete(&mut self, id: &str) -> Result<bool> {
        ack_of(self.embedded(&commands::WebhookDelete, Options::new().with("id", id))?)
    }
}

fn json_of(output: Output) -> Result<Value> {
    match output {
        Output::Json(value) => Ok(value),
        other => Err(HecateError::Config(format!("expected a JSON response, got {other:?}"))),
    }
}

fn ack_of(output: Output) -> Result<bool> {
    Ok(matches!(output, Output::Ack))
}
