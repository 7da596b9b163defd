//! The invocation pattern every command shares.
//!
//! A command runs in one of three [`Mode`]s. Each mode is a [`ModeStrategy`]
//! that decides which fields to solicit, whether credentials are needed,
//! where streamed output goes and how results are delivered. [`dispatch`]
//! drives one invocation through
//! `UNRESOLVED -> RESOLVING_CREDENTIALS -> EXECUTING -> {SUCCEEDED, FAILED}`,
//! always prompting strictly before the request is issued.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use indicatif::ProgressBar;
use serde_json::Value;
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::AuthContext;
use crate::error::{HecateError, Result};
use crate::ui;

/// Field names used when prompting for credentials.
pub const USERNAME_FIELD: &str = "hecate_username";
pub const PASSWORD_FIELD: &str = "hecate_password";

/// Prompt text for a Hecate account name, when logging in or registering.
pub const USERNAME_PROMPT: &str = "Your Slack/Github Username";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Never prompt; print results to stdout; errors are fatal.
    Scripted,
    /// Prompt for missing fields and, when the policy demands, credentials.
    Interactive,
    /// Library call with fully populated options; results are returned.
    Embedded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unresolved,
    ResolvingCredentials,
    Executing,
    Succeeded,
    Failed,
}

/// One value to collect from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub prompt: String,
    pub required: bool,
    pub secret: bool,
    pub default: Option<String>,
}

impl FieldDescriptor {
    pub fn required(name: &str, prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            prompt: prompt.to_string(),
            required: true,
            secret: false,
            default: None,
        }
    }

    pub fn optional(name: &str, prompt: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, prompt)
        }
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// The two credential fields appended when a prompt must authenticate.
pub fn credential_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::required(USERNAME_FIELD, USERNAME_PROMPT),
        FieldDescriptor::required(PASSWORD_FIELD, "Your password").secret(),
    ]
}

/// Collects values for a list of fields, e.g. from a terminal.
///
/// Implementations return `name -> value` for the fields they were given or
/// fail with [`HecateError::PromptAborted`] when the user gives up.
pub trait Prompter {
    fn prompt(&mut self, fields: &[FieldDescriptor]) -> Result<BTreeMap<String, String>>;
}

/// String options keyed by field name. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Set `name` only when a value is given.
    pub fn set_opt(&mut self, name: &str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.set(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name).ok_or_else(|| HecateError::missing(name))
    }

    /// A required comma-separated list, e.g. `create,modify`.
    pub fn require_list(&self, name: &str) -> Result<Vec<String>> {
        let items: Vec<String> = self
            .require(name)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if items.is_empty() {
            return Err(HecateError::missing(name));
        }
        Ok(items)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Json(Value),
    /// The server accepted the request; the library result is `true`.
    Ack,
    /// Output went to the sink.
    Streamed { records: Option<u64> },
}

/// A command's core: its fields, its auth rule and the one request it makes.
pub trait Operation {
    /// e.g. `webhooks create`
    fn name(&self) -> &'static str;

    fn usage(&self) -> &'static str;

    /// Print usage to stderr.
    fn help(&self) {
        eprintln!("{}", self.usage());
    }

    /// Required non-auth fields, in prompt order.
    fn fields(&self) -> Vec<FieldDescriptor> {
        Vec::new()
    }

    /// `(resource, action)` in the server's auth rules, or `None` if the
    /// operation never sends credentials.
    fn policy(&self) -> Option<(&'static str, &'static str)> {
        None
    }

    /// Validate options, issue exactly one request and classify the result.
    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        options: &Options,
        sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output>;

    /// How a terminal shows the result.
    fn render(&self, output: &Output, out: &mut dyn Write, _diag: &mut dyn Write) -> io::Result<()> {
        match output {
            Output::Json(value) => writeln!(out, "{value}"),
            Output::Ack => writeln!(out, "true"),
            Output::Streamed { .. } => Ok(()),
        }
    }
}

/// Per-mode behaviour plugged into [`dispatch`].
pub trait ModeStrategy {
    fn mode(&self) -> Mode;

    /// Fields that must be solicited before executing.
    fn resolve_fields(&mut self, op: &dyn Operation, options: &Options) -> Result<Vec<FieldDescriptor>>;

    /// Credential fields to append, if the invocation needs to authenticate.
    fn resolve_credentials(&mut self, _op: &dyn Operation, _auth: &AuthContext) -> Vec<FieldDescriptor> {
        Vec::new()
    }

    /// Collect values for `fields`. Only called with a non-empty list.
    fn collect(&mut self, fields: &[FieldDescriptor]) -> Result<BTreeMap<String, String>> {
        Err(fields.first().map_or_else(
            || HecateError::PromptAborted("no prompt available".into()),
            |f| HecateError::missing(&f.name),
        ))
    }

    /// Where streamed output goes when the caller supplied no sink.
    fn sink<'s>(&self) -> Option<Box<dyn Write + 's>> {
        None
    }

    fn executing(&mut self, _op: &dyn Operation) {}

    fn finished(&mut self) {}

    fn deliver(&mut self, op: &dyn Operation, output: Output) -> Result<Output>;
}

fn print(op: &dyn Operation, output: Output) -> Result<Output> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    op.render(&output, &mut out, &mut stderr.lock())?;
    out.flush()?;
    Ok(output)
}

/// Non-interactive CLI use: whatever credentials are already held are used.
#[derive(Debug, Default)]
pub struct ScriptedMode;

impl ModeStrategy for ScriptedMode {
    fn mode(&self) -> Mode {
        Mode::Scripted
    }

    fn resolve_fields(&mut self, _op: &dyn Operation, _options: &Options) -> Result<Vec<FieldDescriptor>> {
        Ok(Vec::new())
    }

    fn sink<'s>(&self) -> Option<Box<dyn Write + 's>> {
        Some(Box::new(io::stdout()))
    }

    fn deliver(&mut self, op: &dyn Operation, output: Output) -> Result<Output> {
        print(op, output)
    }
}

/// Terminal use: missing fields, and credentials when the policy is not
/// public, are requested through the prompter before executing.
pub struct InteractiveMode<P> {
    prompter: P,
    spinner: bool,
    active: Option<ProgressBar>,
}

impl<P: Prompter> InteractiveMode<P> {
    pub fn new(prompter: P) -> Self {
        Self {
            prompter,
            spinner: false,
            active: None,
        }
    }

    /// Show a spinner on stderr while the request runs.
    pub fn with_spinner(mut self, spinner: bool) -> Self {
        self.spinner = spinner;
        self
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }
}

impl<P> fmt::Debug for InteractiveMode<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractiveMode")
            .field("spinner", &self.spinner)
            .finish_non_exhaustive()
    }
}

impl<P: Prompter> ModeStrategy for InteractiveMode<P> {
    fn mode(&self) -> Mode {
        Mode::Interactive
    }

    fn resolve_fields(&mut self, op: &dyn Operation, options: &Options) -> Result<Vec<FieldDescriptor>> {
        Ok(op
            .fields()
            .into_iter()
            .filter(|f| !options.contains(&f.name))
            .collect())
    }

    fn resolve_credentials(&mut self, op: &dyn Operation, auth: &AuthContext) -> Vec<FieldDescriptor> {
        let Some((resource, action)) = op.policy() else {
            return Vec::new();
        };
        if auth.has_credentials() || auth.policy_for(resource, action).is_public() {
            return Vec::new();
        }
        credential_fields()
    }

    fn collect(&mut self, fields: &[FieldDescriptor]) -> Result<BTreeMap<String, String>> {
        self.prompter.prompt(fields)
    }

    fn sink<'s>(&self) -> Option<Box<dyn Write + 's>> {
        Some(Box::new(io::stdout()))
    }

    fn executing(&mut self, op: &dyn Operation) {
        if self.spinner {
            self.active = Some(ui::spinner(&format!("{}...", op.name())));
        }
    }

    fn finished(&mut self) {
        if let Some(spinner) = self.active.take() {
            spinner.finish_and_clear();
        }
    }

    fn deliver(&mut self, op: &dyn Operation, output: Output) -> Result<Output> {
        print(op, output)
    }
}

/// Library use: options must be complete, nothing is printed.
#[derive(Debug, Default)]
pub struct EmbeddedMode;

impl ModeStrategy for EmbeddedMode {
    fn mode(&self) -> Mode {
        Mode::Embedded
    }

    fn resolve_fields(&mut self, op: &dyn Operation, options: &Options) -> Result<Vec<FieldDescriptor>> {
        if let Some(missing) = op.fields().iter().find(|f| f.required && !options.contains(&f.name)) {
            return Err(HecateError::missing(&missing.name));
        }
        Ok(Vec::new())
    }

    fn deliver(&mut self, _op: &dyn Operation, output: Output) -> Result<Output> {
        Ok(output)
    }
}

/// Options and optional output sink for a single call.
#[derive(Default)]
pub struct Invocation<'a> {
    pub options: Options,
    pub sink: Option<Box<dyn Write + 'a>>,
}

impl<'a> Invocation<'a> {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: impl Write + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }
}

fn transition(op: &dyn Operation, from: &mut Phase, to: Phase) {
    debug!(command = op.name(), from = ?*from, to = ?to, "dispatch");
    *from = to;
}

/// Merge prompt answers: credentials go to `auth`, the rest to `options`.
fn apply_answers(options: &mut Options, auth: &mut AuthContext, mut answers: BTreeMap<String, String>) {
    let username = answers.remove(USERNAME_FIELD).filter(|u| !u.is_empty());
    let password = answers.remove(PASSWORD_FIELD).unwrap_or_default();
    if let Some(username) = username {
        auth.set_credentials(username, password);
    }
    for (name, value) in answers {
        if !value.is_empty() {
            options.set(&name, value);
        }
    }
}

/// Solicit missing fields, then credentials, in a single prompt.
fn resolve(
    strategy: &mut dyn ModeStrategy,
    op: &dyn Operation,
    options: &mut Options,
    auth: &mut AuthContext,
) -> Result<()> {
    let mut fields = strategy.resolve_fields(op, options)?;
    fields.extend(strategy.resolve_credentials(op, auth));
    if !fields.is_empty() {
        let answers = strategy.collect(&fields)?;
        apply_answers(options, auth, answers);
    }
    Ok(())
}

/// Run one invocation of `op` under `strategy`.
pub fn dispatch(
    api: &ApiClient,
    auth: &mut AuthContext,
    strategy: &mut dyn ModeStrategy,
    op: &dyn Operation,
    invocation: Invocation<'_>,
) -> Result<Output> {
    let mut phase = Phase::Unresolved;
    let Invocation { mut options, sink } = invocation;

    transition(op, &mut phase, Phase::ResolvingCredentials);
    if let Err(e) = resolve(strategy, op, &mut options, auth) {
        api.cancel_token().reset();
        transition(op, &mut phase, Phase::Failed);
        return Err(e);
    }

    transition(op, &mut phase, Phase::Executing);
    let mut sink = sink.or_else(|| strategy.sink());
    strategy.executing(op);
    let result = op.execute(api, auth, &options, sink.as_deref_mut());
    strategy.finished();
    drop(sink);
    // A cancel applies to the invocation in flight (or the next one, if
    // none is running) and is consumed when that invocation ends.
    api.cancel_token().reset();

    match result {
        Ok(output) => {
            transition(op, &mut phase, Phase::Succeeded);
            strategy.deliver(op, output)
        }
        Err(e) => {
            transition(op, &mut phase, Phase::Failed);
            Err(e)
        }
    }
}
