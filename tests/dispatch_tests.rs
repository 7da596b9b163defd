//! Tests for mode resolution and credential prompting

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::rc::Rc;

use hecate_cli::auth::AuthRules;
use hecate_cli::commands::{Register, WebhookCreate};
use hecate_cli::dispatch::{
    dispatch, FieldDescriptor, InteractiveMode, Prompter, ScriptedMode, PASSWORD_FIELD,
    USERNAME_FIELD,
};
use hecate_cli::{
    ApiClient, AuthContext, ClientConfig, EmbeddedMode, HecateError, Invocation, Operation,
    Options, Output, Result,
};
use serde_json::json;

/// Records every prompt and answers from a fixed table.
#[derive(Clone, Default)]
struct ScriptedPrompter {
    answers: BTreeMap<String, String>,
    asked: Rc<RefCell<Vec<Vec<String>>>>,
    abort: bool,
}

impl ScriptedPrompter {
    fn answering(pairs: &[(&str, &str)]) -> Self {
        Self {
            answers: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    fn prompts(&self) -> Vec<Vec<String>> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, fields: &[FieldDescriptor]) -> Result<BTreeMap<String, String>> {
        self.asked
            .borrow_mut()
            .push(fields.iter().map(|f| f.name.clone()).collect());
        if self.abort {
            return Err(HecateError::PromptAborted("cancelled by user".into()));
        }
        Ok(fields
            .iter()
            .filter_map(|f| self.answers.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect())
    }
}

/// An operation that makes no request and reports what it was given.
struct Probe {
    fields: Vec<FieldDescriptor>,
    seen: RefCell<Option<(Options, Option<String>)>>,
}

impl Probe {
    fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            fields,
            seen: RefCell::new(None),
        }
    }

    fn executed(&self) -> bool {
        self.seen.borrow().is_some()
    }
}

impl Operation for Probe {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn usage(&self) -> &'static str {
        "usage: probe"
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        self.fields.clone()
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(("clone", "get"))
    }

    fn execute(
        &self,
        _api: &ApiClient,
        auth: &AuthContext,
        options: &Options,
        sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        if let Some(sink) = sink {
            sink.write_all(b"probe\n")?;
        }
        let user = auth.credentials().map(|c| c.username().to_string());
        *self.seen.borrow_mut() = Some((options.clone(), user));
        Ok(Output::Ack)
    }
}

fn api() -> ApiClient {
    // Nothing in these tests reaches the network.
    ApiClient::new(&ClientConfig::new("127.0.0.1", 9)).unwrap()
}

fn rules(clone_get: &str) -> AuthRules {
    AuthRules::from_value(json!({ "clone": { "get": clone_get } })).unwrap()
}

#[test]
fn interactive_prompts_for_credentials_when_policy_unknown() {
    let prompter = ScriptedPrompter::answering(&[(USERNAME_FIELD, "ingalls"), (PASSWORD_FIELD, "yeaheh")]);
    let mut mode = InteractiveMode::new(prompter.clone());
    let mut auth = AuthContext::new();
    let probe = Probe::new(vec![]);

    let output = dispatch(&api(), &mut auth, &mut mode, &probe, Invocation::default()).unwrap();

    assert_eq!(output, Output::Ack);
    assert_eq!(prompter.prompts(), vec![vec![USERNAME_FIELD, PASSWORD_FIELD]]);
    assert_eq!(auth.credentials().unwrap().username(), "ingalls");
    let (_, user) = probe.seen.borrow().clone().unwrap();
    assert_eq!(user.as_deref(), Some("ingalls"));
}

#[test]
fn interactive_prompts_when_policy_restricted() {
    let prompter = ScriptedPrompter::answering(&[(USERNAME_FIELD, "ingalls"), (PASSWORD_FIELD, "yeaheh")]);
    let mut mode = InteractiveMode::new(prompter.clone());
    let mut auth = AuthContext::new();
    auth.set_rules(rules("user"));

    dispatch(&api(), &mut auth, &mut mode, &Probe::new(vec![]), Invocation::default()).unwrap();
    assert_eq!(prompter.prompts().len(), 1);
}

#[test]
fn public_policy_never_prompts_for_credentials() {
    let prompter = ScriptedPrompter::default();
    let mut mode = InteractiveMode::new(prompter.clone());
    let mut auth = AuthContext::new();
    auth.set_rules(rules("public"));
    let probe = Probe::new(vec![]);

    dispatch(&api(), &mut auth, &mut mode, &probe, Invocation::default()).unwrap();

    assert!(prompter.prompts().is_empty());
    assert!(!auth.has_credentials());
    assert!(probe.executed());
}

#[test]
fn stored_credentials_are_reused_regardless_of_policy() {
    let prompter = ScriptedPrompter::answering(&[("id", "3")]);
    let mut mode = InteractiveMode::new(prompter.clone());
    let mut auth = AuthContext::new();
    auth.set_credentials("ingalls", "yeaheh");
    auth.set_rules(rules("admin"));
    let probe = Probe::new(vec![FieldDescriptor::required("id", "Webhook ID")]);

    dispatch(&api(), &mut auth, &mut mode, &probe, Invocation::default()).unwrap();

    assert_eq!(prompter.prompts(), vec![vec!["id"]]);
    let (options, _) = probe.seen.borrow().clone().unwrap();
    assert_eq!(options.get("id"), Some("3"));
}

#[test]
fn missing_fields_are_merged_ahead_of_credentials() {
    let prompter = ScriptedPrompter::answering(&[
        ("name", "slack"),
        ("actions", "create"),
        (USERNAME_FIELD, "ingalls"),
        (PASSWORD_FIELD, "yeaheh"),
    ]);
    let mut mode = InteractiveMode::new(prompter.clone());
    let mut auth = AuthContext::new();
    let probe = Probe::new(vec![
        FieldDescriptor::required("name", "Webhook Name"),
        FieldDescriptor::required("url", "Webhook URL"),
        FieldDescriptor::required("actions", "Webhook Actions (comma separated)"),
    ]);
    let options = Options::new().with("url", "https://hooks.example.com");

    dispatch(&api(), &mut auth, &mut mode, &probe, Invocation::new(options)).unwrap();

    assert_eq!(
        prompter.prompts(),
        vec![vec!["name", "actions", USERNAME_FIELD, PASSWORD_FIELD]]
    );
    let (options, user) = probe.seen.borrow().clone().unwrap();
    assert_eq!(options.get("name"), Some("slack"));
    assert_eq!(options.get("url"), Some("https://hooks.example.com"));
    assert_eq!(user.as_deref(), Some("ingalls"));
}

#[test]
fn aborted_prompt_fails_before_execution() {
    let prompter = ScriptedPrompter {
        abort: true,
        ..ScriptedPrompter::default()
    };
    let mut mode = InteractiveMode::new(prompter);
    let mut auth = AuthContext::new();
    let probe = Probe::new(vec![]);

    let err = dispatch(&api(), &mut auth, &mut mode, &probe, Invocation::default()).unwrap_err();

    assert!(matches!(err, HecateError::PromptAborted(_)));
    assert!(!probe.executed());
    assert!(!auth.has_credentials());
}

#[test]
fn embedded_mode_rejects_missing_fields_without_prompting() {
    let mut auth = AuthContext::new();
    let probe = Probe::new(vec![FieldDescriptor::required("bound", "bbox to download")]);

    let err = dispatch(&api(), &mut auth, &mut EmbeddedMode, &probe, Invocation::default()).unwrap_err();

    assert!(matches!(err, HecateError::MissingField { field } if field == "bound"));
    assert!(!probe.executed());
}

#[test]
fn embedded_webhook_create_without_name_is_a_missing_field() {
    let mut auth = AuthContext::new();
    let options = Options::new()
        .with("url", "https://hooks.example.com")
        .with("actions", "create");

    // The client points at a closed port: reaching the network would be a
    // transport error instead.
    let err = dispatch(&api(), &mut auth, &mut EmbeddedMode, &WebhookCreate, Invocation::new(options))
        .unwrap_err();
    assert!(matches!(err, HecateError::MissingField { field } if field == "name"));
}

#[test]
fn scripted_mode_never_prompts_and_uses_held_credentials() {
    let mut auth = AuthContext::new();
    auth.set_credentials("ingalls", "yeaheh");
    let probe = Probe::new(vec![]);
    let mut sink = Vec::new();

    dispatch(
        &api(),
        &mut auth,
        &mut ScriptedMode,
        &probe,
        Invocation::default().with_sink(&mut sink),
    )
    .unwrap();

    assert_eq!(sink, b"probe\n");
    let (_, user) = probe.seen.borrow().clone().unwrap();
    assert_eq!(user.as_deref(), Some("ingalls"));
}

#[test]
fn scripted_mode_reports_missing_fields_from_execution() {
    let mut auth = AuthContext::new();
    let err = dispatch(&api(), &mut auth, &mut ScriptedMode, &Register, Invocation::default()).unwrap_err();
    assert!(matches!(err, HecateError::MissingField { field } if field == "username"));
}

#[test]
fn register_never_asks_for_credentials() {
    let prompter = ScriptedPrompter::default();
    let mut mode = InteractiveMode::new(prompter.clone());
    let mut auth = AuthContext::new();
    let options = Options::new()
        .with("username", "ingalls")
        .with("email", "ingalls@example.com")
        .with("password", "yeaheh");

    // Prompting happens before the request, so the transport error proves
    // no prompt was needed.
    let err = dispatch(&api(), &mut auth, &mut mode, &Register, Invocation::new(options)).unwrap_err();
    assert!(matches!(err, HecateError::Transport(_)));
    assert!(prompter.prompts().is_empty());
}
