//! Authentication state shared by every command invocation.
//!
//! [`AuthContext`] holds the optional credentials and the server's auth
//! rules. It never touches the network itself; rules are loaded from the
//! `auth` command's result and credentials come from configuration or an
//! interactive prompt.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::{HecateError, Result};

/// Basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Whether the server allows anonymous access to a resource/action pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Public,
    Restricted,
    /// Rules not fetched, or the pair is not listed. Treated as restricted.
    Unknown,
}

impl Policy {
    pub fn is_public(self) -> bool {
        self == Policy::Public
    }
}

/// The auth rule map returned by `GET /api/auth`.
///
/// A resource maps either to a single rule string that covers every action,
/// or to an object of `action -> rule`. Only `"public"` grants anonymous
/// access; every other rule (`"user"`, `"admin"`, `null`, ...) is restricted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthRules {
    resources: BTreeMap<String, Value>,
}

impl AuthRules {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                resources: map.into_iter().collect(),
            }),
            other => Err(HecateError::Config(format!(
                "auth rules must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn policy(&self, resource: &str, action: &str) -> Policy {
        let rule = match self.resources.get(resource) {
            Some(Value::Object(actions)) => match actions.get(action) {
                Some(rule) => rule,
                None => return Policy::Unknown,
            },
            Some(rule) => rule,
            None => return Policy::Unknown,
        };

        match rule.as_str() {
            Some("public") => Policy::Public,
            _ => Policy::Restricted,
        }
    }
}

/// Process-lifetime auth state. Owned by the top-level client and passed
/// explicitly to every operation; never persisted.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    credentials: Option<Credentials>,
    rules: Option<AuthRules>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            rules: None,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn set_credentials(&mut self, username: impl Into<String>, secret: impl Into<String>) {
        self.credentials = Some(Credentials::new(username, secret));
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn set_rules(&mut self, rules: AuthRules) {
        self.rules = Some(rules);
    }

    pub fn rules(&self) -> Option<&AuthRules> {
        self.rules.as_ref()
    }

    pub fn policy_for(&self, resource: &str, action: &str) -> Policy {
        self.rules
            .as_ref()
            .map_or(Policy::Unknown, |rules| rules.policy(resource, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules() -> AuthRules {
        AuthRules::from_value(json!({
            "default": "public",
            "server": "public",
            "clone": { "get": "public" },
            "feature": { "get": "public", "create": "user" },
            "webhooks": { "get": "admin", "set": "admin" },
            "bounds": { "list": null }
        }))
        .unwrap()
    }

    #[test]
    fn policy_is_unknown_before_rules_are_fetched() {
        let ctx = AuthContext::new();
        assert_eq!(ctx.policy_for("clone", "get"), Policy::Unknown);
    }

    #[test]
    fn policy_reads_nested_and_flat_rules() {
        let mut ctx = AuthContext::new();
        ctx.set_rules(rules());

        assert_eq!(ctx.policy_for("clone", "get"), Policy::Public);
        assert_eq!(ctx.policy_for("server", "anything"), Policy::Public);
        assert_eq!(ctx.policy_for("feature", "create"), Policy::Restricted);
        assert_eq!(ctx.policy_for("webhooks", "set"), Policy::Restricted);
        assert_eq!(ctx.policy_for("bounds", "list"), Policy::Restricted);
        assert_eq!(ctx.policy_for("webhooks", "patch"), Policy::Unknown);
        assert_eq!(ctx.policy_for("styles", "get"), Policy::Unknown);
    }

    #[test]
    fn rules_must_be_an_object() {
        assert!(AuthRules::from_value(json!(["public"])).is_err());
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let mut ctx = AuthContext::new();
        assert!(!ctx.has_credentials());
        ctx.set_credentials("ingalls", "yeaheh");
        assert!(ctx.has_credentials());

        let debug = format!("{:?}", ctx.credentials().unwrap());
        assert!(debug.contains("ingalls"));
        assert!(!debug.contains("yeaheh"));
    }
}
