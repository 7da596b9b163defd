// `hecate register`: create a new user account. Never authenticates.

use std::io::{self, Write};

use reqwest::Method;

use crate::api::ApiClient;
use crate::auth::AuthContext;
use crate::dispatch::{FieldDescriptor, Operation, Options, Output, USERNAME_PROMPT};
use crate::error::Result;

pub const USAGE: &str = "
Register a new user account with the server

usage: hecate register
";

#[derive(Debug, Clone, Copy, Default)]
pub struct Register;

impl Operation for Register {
    fn name(&self) -> &'static str {
        "register"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::required("username", USERNAME_PROMPT),
            FieldDescriptor::required("email", "Your email address"),
            FieldDescriptor::required("password", "secure password to be used at login").secret(),
        ]
    }

    fn execute(
        &self,
        api: &ApiClient,
        _auth: &AuthContext,
        options: &Options,
        _sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        let username = options.require("username")?;
        let password = options.require("password")?;
        let email = options.require("email")?;

        let req = api
            .anonymous(Method::POST, api.url(&["api", "user", "create"]))
            .query(&[("username", username), ("password", password), ("email", email)]);
        api.send(req)?;

        Ok(Output::Ack)
    }

    fn render(&self, _output: &Output, _out: &mut dyn Write, diag: &mut dyn Write) -> io::Result<()> {
        writeln!(diag, "ok - created user")
    }
}
