// `hecate auth`: fetch the rules the server uses to allow or deny each
// endpoint. The result also feeds `AuthContext::set_rules`.

use std::io::{self, Write};

use reqwest::{Method, StatusCode};

use crate::api::ApiClient;
use crate::auth::AuthContext;
use crate::dispatch::{Operation, Options, Output};
use crate::error::{HecateError, Result};

pub const USAGE: &str = "
Fetch authentication settings that the server uses to allow or deny specific api endpoints

usage: hecate auth
";

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchAuthRules;

impl Operation for FetchAuthRules {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn execute(
        &self,
        api: &ApiClient,
        _auth: &AuthContext,
        _options: &Options,
        _sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        let res = api.anonymous(Method::GET, api.url(&["api", "auth"])).send()?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(HecateError::AuthListUnavailable);
        }
        let res = ApiClient::expect_ok(res)?;
        Ok(Output::Json(res.json()?))
    }

    fn render(&self, output: &Output, out: &mut dyn Write, _diag: &mut dyn Write) -> io::Result<()> {
        match output {
            Output::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
                writeln!(out, "{pretty}")
            }
            _ => Ok(()),
        }
    }
}
