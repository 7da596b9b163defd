// `hecate clone get`: stream the complete dataset.
//
// The status is checked on the headers alone, before a single body byte is
// piped. After that, success is only known once the end-of-transmission
// record arrives; see `crate::eot`.

use std::io::Write;

use reqwest::Method;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::auth::AuthContext;
use crate::dispatch::{Operation, Options, Output};
use crate::eot::{self, TransferOutcome};
use crate::error::{HecateError, Result};

pub const USAGE: &str = "
Fetch a complete dataset from the server

usage: hecate clone <subcommand>

<subcommand>:
    get      Stream LDgeoJSON of all the data on the server
";

#[derive(Debug, Clone, Copy, Default)]
pub struct CloneGet;

impl Operation for CloneGet {
    fn name(&self) -> &'static str {
        "clone get"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(("clone", "get"))
    }

    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        _options: &Options,
        sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        let sink = sink.ok_or_else(|| HecateError::missing("output"))?;

        let req = api.request(Method::GET, api.url(&["api", "data", "clone"]), auth)?;
        let res = api.send(req)?;

        let outcome = eot::pipe(res, sink, &api.cancel_token())?;
        match outcome {
            TransferOutcome::Complete { records } => info!(records, "clone complete"),
            TransferOutcome::Truncated { records } => {
                warn!(records, "clone ended without end-of-transmission record")
            }
        }

        let records = outcome.into_result()?;
        Ok(Output::Streamed {
            records: Some(records),
        })
    }
}
