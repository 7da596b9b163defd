// `hecate bounds`: list the named bounds the server knows about, or stream
// the raw data inside one of them. Unlike clone, the bounds endpoint has no
// end-of-transmission record, so the body is copied through unchanged.

use std::io::Write;

use reqwest::Method;

use super::copy_body;
use crate::api::ApiClient;
use crate::auth::AuthContext;
use crate::dispatch::{FieldDescriptor, Operation, Options, Output};
use crate::error::{HecateError, Result};

pub const USAGE: &str = "
Fetch raw data from the server using the bounds API

usage: hecate bounds <subcommand>

<subcommand>:
    list     List the bounds available on the server
    get      Stream LDgeoJSON of all the data within a bound
";

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsList;

impl Operation for BoundsList {
    fn name(&self) -> &'static str {
        "bounds list"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(("feature", "get"))
    }

    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        _options: &Options,
        _sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        Ok(Output::Json(api.get_json(&["api", "data", "bounds"], auth)?))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsGet;

impl Operation for BoundsGet {
    fn name(&self) -> &'static str {
        "bounds get"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::required("bound", "bbox to download")]
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(("feature", "get"))
    }

    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        options: &Options,
        sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        let bound = options.require("bound")?;
        let sink = sink.ok_or_else(|| HecateError::missing("output"))?;

        let req = api.request(Method::GET, api.url(&["api", "data", "bounds", bound]), auth)?;
        let res = api.send(req)?;
        copy_body(res, sink, &api.cancel_token())?;

        Ok(Output::Streamed { records: None })
    }
}
