// `hecate webhooks`: list, create, manage and delete server webhooks.
//
// Reads are governed by the `webhooks.get` rule, writes by `webhooks.set`.

use std::io::Write;

use reqwest::Method;
use serde::Serialize;

use crate::api::ApiClient;
use crate::auth::AuthContext;
use crate::dispatch::{FieldDescriptor, Operation, Options, Output};
use crate::error::Result;

pub const USAGE: &str = "
List, Create, Manage & Delete hecate webhooks

usage: hecate webhooks <subcommand>

<subcommand>:
    list     List webhooks currently active on the server
    get      Get a specific webhook
    create   Create a new webhook
    update   Update an existing webhook
    delete   Delete an existing webhook
";

const READ: (&str, &str) = ("webhooks", "get");
const WRITE: (&str, &str) = ("webhooks", "set");

/// Request body for create and update.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WebhookBody {
    pub name: String,
    pub url: String,
    pub actions: Vec<String>,
}

impl WebhookBody {
    fn from_options(options: &Options) -> Result<Self> {
        Ok(Self {
            name: options.require("name")?.to_string(),
            url: options.require("url")?.to_string(),
            actions: options.require_list("actions")?,
        })
    }
}

fn id_field() -> FieldDescriptor {
    FieldDescriptor::required("id", "Webhook ID")
}

fn body_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::required("name", "Webhook Name"),
        FieldDescriptor::required("url", "Webhook URL"),
        FieldDescriptor::required("actions", "Webhook Actions (comma separated)"),
    ]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookList;

impl Operation for WebhookList {
    fn name(&self) -> &'static str {
        "webhooks list"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(READ)
    }

    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        _options: &Options,
        _sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        Ok(Output::Json(api.get_json(&["api", "webhooks"], auth)?))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookGet;

impl Operation for WebhookGet {
    fn name(&self) -> &'static str {
        "webhooks get"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![id_field()]
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(READ)
    }

    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        options: &Options,
        _sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        let id = options.require("id")?;
        Ok(Output::Json(api.get_json(&["api", "webhooks", id], auth)?))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookCreate;

impl Operation for WebhookCreate {
    fn name(&self) -> &'static str {
        "webhooks create"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        body_fields()
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(WRITE)
    }

    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        options: &Options,
        _sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        let body = WebhookBody::from_options(options)?;

        let req = api
            .request(Method::POST, api.url(&["api", "webhooks"]), auth)?
            .json(&body);
        api.send(req)?;

        Ok(Output::Ack)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookUpdate;

impl Operation for WebhookUpdate {
    fn name(&self) -> &'static str {
        "webhooks update"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        let mut fields = vec![id_field()];
        fields.extend(body_fields());
        fields
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(WRITE)
    }

    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        options: &Options,
        _sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        let id = options.require("id")?;
        let body = WebhookBody::from_options(options)?;

        let req = api
            .request(Method::POST, api.url(&["api", "webhooks", id]), auth)?
            .json(&body);
        api.send(req)?;

        Ok(Output::Ack)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookDelete;

impl Operation for WebhookDelete {
    fn name(&self) -> &'static str {
        "webhooks delete"
    }

    fn usage(&self) -> &'static str {
        USAGE
    }

    fn fields(&self) -> Vec<FieldDescriptor> {
        vec![id_field()]
    }

    fn policy(&self) -> Option<(&'static str, &'static str)> {
        Some(WRITE)
    }

    fn execute(
        &self,
        api: &ApiClient,
        auth: &AuthContext,
        options: &Options,
        _sink: Option<&mut (dyn Write + '_)>,
    ) -> Result<Output> {
        let id = options.require("id")?;

        let req = api.request(Method::DELETE, api.url(&["api", "webhooks", id]), auth)?;
        api.send(req)?;

        Ok(Output::Ack)
    }
}
