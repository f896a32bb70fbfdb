//! `inv api`: send one raw request through the REST contract.
//!
//! Prints the response envelope as JSON. The stored session token is
//! attached unless `--anonymous` is set.

use super::store_api;
use crate::output::{CliError, OutputMode, fail};
use crate::project::Project;
use clap::Args;
use inventura_core::api::{ApiRequest, Method};
use serde_json::{Value, json};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ApiArgs {
    /// HTTP method: GET, POST, PUT (PATCH) or DELETE.
    pub method: Method,

    /// Route path, with an optional query string.
    pub path: String,

    /// JSON request body.
    #[arg(short, long)]
    pub data: Option<String>,

    /// Do not attach the stored session token.
    #[arg(long)]
    pub anonymous: bool,
}

pub fn run_api(args: &ApiArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let mut request = ApiRequest::new(args.method, &args.path);
    if !args.anonymous {
        request.authorization = project.authorization();
    }
    if let Some(raw) = args.data.as_deref() {
        let body: Value = serde_json::from_str(raw).map_err(|err| {
            fail(output, CliError::new(format!("--data is not valid JSON: {err}")))
        })?;
        request = request.json(body);
    }

    let response = store_api(&project).dispatch(&request);
    let printed = json!({ "status": response.status, "body": response.body });
    println!("{}", serde_json::to_string_pretty(&printed)?);

    if response.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{} {} returned {}", args.method, args.path, response.status)
    }
}
