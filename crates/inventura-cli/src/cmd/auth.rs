//! `inv register`, `inv login`, `inv logout`, `inv whoami`.
//!
//! A successful register or login stores the bearer token in
//! `.inventura/session`; every authenticated command replays it.

use super::{api_failure, store_api};
use crate::output::{OutputMode, pretty_kv, render};
use crate::project::Project;
use clap::Args;
use inventura_core::auth::{LoginRequest, RegisterRequest, Session};
use inventura_core::error::ErrorCode;
use inventura_core::model::User;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Username (3-30 characters).
    #[arg(long)]
    pub username: String,

    /// Email address used to log in.
    #[arg(long)]
    pub email: String,

    /// Password (at least 6 characters).
    #[arg(long)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Debug, Serialize)]
struct SessionOutput<'a> {
    user: &'a User,
    expires_at: String,
}

fn render_session(output: OutputMode, session: &Session, verb: &str) -> anyhow::Result<()> {
    let payload = SessionOutput {
        user: &session.user,
        expires_at: session.expires_at.to_rfc3339(),
    };
    render(output, &payload, |p, w| {
        writeln!(w, "✓ {verb} as {} <{}>", p.user.username, p.user.email)?;
        pretty_kv(w, "Expires", &p.expires_at)
    })
}

pub fn run_register(args: &RegisterArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let request = RegisterRequest {
        username: args.username.clone(),
        email: args.email.clone(),
        password: args.password.clone(),
    };
    let session = store_api(&project)
        .register(&request)
        .map_err(|err| api_failure(output, err, ErrorCode::ValidationFailed))?;
    project.store_session(&session.token)?;
    render_session(output, &session, "Registered and logged in")
}

pub fn run_login(args: &LoginArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let request = LoginRequest {
        email: args.email.clone(),
        password: args.password.clone(),
    };
    let session = store_api(&project)
        .login(&request)
        .map_err(|err| api_failure(output, err, ErrorCode::InvalidCredentials))?;
    project.store_session(&session.token)?;
    render_session(output, &session, "Logged in")
}

pub fn run_logout(output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let authorization = project.authorization();
    if authorization.is_some() {
        store_api(&project)
            .logout(authorization.as_deref())
            .map_err(|err| api_failure(output, err, ErrorCode::NotLoggedIn))?;
    }
    project.clear_session()?;
    crate::output::render_success(output, "Logged out")
}

pub fn run_whoami(output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let user = store_api(&project)
        .me(project.authorization().as_deref())
        .map_err(|err| api_failure(output, err, ErrorCode::NotLoggedIn))?;
    render(output, &user, |u, w| {
        pretty_kv(w, "User", &u.username)?;
        pretty_kv(w, "Email", &u.email)?;
        pretty_kv(w, "Role", u.role.as_str())?;
        pretty_kv(w, "Id", &u.id)
    })
}
