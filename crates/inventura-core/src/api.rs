//! Transport-agnostic REST contract.
//!
//! [`Api`] exposes one typed handler per backend route; [`Api::dispatch`]
//! routes a method/path/body triple onto those handlers and wraps results
//! in the `{success, data | message}` envelope with HTTP-style status
//! codes. Catalog reads are public; every other route needs a bearer token.

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::auth::{self, AuthError, LoginRequest, RegisterRequest, Session};
use crate::config::AuthConfig;
use crate::db::catalog::{self, CatalogError};
use crate::db::snapshots;
use crate::model::{
    Cadence, InventorySnapshot, Item, ItemPatch, NewItem, NewSnapshot, SnapshotPatch, User,
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for Method {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" | "PATCH" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(ApiError::BadRequest(format!("unsupported method '{other}'"))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path with optional `?key=value&...` query string.
    pub path: String,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            authorization: None,
            body: None,
        }
    }

    #[must_use]
    pub fn bearer(mut self, token: &str) -> Self {
        self.authorization = Some(format!("Bearer {token}"));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status < 400
    }

    fn ok(status: u16, data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self {
                status,
                body: json!({ "success": true, "data": data }),
            },
            Err(err) => ApiError::Internal(err.into()).into_response(),
        }
    }

    fn list<T: Serialize>(items: &[T]) -> Self {
        match serde_json::to_value(items) {
            Ok(data) => Self {
                status: 200,
                body: json!({ "success": true, "count": items.len(), "data": data }),
            },
            Err(err) => ApiError::Internal(err.into()).into_response(),
        }
    }

    fn message(message: &str) -> Self {
        Self {
            status: 200,
            body: json!({ "success": true, "message": message }),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Unauthorized(AuthError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => 400,
            Self::Unauthorized(err) => err.status(),
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    #[must_use]
    pub fn into_response(self) -> ApiResponse {
        let status = self.status();
        let body = match &self {
            Self::Validation(errors) => json!({ "success": false, "errors": errors }),
            Self::Internal(err) => {
                warn!(error = %err, "api request failed");
                json!({ "success": false, "message": "server error" })
            }
            other => json!({ "success": false, "message": other.to_string() }),
        };
        ApiResponse { status, body }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::UserExists => Self::BadRequest(err.to_string()),
            AuthError::Store(inner) => Self::Internal(inner),
            other => Self::Unauthorized(other),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::DuplicateNumber { .. } => Self::Conflict(err.to_string()),
            CatalogError::NotFound(_) => Self::NotFound(err.to_string()),
            CatalogError::Invalid(errors) => Self::Validation(errors),
            CatalogError::Store(inner) => Self::Internal(inner),
        }
    }
}

fn snapshot_not_found() -> ApiError {
    ApiError::NotFound("inventory not found".to_string())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Route handlers over one store connection.
pub struct Api<'a> {
    conn: &'a Connection,
    auth: AuthConfig,
}

impl<'a> Api<'a> {
    #[must_use]
    pub const fn new(conn: &'a Connection, auth: AuthConfig) -> Self {
        Self { conn, auth }
    }

    #[must_use]
    pub fn health(&self) -> Value {
        json!({
            "success": true,
            "message": "server is healthy",
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    pub fn me(&self, authorization: Option<&str>) -> Result<User, ApiError> {
        Ok(auth::authenticate(self.conn, authorization)?)
    }

    pub fn register(&self, request: &RegisterRequest) -> Result<Session, ApiError> {
        Ok(auth::register(self.conn, request, self.auth.token_ttl_hours)?)
    }

    pub fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        Ok(auth::login(self.conn, request, self.auth.token_ttl_hours)?)
    }

    pub fn logout(&self, authorization: Option<&str>) -> Result<(), ApiError> {
        let token = auth::bearer_token(authorization)
            .ok_or(ApiError::Unauthorized(AuthError::MissingToken))?;
        auth::logout(self.conn, token)?;
        Ok(())
    }

    /// Public catalog read. `None` lists every cadence, daily first.
    pub fn list_items(&self, cadence: Option<Cadence>) -> Result<Vec<Item>, ApiError> {
        Ok(match cadence {
            Some(cadence) => catalog::list_items(self.conn, cadence)?,
            None => catalog::list_all_items(self.conn)?.concat(),
        })
    }

    pub fn create_item(&self, authorization: Option<&str>, new: &NewItem) -> Result<Item, ApiError> {
        self.me(authorization)?;
        Ok(catalog::insert_item(self.conn, new)?)
    }

    pub fn update_item(
        &self,
        authorization: Option<&str>,
        item_id: &str,
        patch: &ItemPatch,
    ) -> Result<Item, ApiError> {
        self.me(authorization)?;
        Ok(catalog::update_item(self.conn, item_id, patch)?)
    }

    pub fn delete_item(&self, authorization: Option<&str>, item_id: &str) -> Result<Item, ApiError> {
        self.me(authorization)?;
        Ok(catalog::delete_item(self.conn, item_id)?)
    }

    pub fn delete_all_items(
        &self,
        authorization: Option<&str>,
        cadence: Cadence,
    ) -> Result<usize, ApiError> {
        self.me(authorization)?;
        Ok(catalog::delete_all_items(self.conn, cadence)?)
    }

    pub fn list_inventories(
        &self,
        authorization: Option<&str>,
    ) -> Result<Vec<InventorySnapshot>, ApiError> {
        let user = self.me(authorization)?;
        Ok(snapshots::list_snapshots(self.conn, &user.id)?)
    }

    pub fn create_inventory(
        &self,
        authorization: Option<&str>,
        new: &NewSnapshot,
    ) -> Result<InventorySnapshot, ApiError> {
        let user = self.me(authorization)?;
        Ok(snapshots::create_snapshot(self.conn, &user.id, new)?)
    }

    pub fn get_inventory(
        &self,
        authorization: Option<&str>,
        snapshot_id: &str,
    ) -> Result<InventorySnapshot, ApiError> {
        let user = self.me(authorization)?;
        snapshots::get_snapshot(self.conn, &user.id, snapshot_id)?.ok_or_else(snapshot_not_found)
    }

    pub fn update_inventory(
        &self,
        authorization: Option<&str>,
        snapshot_id: &str,
        patch: &SnapshotPatch,
    ) -> Result<InventorySnapshot, ApiError> {
        let user = self.me(authorization)?;
        snapshots::update_snapshot(self.conn, &user.id, snapshot_id, patch)?
            .ok_or_else(snapshot_not_found)
    }

    pub fn delete_inventory(
        &self,
        authorization: Option<&str>,
        snapshot_id: &str,
    ) -> Result<(), ApiError> {
        let user = self.me(authorization)?;
        if snapshots::delete_snapshot(self.conn, &user.id, snapshot_id)? {
            Ok(())
        } else {
            Err(snapshot_not_found())
        }
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Route a request. Never fails: errors become error envelopes.
    #[must_use]
    pub fn dispatch(&self, request: &ApiRequest) -> ApiResponse {
        let response = self
            .route(request)
            .unwrap_or_else(ApiError::into_response);
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "api request"
        );
        response
    }

    fn route(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let (path, query) = split_query(&request.path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let authorization = request.authorization.as_deref();
        let body = request.body.as_ref();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["health"]) => Ok(ApiResponse {
                status: 200,
                body: self.health(),
            }),

            (Method::Post, ["api", "auth", "register"]) => {
                Ok(ApiResponse::ok(201, self.register(&parse_body(body)?)?))
            }
            (Method::Post, ["api", "auth", "login"]) => {
                Ok(ApiResponse::ok(200, self.login(&parse_body(body)?)?))
            }
            (Method::Get, ["api", "auth", "me"]) => Ok(ApiResponse::ok(200, self.me(authorization)?)),
            (Method::Post, ["api", "auth", "logout"]) => {
                self.logout(authorization)?;
                Ok(ApiResponse::message("logged out"))
            }

            (Method::Get, ["api", "items"]) => {
                let cadence = query
                    .get("type")
                    .map(|raw| parse_cadence(raw))
                    .transpose()?;
                Ok(ApiResponse::list(&self.list_items(cadence)?))
            }
            (Method::Post, ["api", "items"]) => Ok(ApiResponse::ok(
                201,
                self.create_item(authorization, &parse_body(body)?)?,
            )),
            (Method::Delete, ["api", "items", "all", cadence]) => {
                let removed = self.delete_all_items(authorization, parse_cadence(cadence)?)?;
                Ok(ApiResponse::ok(200, json!({ "deleted": removed })))
            }
            (Method::Put, ["api", "items", id]) => Ok(ApiResponse::ok(
                200,
                self.update_item(authorization, id, &parse_body(body)?)?,
            )),
            (Method::Delete, ["api", "items", id]) => {
                self.delete_item(authorization, id)?;
                Ok(ApiResponse::message("item deleted"))
            }

            (Method::Get, ["api", "inventories"]) => {
                Ok(ApiResponse::list(&self.list_inventories(authorization)?))
            }
            (Method::Post, ["api", "inventories"]) => Ok(ApiResponse::ok(
                201,
                self.create_inventory(authorization, &parse_body(body)?)?,
            )),
            (Method::Get, ["api", "inventories", id]) => {
                Ok(ApiResponse::ok(200, self.get_inventory(authorization, id)?))
            }
            (Method::Put, ["api", "inventories", id]) => Ok(ApiResponse::ok(
                200,
                self.update_inventory(authorization, id, &parse_body(body)?)?,
            )),
            (Method::Delete, ["api", "inventories", id]) => {
                self.delete_inventory(authorization, id)?;
                Ok(ApiResponse::message("inventory deleted"))
            }

            _ => Err(ApiError::NotFound("route not found".to_string())),
        }
    }
}

fn split_query(raw: &str) -> (&str, BTreeMap<&str, &str>) {
    let Some((path, query)) = raw.split_once('?') else {
        return (raw, BTreeMap::new());
    };
    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .collect();
    (path, params)
}

fn parse_cadence(raw: &str) -> Result<Cadence, ApiError> {
    raw.parse::<Cadence>()
        .map_err(|err| ApiError::BadRequest(err.to_string()))
}

fn parse_body<T: DeserializeOwned>(body: Option<&Value>) -> Result<T, ApiError> {
    let body = body.ok_or_else(|| ApiError::BadRequest("request body is required".to_string()))?;
    serde_json::from_value(body.clone())
        .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))
}
