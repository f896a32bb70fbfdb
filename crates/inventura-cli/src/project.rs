//! Project discovery and per-invocation context.
//!
//! ```text
//! .inventura/
//!   config.toml     project configuration
//!   inventura.db    catalog, users, sessions, snapshots, pending confirmations
//!   session         bearer token of the logged-in operator
//!   values/         local value cache, one file per cadence
//! ```

use crate::output::{CliError, OutputMode, fail};
use anyhow::{Context as _, Result};
use inventura_core::cache::FileValueStore;
use inventura_core::config::{PROJECT_DIR, ProjectConfig, load_project_config};
use inventura_core::db;
use inventura_core::error::ErrorCode;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DB_FILE: &str = "inventura.db";
pub const SESSION_FILE: &str = "session";
pub const VALUES_DIR: &str = "values";

/// Walk up from `start` to the nearest directory holding `.inventura/`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(PROJECT_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// An opened project: config loaded, store connected.
pub struct Project {
    root: PathBuf,
    pub config: ProjectConfig,
    pub conn: Connection,
}

impl Project {
    /// Locate and open the project containing `start`, rendering a coded
    /// error when there is none.
    pub fn open(start: &Path, output: OutputMode) -> Result<Self> {
        let root = find_project_root(start).ok_or_else(|| {
            fail(
                output,
                CliError::coded(
                    ErrorCode::NotInitialized,
                    "Not an inventura project: .inventura directory not found",
                ),
            )
        })?;
        let config = load_project_config(&root).map_err(|err| {
            fail(
                output,
                CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")),
            )
        })?;
        let db_path = root.join(PROJECT_DIR).join(DB_FILE);
        let conn = db::open_db(&db_path).map_err(|err| {
            fail(
                output,
                CliError::coded(ErrorCode::StoreUnavailable, format!("{err:#}")),
            )
        })?;
        debug!(root = %root.display(), "project opened");
        Ok(Self { root, config, conn })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn value_store(&self) -> FileValueStore {
        FileValueStore::new(self.dir().join(VALUES_DIR))
    }

    fn session_path(&self) -> PathBuf {
        self.dir().join(SESSION_FILE)
    }

    /// Stored bearer token, if someone is logged in.
    pub fn session_token(&self) -> Option<String> {
        fs::read_to_string(self.session_path())
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    /// `Authorization` header value for the stored session.
    pub fn authorization(&self) -> Option<String> {
        self.session_token().map(|token| format!("Bearer {token}"))
    }

    pub fn store_session(&self, token: &str) -> Result<()> {
        let path = self.session_path();
        fs::write(&path, format!("{token}\n"))
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn clear_session(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init(dir: &Path) {
        fs::create_dir_all(dir.join(PROJECT_DIR)).unwrap();
    }

    #[test]
    fn finds_root_from_nested_directory() {
        let tmp = TempDir::new().unwrap();
        init(tmp.path());
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).as_deref(), Some(tmp.path()));
    }

    #[test]
    fn open_outside_project_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(Project::open(tmp.path(), OutputMode::Json).is_err());
    }

    #[test]
    fn session_round_trip() {
        let tmp = TempDir::new().unwrap();
        init(tmp.path());
        let project = Project::open(tmp.path(), OutputMode::Text).unwrap();
        assert!(project.authorization().is_none());

        project.store_session("abc123").unwrap();
        assert_eq!(project.session_token().as_deref(), Some("abc123"));
        assert_eq!(project.authorization().as_deref(), Some("Bearer abc123"));

        project.clear_session().unwrap();
        assert!(project.session_token().is_none());
        project.clear_session().unwrap();
    }
}
