use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

/// Project directory name under the workspace root.
pub const PROJECT_DIR: &str = ".inventura";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Preferred output mode (`pretty`, `text`, `json`).
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub confirm: ConfirmConfig,
}

/// Print and export layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_count_sheet_page_size")]
    pub count_sheet_page_size: usize,
    #[serde(default = "default_materials_page_size")]
    pub materials_page_size: usize,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default = "default_sequence_code")]
    pub sequence_code: String,
    #[serde(default = "default_status_literal")]
    pub status_literal: String,
    #[serde(default = "default_section_name")]
    pub section_name: String,
    /// Site address lines printed in the center of every page header.
    #[serde(default)]
    pub location_lines: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            count_sheet_page_size: default_count_sheet_page_size(),
            materials_page_size: default_materials_page_size(),
            date_format: default_date_format(),
            time_format: default_time_format(),
            sequence_code: default_sequence_code(),
            status_literal: default_status_literal(),
            section_name: default_section_name(),
            location_lines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmConfig {
    #[serde(default = "default_confirm_ttl_secs")]
    pub ttl_secs: i64,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_confirm_ttl_secs(),
        }
    }
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(PROJECT_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Default `config.toml` written by `inv init`.
#[must_use]
pub fn default_config_toml() -> String {
    format!(
        r#"# inventura project configuration

[report]
count_sheet_page_size = {count}
materials_page_size = {materials}
date_format = "{date}"
time_format = "{time}"
sequence_code = "{code}"
status_literal = "{status}"
section_name = "{section}"
location_lines = []

[auth]
token_ttl_hours = {ttl}

[confirm]
ttl_secs = {confirm}
"#,
        count = default_count_sheet_page_size(),
        materials = default_materials_page_size(),
        date = default_date_format(),
        time = default_time_format(),
        code = default_sequence_code(),
        status = default_status_literal(),
        section = default_section_name(),
        ttl = default_token_ttl_hours(),
        confirm = default_confirm_ttl_secs(),
    )
}

/// Resolve the output mode: `--json`, then `FORMAT`, then project config,
/// then TTY detection.
pub fn resolve_output(project_root: &Path, cli_json: bool) -> Result<String> {
    let configured = load_project_config(project_root)?.output;
    Ok(resolve_output_inner(
        cli_json,
        configured,
        env::var("FORMAT").ok(),
    ))
}

fn resolve_output_inner(
    cli_json: bool,
    configured: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = configured.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_count_sheet_page_size() -> usize {
    35
}

const fn default_materials_page_size() -> usize {
    25
}

fn default_date_format() -> String {
    "%-d. %-m. %Y".to_string()
}

fn default_time_format() -> String {
    "%H:%M:%S".to_string()
}

fn default_sequence_code() -> String {
    "MRA".to_string()
}

fn default_status_literal() -> String {
    "Aktívne".to_string()
}

fn default_section_name() -> String {
    "Reštika".to_string()
}

const fn default_token_ttl_hours() -> i64 {
    24 * 7
}

const fn default_confirm_ttl_secs() -> i64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.report.count_sheet_page_size, 35);
        assert_eq!(cfg.report.materials_page_size, 25);
        assert_eq!(cfg.auth.token_ttl_hours, 168);
        assert_eq!(cfg.confirm.ttl_secs, 300);
        assert!(cfg.output.is_none());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join(PROJECT_DIR)).expect("mkdir");
        std::fs::write(
            root.path().join(PROJECT_DIR).join("config.toml"),
            "[report]\ncount_sheet_page_size = 10\nlocation_lines = [\"Main St 1\"]\n",
        )
        .expect("write");
        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.report.count_sheet_page_size, 10);
        assert_eq!(cfg.report.materials_page_size, 25);
        assert_eq!(cfg.report.location_lines, vec!["Main St 1".to_string()]);
        assert_eq!(cfg.report.sequence_code, "MRA");
    }

    #[test]
    fn generated_config_parses_back_to_defaults() {
        let cfg: ProjectConfig = toml::from_str(&default_config_toml()).expect("parse");
        assert_eq!(cfg.report, ReportConfig::default());
        assert_eq!(cfg.auth, AuthConfig::default());
        assert_eq!(cfg.confirm, ConfirmConfig::default());
    }

    #[test]
    fn invalid_toml_reports_path() {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join(PROJECT_DIR)).expect("mkdir");
        std::fs::write(root.path().join(PROJECT_DIR).join("config.toml"), "[report").expect("write");
        let err = load_project_config(root.path()).expect_err("must fail");
        assert!(format!("{err}").contains("config.toml"));
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output =
            resolve_output_inner(true, Some("pretty".to_string()), Some("text".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn env_beats_config_and_aliases_normalize() {
        let output =
            resolve_output_inner(false, Some("table".to_string()), Some("human".to_string()));
        assert_eq!(output, "pretty");

        let output = resolve_output_inner(false, Some("table".to_string()), None);
        assert_eq!(output, "text");
    }
}
