//! End-to-end workflows for the `inv` binary.
//!
//! Each test runs `inv` as a subprocess inside its own temp directory:
//! init, sign in, build a catalog, count it, export it, snapshot it.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the `inv` binary, rooted in `dir`.
fn inv_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("inv"));
    cmd.current_dir(dir);
    // Keep tracing off stderr so error assertions only see rendered errors.
    cmd.env("INVENTURA_LOG", "error");
    cmd.env_remove("INVENTURA_LOG_FORMAT");
    cmd
}

/// Run `args` with `--json`, assert success, and parse stdout.
fn inv_json(dir: &Path, args: &[&str]) -> Value {
    let output = inv_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("inv should not crash");
    assert!(
        output.status.success(),
        "inv {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

/// Run `args` with `--json`, assert failure, and parse the error from stderr.
fn inv_json_err(dir: &Path, args: &[&str]) -> Value {
    let output = inv_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("inv should not crash");
    assert!(!output.status.success(), "inv {args:?} unexpectedly succeeded");
    let stderr = String::from_utf8_lossy(&output.stderr);
    let start = stderr.find('{').expect("stderr should carry a JSON error");
    // The rendered error comes first; anyhow's own report may follow it.
    let json: Value = serde_json::Deserializer::from_str(&stderr[start..])
        .into_iter::<Value>()
        .next()
        .and_then(Result::ok)
        .unwrap_or_else(|| panic!("error JSON should parse: {stderr}"));
    json["error"].clone()
}

fn init_project(dir: &Path) {
    inv_cmd(dir).args(["init", "-q"]).assert().success();
}

fn register(dir: &Path) {
    inv_json(
        dir,
        &[
            "register",
            "--username",
            "jana",
            "--email",
            "jana@example.com",
            "--password",
            "secret1",
        ],
    );
}

/// Init, register, and return the temp dir that owns the project.
fn signed_in_project() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    register(dir.path());
    dir
}

fn add_item(dir: &Path, cadence: &str, number: &str, description: &str) -> String {
    let json = inv_json(
        dir,
        &[
            "item",
            "add",
            "--cadence",
            cadence,
            "--number",
            number,
            "--description",
            description,
            "--units",
            "BAL,KUS,KU",
        ],
    );
    json["id"].as_str().expect("item id").to_string()
}

fn row<'a>(sheet: &'a Value, number: &str) -> &'a Value {
    sheet["rows"]
        .as_array()
        .expect("rows array")
        .iter()
        .find(|row| row["itemNumber"] == number)
        .unwrap_or_else(|| panic!("row {number} should be on the sheet"))
}

// ---------------------------------------------------------------------------
// Project lifecycle
// ---------------------------------------------------------------------------

#[test]
fn init_creates_project_skeleton() {
    let dir = TempDir::new().expect("tempdir");
    let json = inv_json(dir.path(), &["init"]);
    assert_eq!(json["schema_version"].as_u64(), Some(2));
    assert!(dir.path().join(".inventura/config.toml").is_file());
    assert!(dir.path().join(".inventura/inventura.db").is_file());
    assert!(dir.path().join(".inventura/values").is_dir());
}

#[test]
fn init_keeps_existing_config() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let config = dir.path().join(".inventura/config.toml");
    std::fs::write(&config, "# edited\n").expect("write config");
    init_project(dir.path());
    assert_eq!(std::fs::read_to_string(&config).expect("read"), "# edited\n");
}

#[test]
fn commands_outside_a_project_report_not_initialized() {
    let dir = TempDir::new().expect("tempdir");
    let error = inv_json_err(dir.path(), &["item", "list"]);
    assert_eq!(error["error_code"], "E1001");
}

#[test]
fn text_errors_carry_the_code() {
    let dir = TempDir::new().expect("tempdir");
    inv_cmd(dir.path())
        .args(["count", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E1001]"));
}

// ---------------------------------------------------------------------------
// Auth and catalog
// ---------------------------------------------------------------------------

#[test]
fn whoami_follows_the_session() {
    let dir = signed_in_project();
    let me = inv_json(dir.path(), &["whoami"]);
    assert_eq!(me["username"], "jana");
    assert_eq!(me["role"], "user");

    inv_cmd(dir.path()).args(["logout"]).assert().success();
    let error = inv_json_err(dir.path(), &["whoami"]);
    assert_eq!(error["error_code"], "E1003");
}

#[test]
fn login_with_wrong_password_fails() {
    let dir = signed_in_project();
    let error = inv_json_err(
        dir.path(),
        &["login", "--email", "jana@example.com", "--password", "nope12"],
    );
    assert_eq!(error["error_code"], "E4001");
}

#[test]
fn catalog_writes_need_a_session() {
    let dir = TempDir::new().expect("tempdir");
    init_project(dir.path());
    let error = inv_json_err(
        dir.path(),
        &[
            "item",
            "add",
            "-c",
            "daily",
            "-n",
            "1",
            "-d",
            "Soap",
            "-u",
            "BAL,KUS,KU",
        ],
    );
    assert_eq!(error["error_code"], "E1003");

    // Reads stay public.
    let items = inv_json(dir.path(), &["item", "list"]);
    assert_eq!(items.as_array().map(Vec::len), Some(0));
}

#[test]
fn item_list_keeps_insertion_order_per_cadence() {
    let dir = signed_in_project();
    add_item(dir.path(), "daily", "300", "Towels");
    add_item(dir.path(), "daily", "100", "Gloves");
    add_item(dir.path(), "weekly", "200", "Detergent");

    let daily = inv_json(dir.path(), &["item", "list", "--cadence", "daily"]);
    let numbers: Vec<&str> = daily
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|item| item["itemNumber"].as_str())
        .collect();
    assert_eq!(numbers, ["300", "100"]);

    let all = inv_json(dir.path(), &["item", "list"]);
    assert_eq!(all.as_array().map(Vec::len), Some(3));
}

#[test]
fn duplicate_item_number_is_a_conflict() {
    let dir = signed_in_project();
    add_item(dir.path(), "daily", "100", "Gloves");
    let error = inv_json_err(
        dir.path(),
        &[
            "item",
            "add",
            "-c",
            "daily",
            "-n",
            "100",
            "-d",
            "Other",
            "-u",
            "BAL,KUS,KU",
        ],
    );
    assert_eq!(error["error_code"], "E2003");
}

#[test]
fn item_edit_and_remove_by_number() {
    let dir = signed_in_project();
    add_item(dir.path(), "monthly", "55", "Bleach");

    let edited = inv_json(
        dir.path(),
        &["item", "edit", "55", "--cadence", "monthly", "--description", "Bleach 5L"],
    );
    assert_eq!(edited["description"], "Bleach 5L");

    inv_json(dir.path(), &["item", "remove", "55", "--cadence", "monthly"]);
    let error = inv_json_err(dir.path(), &["item", "remove", "55", "--cadence", "monthly"]);
    assert_eq!(error["error_code"], "E2001");
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

#[test]
fn count_values_survive_between_invocations() {
    let dir = signed_in_project();
    add_item(dir.path(), "daily", "100", "Gloves");
    add_item(dir.path(), "daily", "200", "Towels");

    let updated = inv_json(
        dir.path(),
        &["count", "set", "100", "--v1", "2+3", "--v2", "1.5", "--note", "shelf B"],
    );
    assert_eq!(updated["total"].as_f64(), Some(6.5));

    let sheet = inv_json(dir.path(), &["count", "show", "--cadence", "daily"]);
    let counted = row(&sheet, "100");
    assert_eq!(counted["value1"].as_f64(), Some(5.0));
    assert_eq!(counted["value2"].as_f64(), Some(1.5));
    assert_eq!(counted["note"], "shelf B");
    assert_eq!(row(&sheet, "200")["total"].as_f64(), Some(0.0));
}

#[test]
fn locked_rows_ignore_edits_and_count_as_progress() {
    let dir = signed_in_project();
    add_item(dir.path(), "daily", "100", "Gloves");
    add_item(dir.path(), "daily", "200", "Towels");

    let locked = inv_json(dir.path(), &["count", "lock", "100"]);
    assert_eq!(locked["locked"], true);

    let unchanged = inv_json(dir.path(), &["count", "set", "100", "--v1", "9"]);
    assert_eq!(unchanged["locked"], true);
    assert_eq!(unchanged["value1"].as_f64(), Some(0.0));

    inv_cmd(dir.path())
        .args(["count", "set", "100", "--v1", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100 is locked, values unchanged"));

    let sheet = inv_json(dir.path(), &["count", "show"]);
    assert_eq!(sheet["progress"]["locked"].as_u64(), Some(1));
    assert_eq!(sheet["progress"]["total"].as_u64(), Some(2));
    assert_eq!(sheet["progress"]["percent"].as_u64(), Some(50));

    let only_open = inv_json(dir.path(), &["count", "show", "--unlocked"]);
    assert_eq!(only_open["rows"].as_array().map(Vec::len), Some(1));

    // Toggling again unlocks.
    let unlocked = inv_json(dir.path(), &["count", "lock", "100"]);
    assert_eq!(unlocked["locked"], false);
}

#[test]
fn count_reset_needs_one_confirmation() {
    let dir = signed_in_project();
    add_item(dir.path(), "weekly", "10", "Mop");
    inv_json(dir.path(), &["count", "set", "10", "-c", "weekly", "--v3", "4"]);

    let pending = inv_json(dir.path(), &["count", "reset", "--cadence", "weekly"]);
    let token = pending["token"].as_str().expect("token").to_string();
    assert_eq!(pending["steps"].as_u64(), Some(1));

    let done = inv_json(dir.path(), &["confirm", &token]);
    assert_eq!(done["affected"].as_u64(), Some(1));

    let sheet = inv_json(dir.path(), &["count", "show", "-c", "weekly"]);
    assert_eq!(row(&sheet, "10")["total"].as_f64(), Some(0.0));

    // Tokens are single-use.
    let error = inv_json_err(dir.path(), &["confirm", &token]);
    assert_eq!(error["error_code"], "E4004");
}

#[test]
fn item_clear_needs_two_confirmations() {
    let dir = signed_in_project();
    add_item(dir.path(), "weekly", "10", "Mop");
    add_item(dir.path(), "weekly", "11", "Bucket");
    add_item(dir.path(), "daily", "12", "Soap");

    let first = inv_json(dir.path(), &["item", "clear", "--cadence", "weekly"]);
    assert_eq!(first["step"].as_u64(), Some(1));
    assert_eq!(first["steps"].as_u64(), Some(2));

    let second = inv_json(dir.path(), &["confirm", first["token"].as_str().expect("token")]);
    assert_eq!(second["step"].as_u64(), Some(2));

    // Nothing is deleted before the last step.
    let weekly = inv_json(dir.path(), &["item", "list", "-c", "weekly"]);
    assert_eq!(weekly.as_array().map(Vec::len), Some(2));

    let done = inv_json(dir.path(), &["confirm", second["token"].as_str().expect("token")]);
    assert_eq!(done["affected"].as_u64(), Some(2));

    let weekly = inv_json(dir.path(), &["item", "list", "-c", "weekly"]);
    assert_eq!(weekly.as_array().map(Vec::len), Some(0));
    let daily = inv_json(dir.path(), &["item", "list", "-c", "daily"]);
    assert_eq!(daily.as_array().map(Vec::len), Some(1));
}

#[test]
fn materials_deduplicate_across_cadences() {
    let dir = signed_in_project();
    add_item(dir.path(), "daily", "B-2", "Gloves");
    add_item(dir.path(), "weekly", "B-2", "Gloves (weekly)");
    add_item(dir.path(), "monthly", "A-1", "Bleach");

    let materials = inv_json(dir.path(), &["materials"]);
    let numbers: Vec<&str> = materials
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|row| row["itemNumber"].as_str())
        .collect();
    assert_eq!(numbers, ["A-1", "B-2"]);
    assert_eq!(materials[1]["cadence"], "daily");
}

// ---------------------------------------------------------------------------
// Exports and snapshots
// ---------------------------------------------------------------------------

#[test]
fn exports_write_files_into_the_target_directory() {
    let dir = signed_in_project();
    add_item(dir.path(), "daily", "100", "Gloves");
    inv_json(dir.path(), &["count", "set", "100", "--v1", "3"]);
    let out = dir.path().join("exports");
    let out_arg = out.to_str().expect("utf-8 path");

    let csv = inv_json(dir.path(), &["export", "csv", "--out", out_arg]);
    let csv_path = Path::new(csv["path"].as_str().expect("path")).to_path_buf();
    assert!(csv_path.starts_with(&out));
    let bytes = std::fs::read(&csv_path).expect("csv written");
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]), "csv should carry a BOM");
    assert!(String::from_utf8_lossy(&bytes).contains("Gloves"));

    let print = inv_json(dir.path(), &["export", "print", "--out", out_arg]);
    assert_eq!(print["pages"].as_u64(), Some(1));
    let html = std::fs::read_to_string(print["path"].as_str().expect("path")).expect("html");
    assert!(html.contains("Gloves"));
}

#[test]
fn snapshot_lifecycle() {
    let dir = signed_in_project();
    add_item(dir.path(), "daily", "100", "Gloves");
    inv_json(dir.path(), &["count", "set", "100", "--v1", "7"]);

    let saved = inv_json(dir.path(), &["snapshot", "save", "--date", "2025-01-31"]);
    let id = saved["id"].as_str().expect("snapshot id").to_string();
    assert_eq!(saved["date"], "2025-01-31");
    assert_eq!(saved["status"], "draft");
    assert_eq!(saved["items"][0]["value1"].as_f64(), Some(7.0));

    let listed = inv_json(dir.path(), &["snapshot", "list"]);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let completed = inv_json(dir.path(), &["snapshot", "status", &id, "completed"]);
    assert_eq!(completed["status"], "completed");
    assert!(completed["completedAt"].is_string());

    inv_json(dir.path(), &["snapshot", "delete", &id]);
    let error = inv_json_err(dir.path(), &["snapshot", "show", &id]);
    assert_eq!(error["error_code"], "E2002");
}

// ---------------------------------------------------------------------------
// Raw API
// ---------------------------------------------------------------------------

#[test]
fn api_passthrough_reports_status_and_body() {
    let dir = signed_in_project();
    let health = inv_json(dir.path(), &["api", "get", "/health"]);
    assert_eq!(health["status"].as_u64(), Some(200));
    assert_eq!(health["body"]["success"], true);

    inv_cmd(dir.path())
        .args(["api", "get", "/api/items?type=yearly"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("400"));
}
