//! Binary execution tests for the docstatic CLI

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/doc")
}

/// A command pointed at the fixture tree with a private cache.
fn docstatic(cache: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docstatic").unwrap();
    cmd.arg("--doc-root")
        .arg(fixture_root())
        .arg("--cache-dir")
        .arg(cache.path())
        .arg("--quiet");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn test_binary_help() {
    let output = Command::cargo_bin("docstatic")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    assert!(help.contains("aliases"));
    assert!(help.contains("sidebar"));
}

#[test]
fn test_print_cache_dir_prefers_env() {
    let temp_dir = TempDir::new().unwrap();
    let output = Command::cargo_bin("docstatic")
        .unwrap()
        .env("DOCSTATIC_CACHE_DIR", temp_dir.path())
        .arg("--print-cache-dir")
        .output()
        .unwrap();
    assert!(output.status.success());
    let printed = String::from_utf8(output.stdout).unwrap();
    assert_eq!(printed.trim(), temp_dir.path().display().to_string());
}

#[test]
fn test_aliases_command() {
    let cache = TempDir::new().unwrap();
    let output = docstatic(&cache)
        .args(["aliases", "+", "--library", "nom"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    let names: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["entry"]["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["AddAssign", "Add"]);
}

#[test]
fn test_aliases_whole_library() {
    let cache = TempDir::new().unwrap();
    let output = docstatic(&cache)
        .args(["aliases", "--library", "adler32"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!({}));

    let missing = docstatic(&cache)
        .args(["aliases", "--library", "missing"])
        .output()
        .unwrap();
    assert!(!missing.status.success());
}

#[test]
fn test_sidebar_command() {
    let cache = TempDir::new().unwrap();
    let output = docstatic(&cache)
        .args(["sidebar", "vulkano::framebuffer", "--category", "fn"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(
        json["items"]["fn"],
        serde_json::json!([[
            "ensure_image_view_compatible",
            "Checks whether the given image view is allowed to be the nth attachment of the given render pass."
        ]])
    );
}

#[test]
fn test_search_command() {
    let cache = TempDir::new().unwrap();
    let output = docstatic(&cache)
        .args(["search", "Framebuffer", "--kind", "struct", "--limit", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    let results = json.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["path"], "vulkano::framebuffer::Framebuffer");
}

#[test]
fn test_validate_command_succeeds_on_fixture() {
    let cache = TempDir::new().unwrap();
    let output = docstatic(&cache).arg("validate").output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["issues"], serde_json::json!([]));
}

#[test]
fn test_validate_command_fails_on_bad_records() {
    let docs = TempDir::new().unwrap();
    std::fs::write(
        docs.path().join("aliases.js"),
        "var ALIASES = {};\nALIASES[\"nom\"] = {\"+\":[{'crate':'nom','ty':99,'name':'Add','desc':'','p':''}]};\n",
    )
    .unwrap();

    let cache = TempDir::new().unwrap();
    let output = Command::cargo_bin("docstatic")
        .unwrap()
        .arg("--doc-root")
        .arg(docs.path())
        .arg("--cache-dir")
        .arg(cache.path())
        .arg("--quiet")
        .arg("validate")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["issues"].as_array().unwrap().len(), 2);
}

#[test]
fn test_export_command() {
    let cache = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let output = docstatic(&cache)
        .arg("export")
        .arg("--out")
        .arg(out.path())
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(out.path().join("catalog.json").is_file());
    assert_eq!(stdout_json(&output)["modules"], 3);
}

#[test]
fn test_missing_doc_root_fails() {
    let cache = TempDir::new().unwrap();
    let output = Command::cargo_bin("docstatic")
        .unwrap()
        .arg("--doc-root")
        .arg(cache.path().join("nope"))
        .arg("--cache-dir")
        .arg(cache.path())
        .arg("aliases")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
