//! Tests for the extract command and its output formats.
//!
//! Inputs are copied into a temporary directory so discovery, exclusion
//! and per-file failures can be exercised end to end.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vhdl_facts::cli::{run_extract, ExtractArgs, EXIT_ERROR, EXIT_FAILED, EXIT_SUCCESS};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("vhdl")
        .join(name)
}

/// Temporary project with two good fixtures under rtl/.
fn project() -> TempDir {
    let dir = TempDir::new().expect("should create temp dir");
    let rtl = dir.path().join("rtl");
    fs::create_dir_all(&rtl).unwrap();
    for name in ["fsm.sexp", "top.sexp"] {
        fs::copy(fixture(name), rtl.join(name)).unwrap();
    }
    dir
}

fn args(path: &Path, format: &str, output: &Path) -> ExtractArgs {
    ExtractArgs {
        path: path.to_path_buf(),
        format: format.to_string(),
        config: None,
        output: Some(output.to_path_buf()),
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("output should be written");
    serde_json::from_str(&text).expect("output should be JSON")
}

#[test]
fn test_json_output_lists_files_in_order() {
    let dir = project();
    let out = dir.path().join("facts.json");

    let code = run_extract(&args(&dir.path().join("rtl"), "json", &out)).unwrap();
    assert_eq!(code, EXIT_SUCCESS);

    let value = read_json(&out);
    assert_eq!(value["files_scanned"], 2);
    let files = value["files"].as_array().unwrap();
    assert!(files[0]["file"].as_str().unwrap().ends_with("fsm.sexp"));
    assert!(files[1]["file"].as_str().unwrap().ends_with("top.sexp"));
    assert_eq!(files[1]["instances"][0]["name"], "u_fifo");
    assert!(value.get("failures").is_none());
}

#[test]
fn test_tables_output() {
    let dir = project();
    let out = dir.path().join("tables.json");

    let code = run_extract(&args(&dir.path().join("rtl"), "tables", &out)).unwrap();
    assert_eq!(code, EXIT_SUCCESS);

    let value = read_json(&out);
    assert_eq!(value["files"].as_array().unwrap().len(), 2);
    assert_eq!(value["architectures"][0]["entity_name"], "fsm");
    assert_eq!(value["processes"][0]["label"], "p_out");
    assert_eq!(value["types"][0]["kind"], "enum");
}

#[test]
fn test_broken_file_fails_but_others_are_emitted() {
    let dir = project();
    fs::write(dir.path().join("rtl/broken.sexp"), "(design_file (entity_declaration").unwrap();
    let out = dir.path().join("facts.json");

    let code = run_extract(&args(&dir.path().join("rtl"), "json", &out)).unwrap();
    assert_eq!(code, EXIT_FAILED);

    let value = read_json(&out);
    assert_eq!(value["files_scanned"], 3);
    assert_eq!(value["files"].as_array().unwrap().len(), 2);
    let failures = value["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0]["file"].as_str().unwrap().ends_with("broken.sexp"));
}

#[test]
fn test_config_excludes_paths() {
    let dir = project();
    fs::create_dir_all(dir.path().join("rtl/sim")).unwrap();
    fs::copy(fixture("cdc_sync.sexp"), dir.path().join("rtl/sim/tb.sexp")).unwrap();
    let config = dir.path().join("vhdl-facts.yaml");
    fs::write(&config, "excluded_paths:\n  - \"**/sim/**\"\n").unwrap();
    let out = dir.path().join("facts.json");

    let mut a = args(&dir.path().join("rtl"), "json", &out);
    a.config = Some(config);
    assert_eq!(run_extract(&a).unwrap(), EXIT_SUCCESS);
    assert_eq!(read_json(&out)["files_scanned"], 2);
}

#[test]
fn test_pretty_output_and_single_file() {
    colored::control::set_override(false);
    let dir = project();
    let out = dir.path().join("summary.txt");

    let code = run_extract(&args(&dir.path().join("rtl/top.sexp"), "pretty", &out)).unwrap();
    assert_eq!(code, EXIT_SUCCESS);

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("architecture struct of top"));
    assert!(text.contains("instances"));
    assert!(text.contains("OK"));
}

#[test]
fn test_invalid_format_and_missing_path() {
    let dir = project();
    let out = dir.path().join("x");
    assert_eq!(
        run_extract(&args(&dir.path().join("rtl"), "sarif", &out)).unwrap(),
        EXIT_ERROR
    );
    assert_eq!(
        run_extract(&args(&dir.path().join("nope"), "json", &out)).unwrap(),
        EXIT_ERROR
    );
}
