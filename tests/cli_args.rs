//! Integration tests for the softplay binary
//!
//! Runs without Supabase credentials, so every command is answered from the
//! bundled sample venues.

use std::process::Command;

/// Helper to run the CLI offline with given args and capture output
///
/// The credentials are set blank rather than removed: dotenvy never overrides
/// a variable that already exists, so a local `.env` cannot bring them back.
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_softplay"))
        .args(args)
        .env("SUPABASE_URL", "")
        .env("SUPABASE_ANON_KEY", "")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute softplay")
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = stdout(&output);
    assert!(stdout.contains("softplay"), "Help should mention softplay");
    assert!(stdout.contains("search"), "Help should mention the search command");
}

#[test]
fn test_search_help_lists_filters() {
    let output = run_cli(&["search", "--help"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    for flag in ["--keyword", "--location", "--category", "--feature", "--rating", "--open-today"] {
        assert!(stdout.contains(flag), "search help should mention {}", flag);
    }
}

#[test]
fn test_invalid_category_prints_error_and_exits() {
    let output = run_cli(&["search", "--category", "bowling"]);
    assert!(!output.status.success(), "Expected invalid category to fail");
    let stderr = stderr(&output);
    assert!(
        stderr.contains("Invalid category"),
        "Should print error message about invalid category: {}",
        stderr
    );
}

#[test]
fn test_offline_search_shows_sample_venues_with_banner() {
    let output = run_cli(&["search"]);
    assert!(output.status.success());

    let stdout = stdout(&output);
    assert!(stdout.contains("Jungle Jim's Play Centre"));
    assert!(stdout.contains("Little Explorers Soft Play"));
    assert!(stdout.contains("Bounce Kingdom"));
    assert!(stderr(&output).contains("sample venues"));
}

#[test]
fn test_offline_late_search_as_json() {
    let output = run_cli(&["search", "--category", "late", "--json"]);
    assert!(output.status.success());

    let body: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("stdout should be JSON");
    assert_eq!(body["showing_fallback"], serde_json::Value::Bool(true));

    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("data should be an array")
        .iter()
        .filter_map(|v| v["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Jungle Jim's Play Centre", "Bounce Kingdom"]);
}

#[test]
fn test_venue_detail() {
    let output = run_cli(&["venue", "2"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.starts_with("Little Explorers Soft Play"));
    assert!(stdout.contains("Opening hours:"));
}

#[test]
fn test_unknown_venue_fails() {
    let output = run_cli(&["venue", "999"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no venue with id 999"));
}

#[test]
fn test_locations_lists_cities() {
    let output = run_cli(&["locations"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.starts_with("London ("));
    assert!(stdout.contains("Manchester"));
}
