//! CLI Integration Tests
//!
//! These tests verify that the CLI commands work correctly end-to-end.
//! They test the actual binary behavior, not just the library.
//!
//! Run with:
//! ```bash
//! cargo test --test cli_integration
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

/// Get the path to the built binary
fn gtv_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_gtv"))
}

/// Run gtv and return (stdout, stderr, success)
fn run_gtv(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(gtv_binary())
        .args(["-f", "json"])
        .args(args)
        .env_remove("GTV_HASH_ALGORITHM")
        .env_remove("GTV_POLL_ATTEMPTS")
        .env_remove("GTV_POLL_DELAY_MS")
        .output()
        .expect("Failed to execute gtv");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn parse(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout.trim()).expect("stdout should be JSON")
}

fn write_doc(dir: &Path, name: &str, doc: &serde_json::Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, doc.to_string()).unwrap();
    path.to_str().unwrap().to_string()
}

fn root_of(file: &str) -> String {
    let (stdout, stderr, success) = run_gtv(&["hash", file]);
    assert!(success, "hash failed: {}", stderr);
    parse(&stdout)["root"].as_str().unwrap().to_string()
}

// ============================================================================
// Hashing
// ============================================================================

#[test]
fn test_cli_hash_is_order_independent() {
    let dir = tempdir().unwrap();
    let a = write_doc(dir.path(), "a.json", &serde_json::json!({"a": 1, "b": [true, null]}));
    let b = write_doc(dir.path(), "b.json", &serde_json::json!({"b": [true, null], "a": 1}));

    let root = root_of(&a);
    assert_eq!(root.len(), 64);
    assert_eq!(root, root_of(&b));
}

#[test]
fn test_cli_algorithm_flag() {
    let dir = tempdir().unwrap();
    let file = write_doc(dir.path(), "doc.json", &serde_json::json!(["x"]));

    let (stdout, _, success) = run_gtv(&["-a", "sha256", "hash", &file]);
    assert!(success);
    let json = parse(&stdout);
    assert_eq!(json["algorithm"], "sha256");
    assert_ne!(json["root"].as_str().unwrap(), root_of(&file));
}

#[test]
fn test_cli_config_file() {
    let dir = tempdir().unwrap();
    let file = write_doc(dir.path(), "doc.json", &serde_json::json!({"k": "v"}));
    let config = write_doc(
        dir.path(),
        "gtv.json",
        &serde_json::json!({"hash_algorithm": "sha256"}),
    );

    let (stdout, _, success) = run_gtv(&["-c", &config, "hash", &file]);
    assert!(success);
    assert_eq!(parse(&stdout)["algorithm"], "sha256");
}

#[test]
fn test_cli_tree_shape() {
    let dir = tempdir().unwrap();
    let file = write_doc(dir.path(), "doc.json", &serde_json::json!(["a", "b", "c"]));

    let (stdout, _, success) = run_gtv(&["tree", &file]);
    assert!(success);
    let json = parse(&stdout);
    assert_eq!(json["shape"], "A3(L,N(L,L))");
    assert_eq!(json["max_level"], 3);
    assert_eq!(json["leaves"], 3);
}

#[test]
fn test_cli_rejects_missing_file() {
    let (_, _, success) = run_gtv(&["hash", "/nonexistent/doc.json"]);
    assert!(!success);
}

// ============================================================================
// Prove / verify
// ============================================================================

#[test]
fn test_cli_prove_and_verify_binary() {
    let dir = tempdir().unwrap();
    let file = write_doc(
        dir.path(),
        "doc.json",
        &serde_json::json!({"name": "alice", "age": 30, "tags": ["x", "y"]}),
    );
    let root = root_of(&file);
    let proof = dir.path().join("proof.bin");
    let proof_str = proof.to_str().unwrap();

    let (stdout, stderr, success) =
        run_gtv(&["prove", &file, "-p", "name", "-p", "tags[1]", "-o", proof_str]);
    assert!(success, "prove failed: {}", stderr);
    let json = parse(&stdout);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["root"], root.as_str());
    assert!(proof.exists());

    let (stdout, stderr, success) = run_gtv(&["verify", proof_str, "-r", &root, "-p", "name"]);
    assert!(success, "verify failed: {}", stderr);
    let json = parse(&stdout);
    assert_eq!(json["valid"], true);
    // Tagged text: tag byte 5 followed by the UTF-8 bytes
    assert_eq!(json["leaves"]["name"], "05616c696365");
}

#[test]
fn test_cli_verify_wrong_root_fails() {
    let dir = tempdir().unwrap();
    let file = write_doc(dir.path(), "doc.json", &serde_json::json!({"a": 1}));
    let other = write_doc(dir.path(), "other.json", &serde_json::json!({"a": 2}));
    let proof = dir.path().join("proof.bin");
    let proof_str = proof.to_str().unwrap();

    let (_, _, success) = run_gtv(&["prove", &file, "-p", "a", "-o", proof_str]);
    assert!(success);

    let (stdout, _, success) = run_gtv(&["verify", proof_str, "-r", &root_of(&other)]);
    assert!(!success);
    assert_eq!(parse(&stdout)["valid"], false);
}

#[test]
fn test_cli_prove_json_output_verifies() {
    let dir = tempdir().unwrap();
    let file = write_doc(dir.path(), "doc.json", &serde_json::json!([1, 2, 3, 4]));
    let root = root_of(&file);

    let (stdout, _, success) = run_gtv(&["prove", &file, "-p", "[2]"]);
    assert!(success);
    let proof = dir.path().join("proof.json");
    std::fs::write(&proof, stdout.trim()).unwrap();

    let (stdout, stderr, success) =
        run_gtv(&["verify", proof.to_str().unwrap(), "-r", &root, "-p", "[2]"]);
    assert!(success, "verify failed: {}", stderr);
    assert_eq!(parse(&stdout)["valid"], true);
}

#[test]
fn test_cli_prove_bad_path_fails() {
    let dir = tempdir().unwrap();
    let file = write_doc(dir.path(), "doc.json", &serde_json::json!({"a": 1}));

    let (_, stderr, success) = run_gtv(&["prove", &file, "-p", "b"]);
    assert!(!success);
    assert!(stderr.contains("not present"), "stderr: {}", stderr);
}

#[test]
fn test_cli_verify_refuses_pinned_root_digest() {
    let dir = tempdir().unwrap();
    let honest = write_doc(dir.path(), "doc.json", &serde_json::json!({"x": "truth"}));
    let lie = write_doc(dir.path(), "lie.json", &serde_json::json!({"x": "lie"}));
    let root = root_of(&honest);

    let (stdout, _, success) = run_gtv(&["prove", &honest]);
    assert!(success);
    let claimed = parse(&stdout)["root"].clone();

    // Fully disclosed tree for another value, with the real root pinned on
    // its root node
    let (stdout, _, success) = run_gtv(&["prove", &lie, "-p", "x"]);
    assert!(success);
    let mut forged = parse(&stdout);
    let root_id = forged["tree"]["root"].as_u64().unwrap().to_string();
    forged["root"] = claimed.clone();
    forged["pruned"][root_id] = claimed;
    let proof = write_doc(dir.path(), "forged.json", &forged);

    let (_, stderr, success) = run_gtv(&["verify", &proof, "-r", &root, "-p", "x"]);
    assert!(!success);
    assert!(stderr.contains("not a pruned node"), "stderr: {}", stderr);
}
