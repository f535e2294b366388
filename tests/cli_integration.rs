//! CLI integration tests for pookie.
//!
//! These tests exercise the binary without network or docker: commands that
//! need release metadata read it from a `file://` URL.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the pookie binary command, isolated from the user's global config.
fn pookie(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pookie").unwrap();
    cmd.env("HOME", home).env_remove("WORKSPACE_PWD");
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write a saved release document and return its `file://` URL.
fn release_file(dir: &Path, assets: &[&str]) -> String {
    let assets: Vec<serde_json::Value> = assets
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "browser_download_url": format!("https://example.invalid/{}", name),
            })
        })
        .collect();
    let body = serde_json::json!({ "tag_name": "20240713", "assets": assets });

    let path = dir.join("latest.json");
    fs::write(&path, body.to_string()).unwrap();
    url::Url::from_file_path(&path).unwrap().to_string()
}

fn write_project_config(dir: &Path, contents: &str) {
    fs::create_dir_all(dir.join(".pookie")).unwrap();
    fs::write(dir.join(".pookie/config.toml"), contents).unwrap();
}

// ============================================================================
// general
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("versions"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn test_targets_lists_every_platform() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .arg("targets")
        .assert()
        .success()
        .stdout(predicate::str::contains("manylinux_2_17_riscv64"))
        .stdout(predicate::str::contains("win-macosx-pookie"))
        .stdout(predicate::str::contains("cross/emulate"));
}

#[test]
fn test_completions() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pookie"));
}

// ============================================================================
// pookie plan
// ============================================================================

#[test]
fn test_plan_native_build() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args([
            "plan",
            "--build",
            "python3 -m build",
            "--python-version",
            "12",
            "--target",
            "manylinux_2_17_x86_64",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "manylinux-lvl3-cp312-manylinux_2_17_x86_64",
        ))
        .stdout(predicate::str::contains("export CC=\"gcc\""))
        .stdout(predicate::str::contains("python3 -m build"))
        .stdout(predicate::str::contains(
            "wheelhouse/cp312-manylinux_2_17_x86_64",
        ));
}

#[test]
fn test_plan_clang_compiler() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args([
            "plan",
            "--build",
            "make",
            "--python-version",
            "3.11",
            "--target",
            "musllinux_1_2_x86_64",
            "--linux-x86_64-compiler",
            "clang",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("export CC=\"clang\""));
}

#[test]
fn test_plan_windows_test_is_unsupported() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args([
            "plan",
            "--test",
            "pytest",
            "--python-version",
            "12",
            "--target",
            "win_amd64",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "test is not supported yet for win_amd64",
        ));
}

#[test]
fn test_plan_json() {
    let tmp = temp_dir();

    let output = pookie(tmp.path())
        .current_dir(tmp.path())
        .args([
            "plan",
            "--json",
            "--build",
            "make",
            "--test",
            "pytest",
            "--python-version",
            "12",
            "--target",
            "macosx_11_0_arm64",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let plans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plans[0]["phase"], "build");
    assert_eq!(plans[0]["plan"]["type"], "pipeline");
    assert_eq!(plans[1]["phase"], "test");
    assert_eq!(plans[1]["plan"]["type"], "unsupported");
    assert!(plans[1].get("command").is_none());
}

#[test]
fn test_plan_requires_python_versions() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args(["plan", "--build", "make"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no Python versions given"));
}

#[test]
fn test_invalid_target_is_rejected() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .args([
            "plan",
            "--build",
            "make",
            "--python-version",
            "12",
            "--target",
            "solaris_sparc",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid target 'solaris_sparc'"));
}

#[test]
fn test_invalid_mode_is_rejected() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .args([
            "plan",
            "--build",
            "make",
            "--python-version",
            "12",
            "--linux-non-native-mode",
            "native",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("native"));
}

// ============================================================================
// configuration
// ============================================================================

#[test]
fn test_project_config_supplies_matrix() {
    let tmp = temp_dir();
    write_project_config(
        tmp.path(),
        r#"
[matrix]
targets = ["win_amd64"]
python-versions = ["3.11"]
"#,
    );

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args(["plan", "--build", "make"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "win-macosx-pookie-lvl3-cp311-win_amd64",
        ))
        .stdout(predicate::str::contains("manylinux").not());
}

#[test]
fn test_cli_overrides_config() {
    let tmp = temp_dir();
    write_project_config(
        tmp.path(),
        r#"
[matrix]
python-versions = ["11"]

[build]
linux-x86_64-compiler = "clang"
"#,
    );

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args([
            "plan",
            "--build",
            "make",
            "--python-version",
            "13",
            "--target",
            "manylinux_2_17_x86_64",
            "--linux-x86_64-compiler",
            "gcc",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("cp313"))
        .stdout(predicate::str::contains("export CC=\"gcc\""));
}

#[test]
fn test_global_config_is_read() {
    let home = temp_dir();
    write_project_config(
        home.path(),
        r#"
[matrix]
python-versions = ["10"]
targets = ["macosx_11_0_x86_64"]
"#,
    );
    let project = temp_dir();

    pookie(home.path())
        .current_dir(project.path())
        .args(["plan", "--build", "make"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "win-macosx-pookie-lvl3-cp310-macosx_11_0_x86_64",
        ));
}

#[test]
fn test_invalid_config_value_is_an_error() {
    let tmp = temp_dir();
    write_project_config(
        tmp.path(),
        r#"
[build]
linux-non-native-mode = "sometimes"
"#,
    );

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args(["plan", "--build", "make", "--python-version", "12"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sometimes"));
}

// ============================================================================
// pookie versions
// ============================================================================

#[test]
fn test_versions_from_saved_release() {
    let tmp = temp_dir();
    let url = release_file(
        tmp.path(),
        &[
            "cpython-3.11.9+20240713-x86_64-unknown-linux-gnu-install_only.tar.gz",
            "cpython-3.12.4+20240713-x86_64-unknown-linux-gnu-install_only.tar.gz",
            "cpython-3.12.4+20240713-x86_64-unknown-linux-gnu-debug-full.tar.zst",
            "cpython-3.12.4+20240713-aarch64-apple-darwin-install_only.tar.gz",
        ],
    );

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args([
            "versions",
            "--release-url",
            &url,
            "--target",
            "manylinux_2_17_x86_64",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Python 3.11.x:"))
        .stdout(predicate::str::contains("Python 3.12.x:"))
        .stdout(predicate::str::contains("  Target: manylinux_2_17_x86_64"))
        .stdout(predicate::str::contains(
            "    Filename: cpython-3.12.4+20240713-x86_64-unknown-linux-gnu-install_only.tar.gz",
        ))
        .stdout(predicate::str::contains("    Release tag: 20240713"))
        .stdout(predicate::str::contains("debug-full").not())
        .stdout(predicate::str::contains("apple-darwin").not());
}

#[test]
fn test_versions_requested_minor() {
    let tmp = temp_dir();
    let url = release_file(
        tmp.path(),
        &[
            "cpython-3.11.9+20240713-x86_64-unknown-linux-musl-install_only.tar.gz",
            "cpython-3.12.4+20240713-x86_64-unknown-linux-musl-install_only.tar.gz",
        ],
    );

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args([
            "versions",
            "--release-url",
            &url,
            "--python-version",
            "11",
            "--target",
            "musllinux_1_2_x86_64",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Python 3.11.x:"))
        .stdout(predicate::str::contains("Python 3.12.x:").not());
}

#[test]
fn test_versions_without_matches() {
    let tmp = temp_dir();
    let url = release_file(tmp.path(), &["SHA256SUMS"]);

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args(["versions", "--release-url", &url])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "No matching assets found in latest release.",
        ));
}

#[test]
fn test_versions_malformed_release() {
    let tmp = temp_dir();
    let path = tmp.path().join("latest.json");
    fs::write(&path, "not json").unwrap();
    let url = url::Url::from_file_path(&path).unwrap().to_string();

    pookie(tmp.path())
        .current_dir(tmp.path())
        .args(["versions", "--release-url", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse release metadata"));
}

#[test]
fn test_versions_json() {
    let tmp = temp_dir();
    let url = release_file(
        tmp.path(),
        &["cpython-3.12.4+20240713-x86_64-pc-windows-msvc-install_only.tar.gz"],
    );

    let output = pookie(tmp.path())
        .current_dir(tmp.path())
        .args([
            "--message-format",
            "json",
            "versions",
            "--release-url",
            &url,
            "--target",
            "win_amd64",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let runtimes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(runtimes[0]["minor"], 12);
    assert_eq!(runtimes[0]["target"], "win_amd64");
    assert_eq!(runtimes[0]["release_tag"], "20240713");
}

// ============================================================================
// pookie run
// ============================================================================

#[test]
fn test_run_needs_a_command() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .current_dir(tmp.path())
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to run"));
}

#[test]
fn test_run_without_docker_fails_fast() {
    let tmp = temp_dir();

    pookie(tmp.path())
        .current_dir(tmp.path())
        .env("PATH", tmp.path())
        .args(["run", "--build", "make"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("`docker` was not found"));
}
