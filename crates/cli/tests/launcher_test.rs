//! Process-level tests for the `compdb` launcher: database initialization,
//! environment setup, exit-code propagation, and a full build-tool run
//! against stub compilers.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_stub(path: &Path, script: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{script}\n")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn initializes_database_and_hands_the_tool_the_environment() {
    let dir = TempDir::new().unwrap();
    // The launcher resolves paths against its physical working directory.
    let root = dir.path().canonicalize().unwrap();
    let clang = root.join("clang");
    write_stub(&clang, "exit 0");
    let env_dump = root.join("env.txt");
    let tool = root.join("buildtool");
    write_stub(
        &tool,
        &format!(
            "printf '%s\\n' \"$CC\" \"$CXX\" \"$LD\" \"$LDPLUSPLUS\" \
             \"$COMPILATION_DB_CLANG_PATH\" \"$COMPILATION_DB_DATABASE_PATH\" > {}",
            env_dump.display()
        ),
    );

    Command::cargo_bin("compdb")
        .unwrap()
        .current_dir(&root)
        .arg("--compiler")
        .arg(&clang)
        .arg(&tool)
        .assert()
        .success();

    let db = root.join("compile_commands.json");
    assert_eq!(std::fs::read_to_string(&db).unwrap(), "[]");

    let dump = std::fs::read_to_string(&env_dump).unwrap();
    let lines: Vec<&str> = dump.lines().collect();
    assert!(lines[0].ends_with("compdb-cc"));
    assert!(lines[1].ends_with("compdb-cxx"));
    assert_eq!(lines[2], clang.to_str().unwrap());
    assert_eq!(lines[3], format!("{}++", clang.display()));
    assert_eq!(lines[4], clang.to_str().unwrap());
    assert_eq!(lines[5], db.to_str().unwrap());
}

#[test]
fn refuses_to_run_over_an_existing_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("compile_commands.json");
    std::fs::write(&db, "[{\"stale\": true}]").unwrap();
    let ran = dir.path().join("ran");
    let tool = dir.path().join("buildtool");
    write_stub(&tool, &format!("touch {}", ran.display()));

    Command::cargo_bin("compdb")
        .unwrap()
        .current_dir(dir.path())
        .arg("--compiler")
        .arg("/usr/bin/cc")
        .arg(&tool)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert!(!ran.exists(), "the build tool must not run");
    // The stale document is left untouched.
    assert_eq!(
        std::fs::read_to_string(&db).unwrap(),
        "[{\"stale\": true}]"
    );
}

#[test]
fn propagates_the_build_tool_exit_code() {
    let dir = TempDir::new().unwrap();
    let tool = dir.path().join("buildtool");
    write_stub(&tool, "exit 7");

    Command::cargo_bin("compdb")
        .unwrap()
        .current_dir(dir.path())
        .arg("--compiler")
        .arg("/usr/bin/cc")
        .arg(&tool)
        .assert()
        .code(7);
}

#[test]
fn forwards_build_tool_arguments_unchanged() {
    let dir = TempDir::new().unwrap();
    let args_dump = dir.path().join("args.txt");
    let tool = dir.path().join("buildtool");
    write_stub(
        &tool,
        &format!("printf '%s\\n' \"$@\" > {}", args_dump.display()),
    );

    Command::cargo_bin("compdb")
        .unwrap()
        .current_dir(dir.path())
        .arg("--compiler")
        .arg("/usr/bin/cc")
        .arg(&tool)
        .args(["build", "-project", "App.xcodeproj", "-configuration", "Debug"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(&args_dump).unwrap(),
        "build\n-project\nApp.xcodeproj\n-configuration\nDebug\n"
    );
}

#[test]
fn full_build_records_every_compile() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let clang = root.join("clang");
    write_stub(&clang, "exit 0");
    // A build tool that compiles two C files and one probe through the
    // diverted CC, like a real build would.
    let tool = root.join("buildtool");
    write_stub(
        &tool,
        "\"$CC\" -c main.c -o main.o && \
         \"$CC\" -c 'a b.c' && \
         \"$CC\" -c /dev/null",
    );

    Command::cargo_bin("compdb")
        .unwrap()
        .current_dir(&root)
        .arg("--compiler")
        .arg(&clang)
        .arg(&tool)
        .assert()
        .success();

    let contents =
        std::fs::read_to_string(root.join("compile_commands.json")).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&contents).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2, "the null-device probe is not recorded");

    let files: Vec<&str> = entries
        .iter()
        .map(|e| e["file"].as_str().unwrap())
        .collect();
    assert!(files.contains(&"main.c"));
    assert!(files.contains(&"a b.c"));
    for entry in entries {
        assert_eq!(entry["directory"], root.to_str().unwrap());
        assert!(entry["command"]
            .as_str()
            .unwrap()
            .starts_with(clang.to_str().unwrap()));
    }
}
