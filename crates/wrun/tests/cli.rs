use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn write_wat(wat: &str) -> Result<NamedTempFile, anyhow::Error> {
    let mut file = tempfile::Builder::new().suffix(".wat").tempfile()?;
    file.write_all(wat.as_bytes())?;
    Ok(file)
}

fn wrun() -> Result<Command, anyhow::Error> {
    let mut cmd = Command::cargo_bin("wrun")?;
    cmd.env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn no_module_prints_help_and_fails() -> Result<(), anyhow::Error> {
    wrun()?
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn main_result_becomes_exit_code() -> Result<(), anyhow::Error> {
    let file = write_wat(r#"(module (func (export "main") (result i32) i32.const 42))"#)?;
    wrun()?.arg(file.path()).assert().code(42);
    Ok(())
}

#[test]
fn check_mode_does_not_run() -> Result<(), anyhow::Error> {
    let file = write_wat(r#"(module (func (export "main") unreachable))"#)?;
    wrun()?.arg("--check").arg(file.path()).assert().success();
    Ok(())
}

#[test]
fn check_mode_rejects_invalid_module() -> Result<(), anyhow::Error> {
    let file = write_wat("(module (func (result i32)))")?;
    wrun()?
        .arg("-c")
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load"));
    Ok(())
}

#[test]
fn function_arguments_follow_double_dash() -> Result<(), anyhow::Error> {
    let file = write_wat(
        r#"
        (module
            (import "spectest" "print_i32" (func $print (param i32)))
            (func (export "twice") (param i32) (result i32)
                local.get 0
                call $print
                local.get 0
                i32.const 2
                i32.mul
            )
        )
    "#,
    )?;
    wrun()?
        .arg(file.path())
        .args(["-f", "twice", "--", "-21"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-21 : i32"));
    Ok(())
}

#[test]
fn arguments_after_the_module_reach_main() -> Result<(), anyhow::Error> {
    let file = write_wat(
        r#"
        (module
            (memory (export "memory") 1)
            (func (export "main") (param i32 i32) (result i32)
                local.get 0
            )
        )
    "#,
    )?;
    wrun()?.arg(file.path()).args(["a", "b"]).assert().code(3);
    wrun()?.arg(file.path()).args(["--", "a", "b", "c"]).assert().code(4);
    Ok(())
}

#[test]
fn bad_argument_is_reported() -> Result<(), anyhow::Error> {
    let file = write_wat(r#"(module (func (export "id") (param f32) (result f32) local.get 0))"#)?;
    wrun()?
        .arg(file.path())
        .args(["--function", "id", "--", "pi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'pi' is not a valid f32"));
    Ok(())
}

#[test]
fn missing_function_is_reported() -> Result<(), anyhow::Error> {
    let file = write_wat("(module)")?;
    wrun()?
        .arg(file.path())
        .args(["-f", "nope"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not export 'nope'"));
    Ok(())
}

#[test]
fn trap_exits_with_failure() -> Result<(), anyhow::Error> {
    let file = write_wat(
        r#"
        (module
            (import "env" "missing" (func $missing))
            (func (export "main") (result i32)
                call $missing
                i32.const 0
            )
        )
    "#,
    )?;
    wrun()?
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Generated stub for missing function import env.missing"))
        .stderr(predicate::str::contains("runtime exception"));
    Ok(())
}

#[test]
fn preload_links_a_dependency() -> Result<(), anyhow::Error> {
    let dep = write_wat(r#"(module (global (export "answer") i32 (i32.const 11)))"#)?;
    let main = write_wat(
        r#"
        (module
            (import "lib" "answer" (global $answer i32))
            (func (export "main") (result i32) global.get $answer)
        )
    "#,
    )?;
    let preload = format!("lib={}", dep.path().display());
    wrun()?
        .arg("--preload")
        .arg(preload)
        .arg(main.path())
        .assert()
        .code(11);
    Ok(())
}

#[test]
fn malformed_preload_is_a_usage_error() -> Result<(), anyhow::Error> {
    let file = write_wat("(module)")?;
    wrun()?
        .args(["--preload", "nothing-here"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME=PATH"));
    Ok(())
}
