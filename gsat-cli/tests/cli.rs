use assert_cmd::prelude::*; // Add methods on commands
use assert_fs::{prelude::*, TempDir};
use predicates::prelude::*;
use std::process::Command; // Run programs
use test_log::test;

const BIN: &str = "gsat";

const PROGRAM: &str = "% push the existential through
S(?x) :- R(?x) .
T(?x, !y) :- S(?x) .
U(?x) :- T(?x, ?y) .
V(?x) :- W(?x) .
";

#[cfg_attr(miri, ignore)]
#[test]
fn cli_argument_parsing() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg("-vvv").arg("Non-existing-file.rls");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No such file or directory"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg("-h");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Print help"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains(BIN));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg("-v").arg("-q").arg("rules.rls");
    cmd.assert().failure().stderr(predicate::str::contains(
        "argument '--verbose...' cannot be used with '--quiet'",
    ));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg("--order").arg("random").arg("rules.rls");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("'--order <ORDER>'"));
    Ok(())
}

#[cfg_attr(miri, ignore)]
#[test]
fn saturated_rules_are_printed() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rules = dir.child("rules.rls");
    rules.write_str(PROGRAM)?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("U(?x0) :- S(?x0) ."))
        .stdout(predicate::str::contains("S(?x0) :- R(?x0) ."))
        .stdout(predicate::str::contains("V(?x0) :- W(?x0) ."))
        .stdout(predicate::str::contains("sk0_0").not());

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path()).arg("--target").arg("U");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("U(?x0) :- S(?x0) ."))
        .stdout(predicate::str::contains("V(").not());

    dir.close()?;
    Ok(())
}

#[cfg_attr(miri, ignore)]
#[test]
fn output_and_statistics_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rules = dir.child("rules.rls");
    rules.write_str(PROGRAM)?;
    let output = dir.child("saturated.rls");
    let statistics = dir.child("statistics.json");

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path())
        .arg("-o")
        .arg(output.path())
        .arg("--statistics")
        .arg(statistics.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Saturation"))
        .stdout(predicate::str::contains("Derived"));

    output.assert(predicate::str::contains("U(?x0) :- S(?x0) ."));
    statistics.assert(predicate::str::contains("\"input_rules\": 4"));
    statistics.assert(predicate::str::contains("\"durations_ms\""));

    // existing files are only replaced on request
    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path()).arg("-o").arg(output.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path())
        .arg("-o")
        .arg(output.path())
        .arg("--overwrite")
        .arg("--report")
        .arg("none");
    cmd.assert().success().stdout(predicate::str::is_empty());

    dir.close()?;
    Ok(())
}

#[cfg_attr(miri, ignore)]
#[test]
fn malformed_rules_are_reported() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rules = dir.child("rules.rls");
    rules.write_str("S(?x) :- R(?x) .\nT(?x, ?y) :- S(?x) .\n")?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("line 2, column 1"))
        .stderr(predicate::str::contains("`?y`"));

    rules.write_str("T(!y) :- S(?x) .\n")?;
    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("empty frontier"));

    dir.close()?;
    Ok(())
}

#[cfg_attr(miri, ignore)]
#[test]
fn step_limit_interrupts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rules = dir.child("rules.rls");
    rules.write_str(PROGRAM)?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path())
        .arg("--step-limit")
        .arg("0")
        .arg("--report")
        .arg("short");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("interrupted"))
        .stdout(predicate::str::contains("U(?x0) :- S(?x0) .").not());

    dir.close()?;
    Ok(())
}

#[cfg_attr(miri, ignore)]
#[test]
fn time_limit_interrupts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rules = dir.child("rules.rls");
    rules.write_str(PROGRAM)?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path())
        .arg("--time-limit")
        .arg("0")
        .arg("--report")
        .arg("short");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("interrupted"))
        .stdout(predicate::str::contains("U(?x0) :- T(?x0, ?x1) ."))
        .stdout(predicate::str::contains("U(?x0) :- S(?x0) .").not());

    cmd = Command::cargo_bin(BIN)?;
    cmd.arg(rules.path()).arg("--time-limit").arg("60000");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("U(?x0) :- S(?x0) ."));

    dir.close()?;
    Ok(())
}
