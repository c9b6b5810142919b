use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("shopfront"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--log-level"));

    Ok(())
}

#[test]
fn test_cli_rejects_invalid_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("shopfront.toml");
    std::fs::write(&path, "[pricing]\nvip_discount_percent = 101\n")?;

    let mut cmd = Command::new(cargo_bin!("shopfront"));
    cmd.arg("--config").arg(&path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("discount"));

    Ok(())
}

#[test]
fn test_cli_missing_config_file() {
    let mut cmd = Command::new(cargo_bin!("shopfront"));
    cmd.arg("--config").arg("does-not-exist.toml");

    cmd.assert().failure();
}
