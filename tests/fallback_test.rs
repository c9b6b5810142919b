#![cfg(not(feature = "storage-rocksdb"))]

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_db_path_requires_rocksdb_feature() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ledger_db");

    let mut cmd = Command::new(cargo_bin!("shopfront"));
    cmd.arg("--db-path").arg(&db_path).arg("--bind").arg("127.0.0.1:0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("requires the storage-rocksdb feature"));
}
