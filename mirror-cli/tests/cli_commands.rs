use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, SystemTime};

use assert_cmd::prelude::*;
use filetime::{set_file_mtime, FileTime};
use predicates::prelude::*;
use tempfile::TempDir;

fn mirror_cmd(workdir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mirror"));
    cmd.current_dir(workdir).env("NO_COLOR", "1");
    cmd
}

fn set_age(path: &Path, secs_ago: u64) {
    let when = SystemTime::now() - Duration::from_secs(secs_ago);
    set_file_mtime(path, FileTime::from_system_time(when)).expect("set mtime");
}

#[test]
fn sync_copies_source_into_replica() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    let replica = tmp.path().join("dst");
    fs::create_dir_all(source.join("docs")).unwrap();
    fs::write(source.join("a.txt"), "alpha").unwrap();
    fs::write(source.join("docs").join("readme.md"), "hello").unwrap();

    mirror_cmd(tmp.path())
        .arg("sync")
        .arg(&source)
        .arg(&replica)
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("docs"));

    assert_eq!(fs::read_to_string(replica.join("a.txt")).unwrap(), "alpha");
    assert_eq!(
        fs::read_to_string(replica.join("docs").join("readme.md")).unwrap(),
        "hello"
    );
    assert!(
        tmp.path().join("sync_log_file.txt").exists(),
        "default log file should be created in the working directory"
    );
}

#[test]
fn sync_removes_orphans_and_writes_log() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    let replica = tmp.path().join("dst");
    let log = tmp.path().join("logs").join("mirror.log");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&replica).unwrap();
    fs::write(replica.join("stale.txt"), "old").unwrap();

    mirror_cmd(tmp.path())
        .args(["sync", "--log"])
        .arg(&log)
        .arg(&source)
        .arg(&replica)
        .assert()
        .success();

    assert!(!replica.join("stale.txt").exists());
    let logged = fs::read_to_string(&log).unwrap();
    assert!(
        logged.contains("Deleted file stale.txt from replica folder."),
        "log was: {logged}"
    );
}

#[test]
fn dry_run_reports_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    let replica = tmp.path().join("dst");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("new.txt"), "fresh").unwrap();

    mirror_cmd(tmp.path())
        .args(["sync", "--dry-run"])
        .arg(&source)
        .arg(&replica)
        .assert()
        .success()
        .stdout(predicate::str::contains("[dry-run]"))
        .stdout(predicate::str::contains("new.txt"));

    assert!(!replica.exists(), "dry-run must not create the replica root");
}

#[test]
fn sync_json_reports_stats_and_entries() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    let replica = tmp.path().join("dst");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&replica).unwrap();
    fs::write(source.join("same.txt"), "s").unwrap();
    fs::write(replica.join("same.txt"), "s").unwrap();
    set_age(&source.join("same.txt"), 300);
    set_age(&replica.join("same.txt"), 300);
    fs::write(source.join("new.txt"), "n").unwrap();

    let assert = mirror_cmd(tmp.path())
        .args(["sync", "--json"])
        .arg(&source)
        .arg(&replica)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("stdout utf8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(json["dry_run"], false);
    assert_eq!(json["stats"]["created"], 1);
    assert_eq!(json["stats"]["up_to_date"], 1);
    assert_eq!(json["stats"]["failed"], 0);

    let entries = json["entries"].as_array().expect("entries array");
    let new = entries
        .iter()
        .find(|e| e["name"] == "new.txt")
        .expect("new.txt entry");
    assert_eq!(new["action"], "create");
    assert_eq!(new["outcome"], "applied");
    assert_eq!(new["kind"], "file");
}

#[test]
fn status_json_previews_without_touching_roots() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    let replica = tmp.path().join("dst");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(&replica).unwrap();
    fs::write(source.join("doc.txt"), "v2").unwrap();
    fs::write(replica.join("doc.txt"), "v1").unwrap();
    set_age(&replica.join("doc.txt"), 600);
    fs::write(replica.join("orphan.txt"), "x").unwrap();

    let assert = mirror_cmd(tmp.path())
        .args(["status", "--json"])
        .arg(&source)
        .arg(&replica)
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("stdout utf8");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(json["pending"], 2);
    let entries = json["entries"].as_array().expect("entries array");
    let action = |name: &str| {
        entries
            .iter()
            .find(|e| e["name"] == name)
            .map(|e| e["action"].clone())
            .unwrap_or_default()
    };
    assert_eq!(action("doc.txt"), "update");
    assert_eq!(action("orphan.txt"), "delete");

    assert_eq!(fs::read_to_string(replica.join("doc.txt")).unwrap(), "v1");
    assert!(replica.join("orphan.txt").exists());
}

#[test]
fn status_table_lists_entries() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    let replica = tmp.path().join("dst");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("only-here.txt"), "x").unwrap();

    mirror_cmd(tmp.path())
        .arg("status")
        .arg(&source)
        .arg(&replica)
        .assert()
        .success()
        .stdout(predicate::str::contains("only-here.txt"))
        .stdout(predicate::str::contains("CREATE"))
        .stdout(predicate::str::contains("mirror sync"));
}

#[test]
fn config_file_supplies_roots() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    let replica = tmp.path().join("dst");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("cfg.txt"), "from config").unwrap();

    let config = tmp.path().join("mirror.yaml");
    fs::write(
        &config,
        format!(
            "source: {}\nreplica: {}\n",
            source.display(),
            replica.display()
        ),
    )
    .unwrap();

    mirror_cmd(tmp.path())
        .args(["sync", "--config"])
        .arg(&config)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(replica.join("cfg.txt")).unwrap(),
        "from config"
    );
}

#[test]
fn overlapping_roots_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    fs::create_dir_all(&source).unwrap();

    mirror_cmd(tmp.path())
        .arg("sync")
        .arg(&source)
        .arg(source.join("inner"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid mirror configuration"));

    assert!(!source.join("inner").exists());
}

#[test]
fn missing_replica_argument_is_rejected() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src")).unwrap();

    mirror_cmd(tmp.path())
        .args(["sync", "src"])
        .assert()
        .failure();
}

#[test]
fn run_rejects_zero_interval() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("src");
    fs::create_dir_all(&source).unwrap();

    mirror_cmd(tmp.path())
        .args(["run", "--interval", "0"])
        .arg(&source)
        .arg(tmp.path().join("dst"))
        .assert()
        .failure();

    assert!(!tmp.path().join("dst").exists());
}
