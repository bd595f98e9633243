use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::{json, Value};
use tempfile::TempDir;

struct Env {
    home: TempDir,
    work: TempDir,
}

impl Env {
    fn new(remote: Value) -> Self {
        let env = Self {
            home: TempDir::new().expect("home"),
            work: TempDir::new().expect("work"),
        };
        fs::write(env.remote_path(), remote.to_string()).expect("write fixture");
        env
    }

    fn remote_path(&self) -> PathBuf {
        self.work.path().join("remote.json")
    }

    fn remote(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(self.remote_path()).expect("read fixture"))
            .expect("fixture json")
    }

    fn remote_ids(&self, owner: &str) -> Vec<String> {
        self.remote()[owner]
            .as_array()
            .expect("owner entries")
            .iter()
            .map(|r| r["id"].as_str().expect("id").to_string())
            .collect()
    }

    fn declare(&self, name: &str, yaml: &str) -> PathBuf {
        let path = self.work.path().join(name);
        fs::write(&path, yaml).expect("write declaration");
        path
    }

    fn state_path(&self, owner: &str) -> PathBuf {
        self.home
            .path()
            .join(".tether")
            .join("state")
            .join(format!("{owner}.json"))
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tether"));
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("TETHER_TOKEN")
            .env_remove("RUST_LOG")
            .env("TETHER_REMOTE", self.remote_path());
        cmd
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf8 path")
}

const TWO_GROUPS: &str = "\
owner: app1
relations:
  - id: g1
    priority: 0
    profile: { role: admin }
  - id: g2
";

#[test]
fn apply_creates_relations_and_records_state() {
    let env = Env::new(json!({ "app1": [] }));
    let decl = env.declare("app1.yaml", TWO_GROUPS);

    env.cmd()
        .args(["apply", arg(&decl)])
        .assert()
        .success()
        .stdout(contains("'app1' reconciled (2 upserted, 0 deleted)"))
        .stdout(contains("g1"))
        .stdout(contains("g2"));

    assert_eq!(env.remote_ids("app1"), ["g1", "g2"]);
    assert_eq!(env.remote()["app1"][0]["profile"], json!({ "role": "admin" }));
    assert!(env.state_path("app1").exists());
}

#[test]
fn apply_json_reports_view_and_drift() {
    let env = Env::new(json!({
        "app1": [ { "id": "clickops", "priority": 7, "profile": { "role": "viewer" } } ]
    }));
    let decl = env.declare("app1.yaml", TWO_GROUPS);

    let assert = env
        .cmd()
        .args(["apply", arg(&decl), "--json"])
        .assert()
        .success();
    let out: Value = serde_json::from_slice(&assert.get_output().stdout).expect("json output");

    let ids: Vec<_> = out["view"]
        .as_array()
        .expect("view")
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["g1", "g2", "clickops"]);
    assert_eq!(out["drift"], json!(["clickops"]));
    assert_eq!(out["dry_run"], json!(false));
    assert_eq!(out["applied"][0], json!({ "op": "upserted", "target_id": "g1" }));
    assert!(
        out["view"][1].get("priority").is_none(),
        "unset priority must not be reported"
    );
}

#[test]
fn relations_dropped_from_declaration_are_deleted() {
    let env = Env::new(json!({ "app1": [] }));
    let first = env.declare("app1.yaml", TWO_GROUPS);
    env.cmd().args(["apply", arg(&first)]).assert().success();

    let second = env.declare("app1.yaml", "owner: app1\nrelations:\n  - id: g2\n");
    env.cmd()
        .args(["plan", arg(&second)])
        .assert()
        .success()
        .stdout(contains("Last applied"))
        .stdout(contains("1 delete(s), 1 upsert(s)"))
        .stdout(contains("-g1 priority=0"));

    env.cmd()
        .args(["apply", arg(&second)])
        .assert()
        .success()
        .stdout(contains("(1 upserted, 1 deleted)"));
    assert_eq!(env.remote_ids("app1"), ["g2"]);
}

#[test]
fn plan_without_previous_apply_creates_everything() {
    let env = Env::new(json!({ "app1": [] }));
    let decl = env.declare("app1.yaml", TWO_GROUPS);
    env.cmd()
        .args(["plan", arg(&decl)])
        .assert()
        .success()
        .stdout(contains("No previous apply recorded"))
        .stdout(contains("0 delete(s), 2 upsert(s)"));
}

#[test]
fn dry_run_changes_nothing() {
    let env = Env::new(json!({ "app1": [] }));
    let decl = env.declare("app1.yaml", TWO_GROUPS);

    env.cmd()
        .args(["apply", arg(&decl), "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"))
        .stdout(contains("missing:"));

    assert!(env.remote_ids("app1").is_empty());
    assert!(!env.state_path("app1").exists());
}

#[test]
fn read_reports_drift_without_writing() {
    let env = Env::new(json!({
        "app1": [ { "id": "clickops", "profile": "{\"role\":\"viewer\"}" } ]
    }));
    let before = fs::read_to_string(env.remote_path()).unwrap();
    let decl = env.declare("app1.yaml", "owner: app1\n");

    env.cmd()
        .args(["read", arg(&decl)])
        .assert()
        .success()
        .stdout(contains("clickops"))
        .stdout(contains("drift:"));

    assert_eq!(fs::read_to_string(env.remote_path()).unwrap(), before);
    assert!(!env.state_path("app1").exists());
}

#[test]
fn destroy_removes_relations_and_state() {
    let env = Env::new(json!({ "app1": [] }));
    let decl = env.declare("app1.yaml", TWO_GROUPS);
    env.cmd().args(["apply", arg(&decl)]).assert().success();

    env.cmd()
        .args(["destroy", arg(&decl)])
        .assert()
        .success()
        .stdout(contains("destroyed (2 relation(s))"));
    assert!(env.remote_ids("app1").is_empty());
    assert!(!env.state_path("app1").exists());

    env.cmd()
        .args(["destroy", arg(&decl)])
        .assert()
        .success()
        .stdout(contains("already absent"));
}

#[test]
fn unknown_owner_fails() {
    let env = Env::new(json!({ "other": [] }));
    let decl = env.declare("app1.yaml", TWO_GROUPS);
    env.cmd()
        .args(["read", arg(&decl)])
        .assert()
        .failure()
        .stderr(contains("owner 'app1' not found"));
}

#[test]
fn owner_deleted_remotely_forgets_stored_state() {
    let env = Env::new(json!({ "app1": [] }));
    let decl = env.declare("app1.yaml", TWO_GROUPS);
    env.cmd().args(["apply", arg(&decl)]).assert().success();
    assert!(env.state_path("app1").exists());

    fs::write(env.remote_path(), json!({ "other": [] }).to_string()).unwrap();
    env.cmd()
        .args(["read", arg(&decl)])
        .assert()
        .failure()
        .stderr(contains("owner 'app1' not found"));
    assert!(!env.state_path("app1").exists());
}

#[test]
fn invalid_declaration_fails_before_remote_is_touched() {
    let env = Env::new(json!({ "app1": [] }));
    let before = fs::read_to_string(env.remote_path()).unwrap();
    let decl = env.declare(
        "app1.yaml",
        "owner: app1\nrelations:\n  - id: g1\n  - id: g1\n",
    );

    env.cmd()
        .args(["apply", arg(&decl)])
        .assert()
        .failure()
        .stderr(contains("declared more than once"));
    assert_eq!(fs::read_to_string(env.remote_path()).unwrap(), before);
}

#[test]
fn missing_remote_is_reported() {
    let env = Env::new(json!({}));
    let decl = env.declare("app1.yaml", TWO_GROUPS);
    env.cmd()
        .env_remove("TETHER_REMOTE")
        .args(["apply", arg(&decl)])
        .assert()
        .failure()
        .stderr(contains("no remote configured"));
}

#[test]
fn home_flag_overrides_home_directory() {
    let env = Env::new(json!({ "app1": [] }));
    let other_home = TempDir::new().unwrap();
    let decl = env.declare("app1.yaml", TWO_GROUPS);

    env.cmd()
        .args(["--home", arg(other_home.path()), "apply", arg(&decl)])
        .assert()
        .success();
    assert!(other_home
        .path()
        .join(".tether/state/app1.json")
        .exists());
    assert!(!env.state_path("app1").exists());
}
