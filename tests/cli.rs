mod common;

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::{tempdir, TempDir};

use common::{is_empty_dir, mock_hub, write_session, HubScript, KEY};

/// Isolated home for one CLI run: session file, config path and staging dir.
struct CliEnv {
    dir: TempDir,
}

impl CliEnv {
    fn new() -> Self {
        let env = Self {
            dir: tempdir().unwrap(),
        };
        std::fs::create_dir_all(env.staging()).unwrap();
        env
    }

    fn session_file(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    fn staging(&self) -> PathBuf {
        self.dir.path().join("staging")
    }

    fn logged_in(self) -> Self {
        write_session(&self.session_file());
        self
    }

    fn cmd(&self, api_url: &str) -> Command {
        let mut cmd = Command::cargo_bin("skillhub").unwrap();
        cmd.current_dir(self.dir.path())
            .env("SKILLHUB_CONFIG", self.dir.path().join("config.toml"))
            .env("SKILLHUB_SESSION_FILE", self.session_file())
            .env("SKILLHUB_STAGING_DIR", self.staging())
            .env("SKILLHUB_API_URL", api_url)
            .env("SKILLHUB_WEB_URL", "https://hub.example")
            .env_remove("SKILLHUB_CONNECTION_KEY")
            .env_remove("RUST_LOG");
        cmd
    }

    fn offline(&self) -> Command {
        self.cmd("http://127.0.0.1:9")
    }
}

fn write_skill(root: &Path) -> PathBuf {
    let folder = root.join("weather");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(
        folder.join("handler.js"),
        "module.exports.runtime = { handler: async function () { return 'ok'; } };\n",
    )
    .unwrap();
    std::fs::write(
        folder.join("plugin.json"),
        r#"{
  "name": "weather",
  "version": "1.0.0",
  "description": "Looks up the weather",
  "license": "MIT",
  "examples": [{"prompt": "weather in Paris?", "call": "{\"city\":\"Paris\"}"}],
  "entrypoint": {"file": "handler.js", "params": {"city": {"type": "string"}}}
}"#,
    )
    .unwrap();
    folder
}

#[test]
fn test_cli_help() {
    CliEnv::new()
        .offline()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_cli_version() {
    CliEnv::new()
        .offline()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn upload_requires_login() {
    let env = CliEnv::new();
    let skill = write_skill(env.dir.path());

    env.offline()
        .args(["upload", "--type", "agent-skill", "--path"])
        .arg(&skill)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No connection key found - you will need to login first",
        ));
}

#[test]
fn robot_errors_are_json_on_stdout() {
    let env = CliEnv::new();
    let skill = write_skill(env.dir.path());

    let output = env
        .offline()
        .args(["--robot", "upload", "--type", "agent-skill", "--path"])
        .arg(&skill)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"]["error"]["code"], "SESSION_MISSING");
    assert!(json["data"].is_null());
}

#[test]
fn upload_rejects_missing_path() {
    let env = CliEnv::new().logged_in();

    env.offline()
        .args(["upload", "--type", "agent-skill", "--path", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "--path argument was provided but the path does not exist",
        ));
}

#[test]
fn upload_rejects_unknown_type() {
    CliEnv::new()
        .offline()
        .args(["upload", "--type", "workspace", "--path", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("agent-skill"));
}

#[test]
fn init_writes_template_once() {
    let env = CliEnv::new();
    let target = env.dir.path().join("my-skill");

    env.offline()
        .args(["init", "--type", "agent-skill", "--output"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("New agent-skill created"));
    assert!(target.join("handler.js").is_file());
    let manifest: Value =
        serde_json::from_str(&std::fs::read_to_string(target.join("plugin.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["entrypoint"]["file"], "handler.js");

    env.offline()
        .args(["init", "--type", "agent-skill", "--output"])
        .arg(&target)
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));
}

#[test]
fn init_dot_output_picks_a_folder_name() {
    let env = CliEnv::new();

    env.offline()
        .args(["init", "--type", "agent-skill", "--output", "."])
        .assert()
        .success()
        .stdout(predicate::str::contains("my-agent-skill-"));
}

#[test]
fn config_without_session() {
    CliEnv::new()
        .offline()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("No config file found"));
}

#[test]
fn config_shows_stored_session() {
    let env = CliEnv::new().logged_in();

    env.offline()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(KEY))
        .stdout(predicate::str::contains("http://127.0.0.1:9"));
}

#[test]
fn logout_removes_session() {
    let env = CliEnv::new().logged_in();

    env.offline()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully logged out!"));
    assert!(!env.session_file().exists());

    // Logging out twice is fine.
    env.offline().arg("logout").assert().success();
}

#[test]
fn login_stores_key_and_identity() {
    let server = MockServer::start();
    let mocks = mock_hub(&server, HubScript::default());
    let env = CliEnv::new();

    env.cmd(&server.base_url())
        .args(["login", "--connection-key", KEY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully logged in as @tim!"));

    mocks.auth.assert();
    let session: Value =
        serde_json::from_str(&std::fs::read_to_string(env.session_file()).unwrap()).unwrap();
    assert_eq!(session["connectionKey"], KEY);
    assert_eq!(session["userInfo"]["username"], "tim");
}

#[test]
fn login_with_bad_key_saves_nothing() {
    let server = MockServer::start();
    mock_hub(&server, HubScript::default());
    let env = CliEnv::new();

    env.cmd(&server.base_url())
        .args(["login", "--connection-key", "wrong-key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid connection key - could not authenticate",
        ));
    assert!(!env.session_file().exists());
}

#[test]
fn upload_end_to_end() {
    let server = MockServer::start();
    let mocks = mock_hub(&server, HubScript::default());
    let env = CliEnv::new().logged_in();
    let skill = write_skill(env.dir.path());

    env.cmd(&server.base_url())
        .args([
            "upload",
            "--type",
            "agent-skill",
            "--visibility",
            "public",
            "--yes",
            "--path",
        ])
        .arg(&skill)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://hub.example/i/agent-skill/abc123",
        ));

    mocks.auth.assert();
    mocks.prepare.assert();
    mocks.transfer.assert();
    mocks.finalize.assert();
    assert!(is_empty_dir(&env.staging()));
    // The source folder is never touched.
    assert!(!skill.join("abc123").exists());
}

#[test]
fn upload_robot_report() {
    let server = MockServer::start();
    mock_hub(&server, HubScript::default());
    let env = CliEnv::new().logged_in();
    let skill = write_skill(env.dir.path());

    let output = env
        .cmd(&server.base_url())
        .args([
            "--robot",
            "upload",
            "--type",
            "agent-skill",
            "--visibility",
            "private",
            "--yes",
            "--path",
        ])
        .arg(&skill)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["entity_id"], "abc123");
    assert_eq!(json["data"]["visibility"], "private");
    assert_eq!(json["data"]["file_count"], 2);
}

#[test]
fn upload_with_rejected_key_stops_before_prepare() {
    let server = MockServer::start();
    let mocks = mock_hub(
        &server,
        HubScript {
            auth: 401,
            ..HubScript::default()
        },
    );
    let env = CliEnv::new().logged_in();
    let skill = write_skill(env.dir.path());

    env.cmd(&server.base_url())
        .args(["upload", "--type", "agent-skill", "--yes", "--path"])
        .arg(&skill)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid connection key - could not authenticate.",
        ));
    assert_eq!(mocks.prepare.hits(), 0);
}

#[test]
fn upload_prepare_failure_leaves_no_build_dir() {
    let server = MockServer::start();
    let mocks = mock_hub(
        &server,
        HubScript {
            prepare: 500,
            ..HubScript::default()
        },
    );
    let env = CliEnv::new().logged_in();
    let skill = write_skill(env.dir.path());

    env.cmd(&server.base_url())
        .args([
            "upload",
            "--type",
            "agent-skill",
            "--visibility",
            "public",
            "--yes",
            "--path",
        ])
        .arg(&skill)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("500 - Internal Server Error"));

    assert_eq!(mocks.transfer.hits(), 0);
    assert!(is_empty_dir(&env.staging()));
}

#[test]
fn upload_transfer_failure_cleans_up() {
    let server = MockServer::start();
    mock_hub(
        &server,
        HubScript {
            transfer: 500,
            ..HubScript::default()
        },
    );
    let env = CliEnv::new().logged_in();
    let skill = write_skill(env.dir.path());

    env.cmd(&server.base_url())
        .args([
            "upload",
            "--type",
            "agent-skill",
            "--visibility",
            "public",
            "--yes",
            "--path",
        ])
        .arg(&skill)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error creating build directory: Failed to upload archive",
        ));

    assert!(is_empty_dir(&env.staging()));
}
