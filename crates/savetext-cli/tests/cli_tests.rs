mod common;

use common::{TestFixture, closed, opened, saved, ts};
use predicates::prelude::*;
use savetext_types::Title;

#[test]
fn test_titles_on_fresh_data_dir_creates_nothing() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("titles")
        .assert()
        .success()
        .stdout(predicate::str::contains("IdleCube"))
        .stdout(predicate::str::contains("Rhapsody ep.1 - Grave"))
        .stdout(predicate::str::contains("no store"));

    assert!(!fixture.data_dir().join("IdleCube.db").exists());
}

#[test]
fn test_load_then_browse_saves() {
    let fixture = TestFixture::new();
    let stream = fixture.write_stream(
        "session.jsonl",
        &[
            opened("output_log_1.txt", 1_700_000_000),
            saved(Title::IdleCube, 1_700_000_050, "cube-save-1"),
            saved(Title::IdleCube, 1_700_000_090, "cube-save-2"),
            closed("output_log_1.txt", 1_700_000_000, 1_700_000_500),
        ],
    );

    fixture
        .command()
        .arg("load")
        .arg(&stream)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 1 of 1 file(s), 2 save(s)"));

    assert!(fixture.data_dir().join("IdleCube.db").exists());
    assert!(!fixture.data_dir().join("IdleHome.db").exists());

    fixture
        .command()
        .args(["files", "--title", "idle-cube"])
        .assert()
        .success()
        .stdout(predicate::str::contains("output_log_1.txt"));

    let output = fixture
        .command()
        .args(["--format", "json", "saves", "--title", "IdleCube"])
        .args(["--file", "output_log_1.txt"])
        .output()
        .expect("Failed to run saves");
    assert!(output.status.success());
    let timestamps: Vec<chrono::DateTime<chrono::Utc>> =
        serde_json::from_slice(&output.stdout).expect("Parse failed");
    assert_eq!(timestamps, vec![ts(1_700_000_090), ts(1_700_000_050)]);

    fixture
        .command()
        .args(["show", "--title", "IdleCube", "--at", "1700000050"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cube-save-1"));
}

#[test]
fn test_load_uses_configured_log_dir() {
    let fixture = TestFixture::new();
    fixture.write_stream(
        "a.jsonl",
        &[opened("log_a.txt", 1000), saved(Title::IdleHome, 1010, "home")],
    );
    fixture.write_stream(
        "b.jsonl",
        &[opened("log_b.txt", 2000), saved(Title::IdleHome, 2010, "home2")],
    );

    fixture
        .command()
        .args(["config", "set-log-dir"])
        .arg(fixture.log_dir())
        .assert()
        .success();

    fixture
        .command()
        .arg("load")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/2] a.jsonl"))
        .stdout(predicate::str::contains("[2/2] b.jsonl"))
        .stdout(predicate::str::contains("Updated: Idle Home"));
}

#[test]
fn test_load_without_files_or_log_dir_fails() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("load")
        .assert()
        .failure()
        .stderr(predicate::str::contains("log_dir is not set"));
}

#[test]
fn test_failed_stream_fails_batch_but_keeps_other_files() {
    let fixture = TestFixture::new();
    let broken = fixture.log_dir().join("broken.jsonl");
    std::fs::write(&broken, "{ not json\n").expect("write");
    let good = fixture.write_stream(
        "good.jsonl",
        &[opened("log.txt", 1000), saved(Title::Rhapsody, 1010, "kept")],
    );

    fixture
        .command()
        .arg("load")
        .arg(&broken)
        .arg(&good)
        .assert()
        .failure()
        .stdout(predicate::str::contains("failed:"))
        .stderr(predicate::str::contains("1 of 2 files failed"));

    fixture
        .command()
        .args(["show", "--title", "rhapsody", "--at", "1970-01-01 00:16:50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kept"));
}

#[test]
fn test_show_missing_save_is_an_error() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["show", "--title", "IdleDefense", "--at", "2024-01-01T00:00:00Z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Idle Defense save"));

    assert!(!fixture.data_dir().join("IdleDefense.db").exists());
}

#[test]
fn test_unknown_title_is_rejected() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["files", "--title", "NotAGame"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --title"));
}

#[test]
fn test_config_set_editor_is_used_for_new_rows() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["config", "set-editor", "night-shift"])
        .assert()
        .success();

    let output = fixture
        .command()
        .args(["--format", "json", "config", "show"])
        .output()
        .expect("Failed to run config show");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Parse failed");
    assert_eq!(value["config"]["editor"], "night-shift");
}

#[test]
fn test_maintain_reports_each_title() {
    let fixture = TestFixture::new();
    let stream = fixture.write_stream(
        "session.jsonl",
        &[opened("log.txt", 1000), saved(Title::TerrorsOfNowhere, 1010, "x")],
    );
    fixture.command().arg("load").arg(&stream).assert().success();

    let output = fixture
        .command()
        .args(["--format", "json", "maintain"])
        .output()
        .expect("Failed to run maintain");
    assert!(output.status.success());

    let statuses: Vec<serde_json::Value> =
        serde_json::from_slice(&output.stdout).expect("Parse failed");
    assert_eq!(statuses.len(), Title::ALL.len());
    let maintained: Vec<_> = statuses
        .iter()
        .filter(|status| status["status"] == "maintained")
        .collect();
    assert_eq!(maintained.len(), 1);
    assert_eq!(maintained[0]["title"], "TerrorsOfNowhere");
}
