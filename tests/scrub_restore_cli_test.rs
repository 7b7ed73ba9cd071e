use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn haqei_fix(root: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("haqei-fix");
    cmd.current_dir(root)
        .env("HAQEI_HOME", root.join("home"))
        .env("HAQEI_CONFIG_PATH", root.join("missing.toml"))
        .env("HAQEI_DATA_DIR", root.join("data"))
        .env("HAQEI_LOGS_DIR", root.join("logs"));
    cmd
}

#[test]
fn scrub_removes_stray_characters_and_keeps_backup() {
    let tmp = tempdir().expect("tempdir");
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).expect("mkdir");
    let file = data.join("hexagram_11.json");
    let original = "\u{feff}{\"hexagram_id\": 11, \"name\": \"地天泰\u{200b}\",}\n";
    fs::write(&file, original).expect("write");

    haqei_fix(tmp.path())
        .args(["scrub", "11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("re-serialized from JSON5"));

    let cleaned = fs::read_to_string(&file).expect("read");
    let value: serde_json::Value = serde_json::from_str(&cleaned).expect("strict json");
    assert_eq!(value["name"], "地天泰");
    assert_eq!(
        fs::read_to_string(data.join("hexagram_11.json.backup")).expect("backup"),
        original
    );
}

#[test]
fn restore_puts_backup_back() {
    let tmp = tempdir().expect("tempdir");
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).expect("mkdir");
    fs::write(data.join("hexagram_12.json"), "{\"after\": true}\n").expect("write");
    fs::write(data.join("hexagram_12.json.backup"), "{\"before\": true}\n").expect("write");

    haqei_fix(tmp.path())
        .args(["restore", "12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("restored 17 bytes from backup"));

    assert_eq!(
        fs::read_to_string(data.join("hexagram_12.json")).expect("read"),
        "{\"before\": true}\n"
    );
}

#[test]
fn restore_without_backup_fails() {
    let tmp = tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("data")).expect("mkdir");

    haqei_fix(tmp.path())
        .args(["restore", "13"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("E003_BACKUP"));
}

#[test]
fn status_lists_resolved_layout() {
    let tmp = tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("data")).expect("mkdir");

    haqei_fix(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("hexagram_01.json..hexagram_64.json"))
        .stdout(predicate::str::contains(
            "merge_path=internal_team_analysis.interface_combinations",
        ))
        .stdout(predicate::str::contains("present_files=0 backups=0"));
}

#[test]
fn top_level_id_limits_scrub_to_that_file() {
    let tmp = tempdir().expect("tempdir");
    let data = tmp.path().join("data");
    fs::create_dir_all(&data).expect("mkdir");
    let dirty = "\u{feff}{\"hexagram_id\": 3}\n";
    fs::write(data.join("hexagram_03.json"), dirty).expect("write 3");
    fs::write(data.join("hexagram_04.json"), dirty).expect("write 4");

    haqei_fix(tmp.path())
        .args(["3", "scrub"])
        .assert()
        .success()
        .stdout(predicate::str::contains("summary: success=1 errors=0"));

    assert!(!fs::read_to_string(data.join("hexagram_03.json"))
        .expect("read 3")
        .starts_with('\u{feff}'));
    assert_eq!(
        fs::read_to_string(data.join("hexagram_04.json")).expect("read 4"),
        dirty
    );
    assert!(!data.join("hexagram_04.json.backup").exists());
}

#[test]
fn top_level_id_before_status_is_a_usage_error() {
    let tmp = tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("data")).expect("mkdir");

    haqei_fix(tmp.path())
        .args(["3", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("pass it after the subcommand"));
}
