use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

struct Fixture {
    tmp: TempDir,
    data_dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempdir().expect("tempdir");
        let data_dir = tmp.path().join("data");
        fs::create_dir_all(&data_dir).expect("mkdir data");
        Self { tmp, data_dir }
    }

    fn file(&self, id: u32) -> PathBuf {
        self.data_dir.join(format!("hexagram_{id:02}.json"))
    }

    fn logs_dir(&self) -> PathBuf {
        self.tmp.path().join("logs")
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("haqei-fix");
        cmd.current_dir(self.tmp.path())
            .env("HAQEI_HOME", self.tmp.path().join("home"))
            .env("HAQEI_CONFIG_PATH", self.tmp.path().join("missing.toml"))
            .env("HAQEI_DATA_DIR", &self.data_dir)
            .env("HAQEI_LOGS_DIR", self.logs_dir());
        cmd
    }
}

fn object(hexagram_id: u32, ids: &[i64]) -> String {
    let entries = ids
        .iter()
        .map(|id| format!("      {{ \"interface_id\": {id}, \"組合せ\": \"内{id}外{id}\" }}"))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "{{\n  \"hexagram_id\": {hexagram_id},\n  \"name_jp\": \"乾為天\",\n  \"internal_team_analysis\": {{\n    \"interface_combinations\": [\n{entries}\n    ]\n  }}\n}}\n"
    )
}

fn interface_ids(path: &Path) -> Vec<i64> {
    let raw = fs::read_to_string(path).expect("read");
    let value: Value = serde_json::from_str(&raw).expect("valid json");
    value["internal_team_analysis"]["interface_combinations"]
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["interface_id"].as_i64().expect("id"))
        .collect()
}

#[test]
fn single_valid_file_is_reported_already_valid() {
    let fx = Fixture::new();
    let original = object(1, &[1, 2, 3]);
    fs::write(fx.file(1), &original).expect("write");

    fx.cmd()
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("already valid (3 entries)"));

    assert_eq!(fs::read_to_string(fx.file(1)).expect("read"), original);
}

#[test]
fn concatenated_objects_are_merged_in_id_order() {
    let fx = Fixture::new();
    let original = format!("{}{}", object(2, &[3, 1]), object(2, &[2, 4]));
    fs::write(fx.file(2), &original).expect("write");

    fx.cmd()
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("merged 2 blocks into 4 entries"));

    assert_eq!(interface_ids(&fx.file(2)), vec![1, 2, 3, 4]);
    let merged = fs::read_to_string(fx.file(2)).expect("read");
    assert!(merged.contains("\"name_jp\": \"乾為天\""));
    assert_eq!(
        fs::read_to_string(fx.data_dir.join("hexagram_02.json.backup")).expect("backup"),
        original
    );

    fx.cmd()
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("already valid (4 entries)"));
    assert_eq!(fs::read_to_string(fx.file(2)).expect("read"), merged);

    let audit = fs::read_to_string(fx.logs_dir().join("audit.log")).expect("audit log");
    assert_eq!(audit.lines().count(), 2);
}

#[test]
fn malformed_block_fails_and_leaves_file_unchanged() {
    let fx = Fixture::new();
    let broken = object(3, &[2]).replace("\"内2外2\"", "\"内2外2");
    let original = format!("{}{}", object(3, &[1]), broken);
    fs::write(fx.file(3), &original).expect("write");

    fx.cmd()
        .arg("3")
        .assert()
        .failure()
        .stdout(predicate::str::contains("E002_PARSE"))
        .stdout(predicate::str::contains("block 2 line"))
        .stdout(predicate::str::contains(">>"))
        .stderr(predicate::str::contains("HAQEI_WARN code=E002_PARSE"));

    assert_eq!(fs::read_to_string(fx.file(3)).expect("read"), original);
}

#[test]
fn out_of_range_ids_are_rejected_without_touching_files() {
    let fx = Fixture::new();
    for id in ["0", "65"] {
        fx.cmd()
            .arg(id)
            .assert()
            .failure()
            .stdout(predicate::str::contains("E007_ID_RANGE"));
    }
    assert!(!fx.logs_dir().exists());
}

#[test]
fn non_integer_argument_is_a_usage_error() {
    let fx = Fixture::new();
    fx.cmd().arg("qian").assert().code(2);
    assert!(!fx.logs_dir().exists());
}

#[test]
fn batch_mode_counts_successes_and_errors() {
    let fx = Fixture::new();
    fs::write(fx.file(1), object(1, &[1])).expect("write 1");
    fs::write(
        fx.file(64),
        format!("{}{}", object(64, &[9]), object(64, &[8])),
    )
    .expect("write 64");

    fx.cmd()
        .assert()
        .failure()
        .stdout(predicate::str::contains("summary: success=2 errors=62"));

    assert_eq!(interface_ids(&fx.file(64)), vec![8, 9]);
}

#[test]
fn batch_mode_with_every_file_valid_exits_cleanly() {
    let fx = Fixture::new();
    for id in 1..=3 {
        fs::write(fx.file(id), object(id, &[i64::from(id)])).expect("write");
    }

    fx.cmd()
        .env("HAQEI_ID_MAX", "3")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ok\": true"))
        .stdout(predicate::str::contains("summary: success=3 errors=0"));
}

#[test]
fn dry_run_and_depth_strategy_leave_disk_untouched() {
    let fx = Fixture::new();
    let original = "{\"hexagram_id\": 5, \"internal_team_analysis\": {\"interface_combinations\": [{\"interface_id\": 2}]}}{\"hexagram_id\": 5, \"internal_team_analysis\": {\"interface_combinations\": [{\"interface_id\": 1}]}}\n";
    fs::write(fx.file(5), original).expect("write");

    fx.cmd()
        .args(["5", "--dry-run", "--strategy", "depth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run: would merge 2 blocks into 2 entries"));

    assert_eq!(fs::read_to_string(fx.file(5)).expect("read"), original);
    assert!(!fx.data_dir.join("hexagram_05.json.backup").exists());
}
