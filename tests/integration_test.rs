use std::process::Command;
use tempfile::TempDir;

fn scrip_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scrip"));
    cmd.env_remove("SCRIP_DATA_DIR").env_remove("RUST_LOG");
    cmd
}

fn init(tmp: &TempDir) {
    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["init"])
        .output()
        .unwrap();
    assert!(output.status.success());
}

fn add(tmp: &TempDir, name: &str) -> String {
    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args([
            "add",
            name,
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_init_creates_scrip_directory() {
    let tmp = TempDir::new().unwrap();

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["init"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(tmp.path().join(".scrip").exists());
    assert!(tmp.path().join(".scrip/main.db").exists());
    assert!(tmp.path().join(".scrip/config.yaml").exists());
}

#[test]
fn test_init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["init"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Already initialized"));
}

#[test]
fn test_add_without_init_fails() {
    let tmp = TempDir::new().unwrap();

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["add", "Read", "--start", "2024-01-01", "--end", "2024-01-31"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Run 'scrip init' first"));
}

#[test]
fn test_full_scrip_workflow() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    let stdout = add(&tmp, "Read");
    assert!(stdout.contains("001"));
    assert!(stdout.contains("Read"));

    let stdout = add(&tmp, "Run");
    assert!(stdout.contains("002"));

    // Newest first
    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let run = stdout.find("Run").unwrap();
    let read = stdout.find("Read").unwrap();
    assert!(run < read);
    assert!(stdout.contains("2024-01-01 - 2024-01-31"));

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["get", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"name\": \"Read\""));
    assert!(stdout.contains("\"type\""));
}

#[test]
fn test_list_json_output() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    add(&tmp, "Read");

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["list", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let scrips: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list --json should be valid JSON");
    let scrips = scrips.as_array().unwrap();
    assert_eq!(scrips.len(), 1);
    assert_eq!(scrips[0]["id"], 1);
    assert_eq!(scrips[0]["type"][0], "daily");
}

#[test]
fn test_edit_scrip() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    add(&tmp, "Read");

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["edit", "1", "--name", "Read more", "--end", "2024-02-29"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["get", "1"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Read more"));
    assert!(stdout.contains("2024-01-01 - 2024-02-29"));
}

#[test]
fn test_mark_twice_toggles() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    add(&tmp, "Read");

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["mark", "1", "2024-01-05"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("marked"));
    assert!(stdout.contains("streak: 1 days"));

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["mark", "1", "2024-01-05"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unmarked"));
    assert!(stdout.contains("streak: 0 days"));
}

#[test]
fn test_note_on_marked_day() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    add(&tmp, "Read");

    scrip_cmd()
        .current_dir(tmp.path())
        .args(["mark", "1", "2024-01-05"])
        .output()
        .unwrap();

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["note", "1", "2024-01-05", "Chapter three"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Saved note"));

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["note", "1", "2024-01-05"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Chapter three"));

    // A day with a note stays marked
    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["mark", "1", "2024-01-05"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kept"));
    assert!(stdout.contains("streak: 1 days"));
}

#[test]
fn test_note_on_unmarked_day_fails() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    add(&tmp, "Read");

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["note", "1", "2024-01-05", "Too early"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not marked"));
}

#[test]
fn test_delete_scrip_with_force() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    add(&tmp, "To Be Deleted");

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["delete", "1", "--force"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted"));

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["list"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No scrips found"));
}

#[test]
fn test_delete_nonexistent_fails() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["delete", "999", "--force"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Scrip not found"));
}

#[test]
fn test_export_then_import_restores_rows() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    add(&tmp, "Read");
    add(&tmp, "Run");
    let export = tmp.path().join("backup.json");

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["export", "-o"])
        .arg(&export)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(export.exists());

    scrip_cmd()
        .current_dir(tmp.path())
        .args(["delete", "2", "--force"])
        .output()
        .unwrap();
    add(&tmp, "Swim");

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["import", "-i"])
        .arg(&export)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Imported 2 scrips"));

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["list", "--json"])
        .output()
        .unwrap();
    let scrips: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = scrips
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Run", "Read"]);
    assert_eq!(scrips[0]["id"], 2);
}

#[test]
fn test_import_without_tty_is_cancelled() {
    let tmp = TempDir::new().unwrap();
    init(&tmp);
    add(&tmp, "Read");

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["import"])
        .stdin(std::process::Stdio::null())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Import cancelled"));

    let output = scrip_cmd()
        .current_dir(tmp.path())
        .args(["list"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Read"));
}
