use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Temp workspace with an empty config so the user's own config is never read.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("fieldfill").unwrap();
        cmd.arg("-c").arg(self.path("config.json"));
        cmd
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_detect_plain_text() {
    let ws = Workspace::new();
    let input = ws.write("contract.txt", "ФИО: ___________\nДата: {{date}}");

    ws.cmd()
        .args(["detect", arg(&input), "--no-semantic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"fio_marker\""))
        .stdout(predicate::str::contains("\"field_name\": \"full_name\""))
        .stdout(predicate::str::contains("\"field_name\": \"date\""));
}

#[test]
fn test_detect_csv_to_file() {
    let ws = Workspace::new();
    let input = ws.write(
        "form.json",
        r#"{"kind": "word_processor", "paragraphs": ["Подпись: ______"], "tables": []}"#,
    );
    let output = ws.path("fields.csv");

    ws.cmd()
        .args(["detect", arg(&input), "-f", "csv", "-o", arg(&output)])
        .assert()
        .success()
        .stdout(predicate::str::contains("written to"));

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("type,field_name,location,start,end,text,context_before,context_after"));
    assert!(csv.contains("signature_marker,signature,paragraph 0,0,7,Подпись"));
}

#[test]
fn test_map_rule_based() {
    let ws = Workspace::new();
    let input = ws.write("contract.txt", "ФИО: ___________");
    let data = ws.write("data.json", r#"{"full_name": "Иванов И.И."}"#);

    ws.cmd()
        .args(["map", arg(&input), "--data", arg(&data), "--no-semantic", "-f", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(rule_based)"))
        .stdout(predicate::str::contains("Иванов И.И."));
}

#[test]
fn test_map_rejects_non_object_data() {
    let ws = Workspace::new();
    let input = ws.write("contract.txt", "ФИО: ___________");
    let data = ws.write("data.json", r#"["not", "an", "object"]"#);

    ws.cmd()
        .args(["map", arg(&input), "--data", arg(&data)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a JSON object"));
}

#[test]
fn test_unsupported_format() {
    let ws = Workspace::new();
    let input = ws.write("legacy.doc", "binary");

    ws.cmd()
        .args(["detect", arg(&input)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported document format"));
}

#[test]
fn test_batch_with_summary() {
    let ws = Workspace::new();
    ws.write("a.txt", "Дата: {{date}}");
    ws.write("b.txt", "Должность: ______");
    ws.write("broken.json", "{not json");
    let data = ws.write("data.json", r#"{"date": "2025-11-08"}"#);
    let out = ws.path("out");
    let pattern = format!("{}/*.txt", ws.dir.path().display());

    ws.cmd()
        .args(["batch", &pattern, "--data", arg(&data), "--summary", "--no-semantic"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines[0], "file,fields,resolved,strategy,error");
    assert_eq!(lines[1], "a.txt,3,3,rule_based,");
    assert!(lines[2].starts_with("b.txt,"));

    let report = fs::read_to_string(out.join("a.txt.json")).unwrap();
    assert!(report.contains("\"strategy\": \"rule_based\""));
    assert!(report.contains("\"processed_at\""));
}

#[test]
fn test_batch_same_stem_gets_separate_reports() {
    let ws = Workspace::new();
    ws.write("a.txt", "Дата: {{date}}");
    ws.write("a.json", r#"{"kind": "word_processor", "paragraphs": ["ИНН: ______"]}"#);
    let data = ws.write("data.json", r#"{"date": "2025-11-08", "inn": "7701234567"}"#);
    let out = ws.path("out");
    let pattern = format!("{}/a.*", ws.dir.path().display());

    ws.cmd()
        .args(["batch", &pattern, "--data", arg(&data), "--no-semantic"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    let text_report = fs::read_to_string(out.join("a.txt.json")).unwrap();
    let dump_report = fs::read_to_string(out.join("a.json.json")).unwrap();
    assert!(text_report.contains("a.txt"));
    assert!(text_report.contains("2025-11-08"));
    assert!(dump_report.contains("a.json"));
    assert!(dump_report.contains("7701234567"));
}

#[test]
fn test_batch_stops_on_error_unless_asked() {
    let ws = Workspace::new();
    ws.write("good.json", r#"{"kind": "word_processor", "paragraphs": ["ИНН: ______"]}"#);
    ws.write("bad.json", "{not json");
    let data = ws.write("data.txt", r#"{"inn": "7701234567"}"#);
    let pattern = format!("{}/*.json", ws.dir.path().display());

    // config.json is not a structure dump either
    ws.cmd()
        .args(["batch", &pattern, "--data", arg(&data)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));

    ws.cmd()
        .args(["batch", &pattern, "--data", arg(&data), "--continue-on-error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 2 failed"));
}

#[test]
fn test_patterns_lists_catalog() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("patterns")
        .assert()
        .success()
        .stdout(predicate::str::contains("long_underscore"))
        .stdout(predicate::str::contains("marker -> full_name"))
        .stdout(predicate::str::contains("14 patterns"));
}

#[test]
fn test_config_set_and_get() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["config", "set", "detection.inference_window", "80"])
        .assert()
        .success();

    ws.cmd()
        .args(["config", "get", "detection.inference_window"])
        .assert()
        .success()
        .stdout(predicate::str::contains("80"));

    ws.cmd()
        .args(["config", "set", "detection.inference_window", "wide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}
