//! Tests for the errcatctl binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const CATALOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ErrorLog>
  <Error>
    <ID>E001</ID>
    <Category>Scripting</Category>
    <Type>NullReference</Type>
    <Level>Error</Level>
    <UnityMessage>Object reference not set</UnityMessage>
    <SuggestedFix>Assign the field</SuggestedFix>
  </Error>
  <Error>
    <ID>E002</ID>
    <Category>Assets</Category>
    <Type>Import</Type>
    <Level>warning</Level>
    <UnityMessage>Texture size is not a power of two</UnityMessage>
    <SuggestedFix>Resize the texture</SuggestedFix>
    <AdditionalInfo>Affects mipmaps</AdditionalInfo>
  </Error>
</ErrorLog>
"#;

struct Fixture {
    dir: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new(catalog: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let catalog_path = dir.path().join("ErrorLog.xml");
        fs::write(&catalog_path, catalog).unwrap();

        let config = dir.path().join("config.toml");
        fs::write(
            &config,
            format!(
                "[source]\npath = {:?}\n",
                catalog_path.to_str().unwrap()
            ),
        )
        .unwrap();

        Self { dir, config }
    }

    fn run(&self, args: &[&str]) -> Output {
        errcatctl(&self.config, self.dir.path(), args)
    }
}

fn errcatctl(config: &Path, home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_errcatctl"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("ERRCAT_CONFIG")
        .env_remove("ERRCAT_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_show_prints_formatted_record() {
    let fixture = Fixture::new(CATALOG);
    for strategy in ["cached", "streaming"] {
        let output = fixture.run(&["--strategy", strategy, "show", "E002"]);
        assert_eq!(output.status.code(), Some(0));

        let text = stdout(&output);
        assert!(text.starts_with("[warning] ID: E002\n"), "{}", text);
        assert!(text.contains("Additional info: Affects mipmaps\n"));
    }
}

#[test]
fn test_show_missing_id_exits_not_found() {
    let fixture = Fixture::new(CATALOG);
    let output = fixture.run(&["show", "E404"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("E404"));
}

#[test]
fn test_level_json_is_case_insensitive() {
    let fixture = Fixture::new(CATALOG);
    let output = fixture.run(&["--json", "level", "WARNING"]);
    assert_eq!(output.status.code(), Some(0));

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], "E002");
    assert_eq!(records[0]["type"], "Import");
}

#[test]
fn test_exists_and_count() {
    let fixture = Fixture::new(CATALOG);

    assert_eq!(fixture.run(&["exists", "E001"]).status.code(), Some(0));
    assert_eq!(fixture.run(&["exists", "E003"]).status.code(), Some(2));

    let output = fixture.run(&["count"]);
    assert_eq!(stdout(&output).trim(), "2");
}

#[test]
fn test_levels_keep_raw_casing() {
    let fixture = Fixture::new(CATALOG);
    let output = fixture.run(&["levels"]);
    assert_eq!(stdout(&output), "Error\nwarning\n");
}

#[test]
fn test_report_json_lists_dispatched_messages() {
    let fixture = Fixture::new(CATALOG);
    let output = fixture.run(&["--json", "report", "E001"]);
    assert_eq!(output.status.code(), Some(0));

    let messages: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(messages[0]["severity"], "error");
    assert!(messages[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("[Error] ID: E001"));
}

#[test]
fn test_missing_catalog_counts_zero_but_show_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[source]\npath = \"/nonexistent/ErrorLog.xml\"\n").unwrap();

    let output = errcatctl(&config, dir.path(), &["count"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "0");

    let output = errcatctl(&config, dir.path(), &["show", "E001"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[ERROR]"));
}

#[test]
fn test_info_reports_cache_state() {
    let fixture = Fixture::new(CATALOG);
    let output = fixture.run(&["--json", "info"]);
    assert_eq!(output.status.code(), Some(0));

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["strategy"], "cached");
    assert_eq!(info["ttl_secs"], 30);
    assert_eq!(info["records"], 2);
    assert_eq!(info["cache"]["loads"], 1);
    assert!(info["loaded_at"].as_str().unwrap().ends_with('Z'));
}
