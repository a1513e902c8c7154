use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_lintworm")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

const STANDARD_HEADER: &str = "path,name,type,missing inputs,returns,found returns,yields,\
found yields,missing raises,missing parameters,basic comments,multiline comments,\
formatted multiline,documented";

// -- stdout reports --

#[test]
fn csv_report_on_stdout() {
    let assert = cmd()
        .args([&fixture_path("undocumented.py"), "--all"])
        .assert()
        .success();
    let output = stdout_of(&assert);
    let mut lines = output.lines();
    assert_eq!(lines.next(), Some(STANDARD_HEADER));
    let names: Vec<&str> = lines.map(|l| l.split(',').nth(1).unwrap()).collect();
    assert_eq!(names, vec!["undocumented.py", "greet", "Greeter", "__init__"]);
}

#[test]
fn documented_file_collapses_to_one_row() {
    let assert = cmd()
        .arg(fixture_path("documented.py"))
        .assert()
        .success();
    let output = stdout_of(&assert);
    assert_eq!(output.lines().count(), 2);
    assert!(output.lines().nth(1).unwrap().ends_with(",True"));
}

#[test]
fn all_reports_complete_definitions() {
    cmd()
        .args([&fixture_path("documented.py"), "--all", "-c", "name,found-returns,documented"])
        .assert()
        .success()
        .stdout("name,found returns,documented\ndocumented.py,0,True\ntest_function,2,True\n");
}

#[test]
fn json_report_on_stdout() {
    let assert = cmd()
        .args([&fixture_path("undocumented.py"), "--all", "-f", "json"])
        .assert()
        .success();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&stdout_of(&assert)).unwrap();
    assert_eq!(parsed.len(), 4);
    assert_eq!(parsed[1]["name"], "greet");
    assert_eq!(parsed[1]["type"], "function");
    assert_eq!(parsed[1]["missing inputs"], serde_json::json!(["name"]));
    assert_eq!(parsed[1]["documented"], false);
}

#[test]
fn text_report_lists_gaps_and_totals() {
    cmd()
        .args([&fixture_path("undocumented.py"), "--all", "-f", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains(": function greet: no docstring"))
        .stdout(predicate::str::contains("4 spans, 0 documented, 4 incomplete"));
}

#[test]
fn tabs_are_expanded_before_analysis() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tabs.py");
    fs::write(&path, "def f(a):\n\tif a:\n\t\treturn a\n\treturn None\n").unwrap();

    cmd()
        .args([path.to_str().unwrap(), "--all", "-c", "name,returns"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\nf,2\n"));
}

// -- exit status --

#[test]
fn check_fails_on_incomplete_files() {
    cmd()
        .args([&fixture_path("undocumented.py"), "--check"])
        .assert()
        .code(1);
}

#[test]
fn check_passes_on_documented_files() {
    cmd()
        .args([&fixture_path("documented.py"), "--check"])
        .assert()
        .success();
}

#[test]
fn invalid_grammar_is_fatal() {
    cmd()
        .args([&fixture_path("documented.py"), "-g", &fixture_path("bad_grammar.json")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("class template: `parameter_end`"));
}

#[test]
fn unknown_column_is_fatal() {
    cmd()
        .args([&fixture_path("documented.py"), "-c", "colour"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown column `colour`"));
}

#[test]
fn undecodable_file_does_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.py"), [0x78, 0x20, 0xff, 0xfe, 0x0a]).unwrap();
    fs::write(dir.path().join("good.py"), "x = 1\n").unwrap();

    let assert = cmd()
        .args([dir.path().to_str().unwrap(), "-c", "name,documented,warnings"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not valid UTF-8"));
    let output = stdout_of(&assert);
    let rows: Vec<&str> = output.lines().collect();
    assert_eq!(rows[1].split(',').take(2).collect::<Vec<_>>(), vec!["bad.py", "False"]);
    assert!(rows[1].contains("not valid UTF-8"));
    assert_eq!(rows[2], "good.py,True,");
}

#[test]
fn failed_file_is_reported_and_fails_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("deeper.py");
    fs::write(&path, format!("x = {}1{}\n", "(".repeat(300), ")".repeat(300))).unwrap();

    cmd()
        .args([path.to_str().unwrap(), "--check", "-f", "text"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(": file deeper.py: failed to analyse"))
        .stdout(predicate::str::contains("nesting deeper than 256 spans"))
        .stdout(predicate::str::contains("1 spans, 0 documented, 1 incomplete"));
}

// -- discovery --

#[test]
fn exclude_pattern_skips_files() {
    cmd()
        .args([&fixture_path("pkg"), "--all", "-x", "generated.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shapes.py"))
        .stdout(predicate::str::contains("__init__.py"))
        .stdout(predicate::str::contains("generated.py").not());
}

#[test]
fn exclude_file_skips_files() {
    let dir = TempDir::new().unwrap();
    let patterns = dir.path().join("exclude.txt");
    fs::write(&patterns, "# generated code\n*generated*\n\n__init__.py  # package marker\n").unwrap();

    cmd()
        .args([&fixture_path("pkg"), "-X", patterns.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("shapes.py"))
        .stdout(predicate::str::contains("generated.py").not())
        .stdout(predicate::str::contains("__init__.py").not());
}

#[test]
fn glob_inputs_are_expanded() {
    let pattern = format!("{}/*.py", fixture_path("pkg"));
    let assert = cmd().arg(&pattern).assert().success();
    let output = stdout_of(&assert);
    assert!(output.contains("generated.py"));
    assert!(output.contains("shapes.py"));
}

// -- report files --

#[test]
fn report_directory_gets_timestamped_file() {
    let dir = TempDir::new().unwrap();
    cmd()
        .args([&fixture_path("documented.py"), "-r", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("");

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("LintwormReport_"));
    assert!(names[0].ends_with(".csv"));
}

#[test]
fn report_merge_replaces_reanalysed_files() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.py");
    let b = dir.path().join("b.py");
    let undocumented = fs::read_to_string(fixture_path("undocumented.py")).unwrap();
    fs::write(&a, &undocumented).unwrap();
    fs::write(&b, &undocumented).unwrap();
    let report = dir.path().join("report.csv");

    cmd()
        .args([a.to_str().unwrap(), b.to_str().unwrap(), "--all"])
        .args(["-r", report.to_str().unwrap()])
        .assert()
        .success();
    let first = fs::read_to_string(&report).unwrap();
    assert_eq!(first.matches(",greet,").count(), 2);

    fs::write(&a, "x = 1\n").unwrap();
    cmd()
        .args([a.to_str().unwrap(), "--all", "-r", report.to_str().unwrap()])
        .assert()
        .success();
    let merged = fs::read_to_string(&report).unwrap();
    assert_eq!(merged.lines().next(), Some(STANDARD_HEADER));
    assert_eq!(merged.matches(",greet,").count(), 1);
    assert!(merged.lines().last().unwrap().contains(",a.py,file,"));
}

// -- change detection --

#[test]
fn hash_file_skips_unchanged_documented_files() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("hashes.json");
    let file = fixture_path("documented.py");

    cmd()
        .args([&file, "--hash-file", store.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("documented.py"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(saved[&file]["documented"], true);
    assert_eq!(saved[&file]["hash"].as_str().unwrap().len(), 64);

    cmd()
        .args([&file, "--hash-file", store.to_str().unwrap()])
        .assert()
        .success()
        .stdout(format!("{STANDARD_HEADER}\n"));
}

#[test]
fn hash_file_reanalyses_incomplete_files() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("hashes.json");
    let file = fixture_path("undocumented.py");

    for _ in 0..2 {
        cmd()
            .args([&file, "--hash-file", store.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("undocumented.py"));
    }
}
