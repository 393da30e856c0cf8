mod common;

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestWorkspace, output_path};
use encoding_rs::WINDOWS_1252;
use predicates::str::contains;

const ISSUES: &str = "_issues.log";
const SCRIPT: &str = "_load.sql";

#[test]
fn clean_file_produces_load_script_only() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "orders.csv",
        "Order ID,Amount,Ordered At\n1,\"$1,250.50\",2024-01-05\n2,(30.25),2024-02-11\n3,-,2024-03-17\n",
    );

    cargo_bin_cmd!("loadprep")
        .args(["-f", input.to_str().unwrap(), "-d", ","])
        .assert()
        .success();

    assert!(!output_path(&input, ISSUES).exists());
    let script = workspace.read_output(&input, SCRIPT);
    assert!(script.contains("CREATE TABLE #SHELL ("));
    assert!(script.contains("\t[Order_ID]\tVARCHAR(1)"));
    assert!(script.contains("BULK INSERT #SHELL"));
    assert!(script.contains("FIELDTERMINATOR = ',',"));
    assert!(script.contains("--FORMAT = 'CSV',") || script.contains("\nFORMAT = 'CSV',"));
    assert!(script.contains("AS DECIMAL("));
    assert!(script.contains("AS DATE) AS [Ordered_At]"));
    assert!(script.contains("INTO #FORMAT"));
}

#[test]
fn structural_problems_halt_with_distinct_exit_code() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("ragged.csv", "a,b,c\n1,2,3\n4,5,6,7\n8,9,10\n");

    cargo_bin_cmd!("loadprep")
        .args(["-f", input.to_str().unwrap(), "-d", ","])
        .assert()
        .code(2)
        .stderr(contains("incorrect field counts"));

    let log = workspace.read_output(&input, ISSUES);
    let mut lines = log.lines();
    assert!(lines.next().unwrap().starts_with("\"Issue\",\"Line\""));
    assert_eq!(
        lines.next(),
        Some("\"Incorrect field count\",2,\"n/a\",\"4 fields instead of 3\",\"n/a\",\"n/a\",\"n/a\",\"n/a\"")
    );
    assert!(!output_path(&input, SCRIPT).exists());
}

#[test]
fn content_anomalies_still_generate_script() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", "id,name\n1,Zoë\n2,Bob\n");

    cargo_bin_cmd!("loadprep")
        .args(["-f", input.to_str().unwrap(), "-d", ","])
        .assert()
        .success();

    let log = workspace.read_output(&input, ISSUES);
    assert!(log.contains(
        "\"Non-printable or Control Character\",1,\"name\",2,\"Zoë\",\"ë\",\"LATIN SMALL LETTER E WITH DIAERESIS\",235"
    ));
    let script = workspace.read_output(&input, SCRIPT);
    assert!(script.contains("\t[name]\tNVARCHAR(3)"));
}

#[test]
fn tab_delimiter_is_normalized_and_kept_in_script() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("scores.tsv", "team\tscore\r\nred\t12\r\nblue\t7\r\n");

    cargo_bin_cmd!("loadprep")
        .args(["-f", input.to_str().unwrap(), "-d", "\\t"])
        .assert()
        .success();

    let script = workspace.read_output(&input, SCRIPT);
    assert!(script.contains("FIELDTERMINATOR = '\\t',"));
    assert!(script.contains("ROWTERMINATOR = '\\n'"));
    assert!(script.contains("CAST(NULLIF(RTRIM(LTRIM([score])),'') AS INT) AS [score]"));
}

#[test]
fn windows_1252_input_is_decoded() {
    let workspace = TestWorkspace::new();
    let (encoded, _, _) = WINDOWS_1252.encode("id,city\n1,Malm\u{f6}\n2,Oslo\n");
    let input = workspace.write_bytes("cities.csv", &encoded);

    cargo_bin_cmd!("loadprep")
        .args(["-f", input.to_str().unwrap(), "-d", ","])
        .assert()
        .success()
        .stderr(contains("windows-1252"));

    let log = workspace.read_output(&input, ISSUES);
    assert!(log.contains("\"Malmö\""));
}

#[test]
fn output_directory_and_profile_export() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("ratios.csv", "label,ratio\nx,0.125\ny,12.5\n");
    let out_dir = workspace.path().join("out");
    fs::create_dir(&out_dir).expect("create out dir");
    let profile_path = workspace.path().join("ratios-profile.json");

    cargo_bin_cmd!("loadprep")
        .args([
            "-f",
            input.to_str().unwrap(),
            "-d",
            ",",
            "-o",
            out_dir.to_str().unwrap(),
            "--profile",
            profile_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(out_dir.join("ratios.csv_load.sql").exists());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&profile_path).expect("read profile"))
            .expect("parse profile");
    assert_eq!(json["encoding"], "UTF-8");
    assert_eq!(json["fields"][1]["name"], "ratio");
    assert_eq!(json["fields"][1]["type"], "FLOAT");
    assert_eq!(json["fields"][1]["whole_digits"], 2);
    assert_eq!(json["fields"][1]["fraction_digits"], 3);
}

#[test]
fn yaml_profile_lists_fields() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("ids.csv", "id,code\n1,007\n2,008\n");
    let profile_path = workspace.path().join("ids.yml");

    cargo_bin_cmd!("loadprep")
        .args([
            "-f",
            input.to_str().unwrap(),
            "-d",
            ",",
            "--profile",
            profile_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(&profile_path).expect("read profile"))
            .expect("parse profile");
    assert_eq!(yaml["fields"][0]["type"].as_str(), Some("INT"));
    assert_eq!(yaml["fields"][1]["type"].as_str(), Some("TEXT"));
}

#[test]
fn missing_input_reports_error() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("absent.csv");
    cargo_bin_cmd!("loadprep")
        .args(["-f", missing.to_str().unwrap(), "-d", ","])
        .assert()
        .code(1)
        .stderr(contains("error:"));
}

#[test]
fn float_without_digit_envelope_fails_before_writing_outputs() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("overflow.csv", "x\n1e999\n");

    cargo_bin_cmd!("loadprep")
        .args(["-f", input.to_str().unwrap(), "-d", ","])
        .assert()
        .code(1)
        .stderr(contains("Field 'x' is typed FLOAT"));

    assert!(!output_path(&input, SCRIPT).exists());
    assert!(!output_path(&input, ISSUES).exists());
}

#[test]
fn header_narrower_than_data_halts() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("short_header.csv", "a,b\n1,2,3\n4,5,6\n");

    cargo_bin_cmd!("loadprep")
        .args(["-f", input.to_str().unwrap(), "-d", ","])
        .assert()
        .code(2);

    let log = workspace.read_output(&input, ISSUES);
    assert!(log.contains("\"Incorrect field count\",0,\"n/a\",\"2 fields instead of 3\""));
    assert!(!output_path(&input, SCRIPT).exists());
}

#[test]
fn skipping_character_check_keeps_unicode_and_line_break_handling() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("notes.csv", "id,name\n1,Zoë\n2,\"a\nb\"\n");

    cargo_bin_cmd!("loadprep")
        .args(["-f", input.to_str().unwrap(), "-d", ",", "--skip-char-check"])
        .assert()
        .success();

    assert!(!output_path(&input, ISSUES).exists());
    let script = workspace.read_output(&input, SCRIPT);
    assert!(script.contains("\t[name]\tNVARCHAR(3)"));
    assert!(script.contains("REPLACE(REPLACE([name],CHAR(10),''),CHAR(13),'')"));
}
