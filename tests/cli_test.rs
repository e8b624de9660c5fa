use assert_cmd::Command;
use assert_cmd::cargo_bin;
use predicates::prelude::*;
use serde_json::Value;
use std::io::Write;

const READY: &str = "{\"name\":\"safepay-inframe__ready\"}\n";

fn context_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "tracker": "track_123",
            "clientSecret": "secret_abc",
            "deviceDataCollectionJWT": "jwt",
            "deviceDataCollectionURL": "https://collect.example",
            "street_1": "1 Main St",
            "city": "Karachi",
            "postal_code": "74000",
            "country": "PK"
        }}"#
    )
    .unwrap();
    file
}

fn bridge_cmd() -> Command {
    let mut cmd = Command::new(cargo_bin!("safepay-bridge"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_cli_sends_property_update_after_ready() {
    let context = context_file();

    let output = bridge_cmd()
        .arg(context.path())
        .arg("--do-capture")
        .write_stdin(READY)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);

    let message: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(message["type"], "safepay-property-update");
    assert!(message["messageId"].is_string());
    assert_eq!(message["properties"]["tracker"], "track_123");
    assert_eq!(message["properties"]["authToken"], "secret_abc");
    assert_eq!(message["properties"]["environment"], "sandbox");
    assert_eq!(message["properties"]["billing"]["city"], "Karachi");
    assert_eq!(message["properties"]["authorizationOptions"]["do_capture"], true);
}

#[test]
fn test_cli_holds_messages_until_ready() {
    let context = context_file();

    bridge_cmd()
        .arg(context.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_cli_script_format() {
    let context = context_file();

    bridge_cmd()
        .arg(context.path())
        .args(["--format", "script", "--environment", "production"])
        .write_stdin(READY)
        .assert()
        .success()
        .stdout(predicate::str::contains("window.postMessage({"))
        .stdout(predicate::str::contains(r#""environment":"production""#));
}

#[test]
fn test_cli_prints_domain_events() {
    let context = context_file();
    let input = format!(
        "{READY}{}\n",
        r#"{"name":"safepay-inframe__cardinal-3ds__success","detail":{"tracker":"track_123"}}"#
    );

    bridge_cmd()
        .arg(context.path())
        .write_stdin(input)
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "safepay-inframe__cardinal-3ds__success {",
        ));
}

#[test]
fn test_cli_survives_malformed_events() {
    let context = context_file();
    let input = format!("this is not json\n{READY}");

    bridge_cmd()
        .arg(context.path())
        .write_stdin(input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Ignoring malformed inbound event"))
        .stdout(predicate::str::contains("safepay-property-update"));
}

#[test]
fn test_cli_retries_until_exhausted_while_lingering() {
    let context = context_file();

    let output = bridge_cmd()
        .arg(context.path())
        .args(["--ack-timeout-ms", "100", "--max-retries", "1", "--linger-ms", "5000"])
        .write_stdin(READY)
        .assert()
        .success()
        .stderr(predicate::str::contains("Dropping message"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let ids: Vec<String> = stdout
        .lines()
        .map(|line| {
            let message: Value = serde_json::from_str(line).unwrap();
            message["messageId"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], ids[1]);
}

#[test]
fn test_cli_missing_context_file() {
    bridge_cmd()
        .arg("does/not/exist.json")
        .write_stdin("")
        .assert()
        .failure();
}
