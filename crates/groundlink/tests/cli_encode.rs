#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn groundlink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_groundlink"))
        .args(["--log-level", "error"])
        .args(args)
        .output()
        .expect("groundlink should run")
}

#[test]
fn encode_takeoff_prints_frame_json() {
    let output = groundlink(&["--format", "json", "encode", "takeoff", "10"]);
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(json["command"], "takeoff");
    assert_eq!(json["length"], 26);
    let frame = json["frame"].as_str().expect("frame should be a string");
    assert!(frame.starts_with("74 79 00 16 44 42 4D"));
    assert!(frame.ends_with("D1 00 11 41 20 00 00"));
}

#[test]
fn encode_register_matches_wire_layout() {
    let output = groundlink(&["--format", "pretty", "encode", "register", "209938", "abc"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("74 79 00 08 01 00 03 34 12 61 62 63"), "{stdout}");
}

#[test]
fn encode_uses_custom_serial() {
    let output = groundlink(&[
        "--format",
        "pretty",
        "encode",
        "--serial",
        "ABC123456789012",
        "land",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // "ABC" in hex.
    assert!(stdout.contains("74 79 00 12 41 42 43"), "{stdout}");
}

#[test]
fn encode_raw_writes_frame_bytes() {
    let output = groundlink(&["--format", "raw", "encode", "camera", "zoom", "in"]);
    assert!(output.status.success());
    assert_eq!(output.stdout.len(), 22);
    assert_eq!(&output.stdout[..2], &[0x74, 0x79]);
    assert_eq!(output.stdout[21], 0x0A);
}

#[test]
fn encode_unknown_command_exits_64() {
    let output = groundlink(&["encode", "barrel", "roll"]);
    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown command: barrel"), "{stderr}");
}

#[test]
fn encode_bad_number_exits_64() {
    let output = groundlink(&["encode", "takeoff", "high"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn encode_bad_serial_exits_64() {
    let output = groundlink(&["encode", "--serial", "short", "land"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_package_version() {
    let output = groundlink(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("groundlink {}", env!("CARGO_PKG_VERSION")));

    let extended = groundlink(&["version", "--extended"]);
    assert!(String::from_utf8_lossy(&extended.stdout).contains("features: link=true"));
}
