//! Runs the built binary end to end.

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn hclast(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_hclast"))
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start hclast");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for hclast")
}

#[test]
fn test_native_ast_from_stdin() {
    let output = hclast(&["native-ast", "-", "--filename", "main.tf"], "a + 1");
    assert!(output.status.success());
    let ast: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ast["type"], "BinaryOp");
    assert_eq!(ast["meta"]["operator"], "add");
}

#[test]
fn test_expression_ast_with_indent() {
    let output = hclast(&["--indent", "4", "expression-ast", "-"], r#"{"x": [1, "${a}", true]}"#);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("{\n    \"children\""));
    let ast: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(ast["type"], "Object");
}

#[test]
fn test_call_reports_single_error() {
    let output = hclast(&["call", "getExpressionAst"], "");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.lines().last(), Some("No arguments provided"));
}

#[test]
fn test_parse_error_exits_nonzero() {
    let output = hclast(&["native-ast", "-", "--filename", "bad.tf"], "foo(");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    let message = stderr.lines().last().unwrap_or_default();
    assert!(message.starts_with("bad.tf:1,"), "{stderr}");
    assert!(output.stdout.is_empty());
}
