//! Tests for hclast-ir.

use std::collections::BTreeMap;

use serde_json::json;

use crate::*;

fn pos(byte: usize) -> Pos {
    Pos::new(1, byte + 1, byte)
}

fn range(start: usize, end: usize) -> Range {
    Range::new(pos(start), pos(end))
}

fn call_foo() -> Expression {
    // foo(1, 2)
    Expression::FunctionCall(FunctionCallExpr {
        name: "foo".into(),
        args: vec![
            Expression::LiteralValue(LiteralValueExpr {
                value: Value::Number(1.0),
                src_range: range(4, 5),
            }),
            Expression::LiteralValue(LiteralValueExpr {
                value: Value::Number(2.0),
                src_range: range(7, 8),
            }),
        ],
        expand_final: false,
        name_range: range(0, 3),
        open_paren_range: range(3, 4),
        close_paren_range: range(8, 9),
    })
}

#[test]
fn test_value_types() {
    assert_eq!(Value::Null.value_type(), ValueType::Dynamic);
    assert_eq!(Value::Bool(true).value_type(), ValueType::Bool);
    assert_eq!(Value::Number(1.5).value_type(), ValueType::Number);
    assert_eq!(Value::string("x").value_type(), ValueType::String);

    let tuple = Value::Tuple(vec![Value::Number(1.0), Value::string("a")]);
    assert_eq!(
        tuple.value_type(),
        ValueType::Tuple(vec![ValueType::Number, ValueType::String])
    );
}

#[test]
fn test_value_type_json() {
    assert_eq!(serde_json::to_value(ValueType::String).unwrap(), json!("string"));
    assert_eq!(serde_json::to_value(ValueType::Dynamic).unwrap(), json!("dynamic"));

    let mut attrs = BTreeMap::new();
    attrs.insert("a".to_string(), Value::Bool(false));
    attrs.insert("b".to_string(), Value::Tuple(vec![Value::Number(1.0)]));
    let ty = Value::Object(attrs).value_type();

    assert_eq!(
        serde_json::to_value(ty).unwrap(),
        json!(["object", {"a": "bool", "b": ["tuple", ["number"]]}])
    );
}

#[test]
fn test_value_elements() {
    let tuple = Value::Tuple(vec![Value::string("x"), Value::Bool(true)]);
    let keys: Vec<Value> = tuple.elements().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Value::Number(0.0), Value::Number(1.0)]);

    let mut attrs = BTreeMap::new();
    attrs.insert("zeta".to_string(), Value::Null);
    attrs.insert("alpha".to_string(), Value::Null);
    let object = Value::Object(attrs);
    let keys: Vec<Value> = object.elements().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Value::string("alpha"), Value::string("zeta")]);

    assert_eq!(Value::Number(3.0).elements().count(), 0);
}

#[test]
fn test_function_call_ranges() {
    let call = call_foo();
    assert_eq!(call.start_range(), range(0, 3));
    assert_eq!(call.range(), range(0, 9));
    assert_eq!(call.children().len(), 2);
    assert_eq!(call.node_count(), 3);
}

#[test]
fn test_binary_start_range_follows_lhs() {
    let expr = Expression::BinaryOp(BinaryOpExpr {
        lhs: Box::new(call_foo()),
        op: Operation::Add,
        rhs: Box::new(Expression::literal(1.0)),
        src_range: range(0, 13),
    });
    assert_eq!(expr.start_range(), range(0, 3));
}

#[test]
fn test_clear_ranges() {
    let mut call = call_foo();
    call.clear_ranges();
    assert!(call.range().is_synthetic());
    for child in call.children() {
        assert_eq!(child.range(), Range::SYNTHETIC);
    }
}

#[test]
fn test_operation_result_types() {
    assert_eq!(Operation::Add.result_type(), ValueType::Number);
    assert_eq!(Operation::Negate.result_type(), ValueType::Number);
    assert_eq!(Operation::LessThan.result_type(), ValueType::Bool);
    assert_eq!(Operation::LogicalNot.result_type(), ValueType::Bool);
}

#[test]
fn test_diagnostics_display() {
    let mut diags = Diagnostics::new();
    diags.push(
        Diagnostic::error("Invalid expression", "Expected the start of an expression.")
            .with_subject(range(4, 5)),
    );
    let diags = diags.in_file("main.tf");
    assert!(diags.has_errors());
    assert_eq!(
        diags.to_string(),
        "main.tf:1,5-6: Invalid expression; Expected the start of an expression."
    );

    let mut more = diags.clone();
    more.push(Diagnostic::warning("Unused", ""));
    assert_eq!(
        more.to_string(),
        "main.tf:1,5-6: Invalid expression; Expected the start of an expression., and 1 other diagnostic"
    );
}

#[test]
fn test_warnings_are_not_errors() {
    let diags = Diagnostics::from(Diagnostic::warning("Deprecated", "Use something else."));
    assert!(!diags.has_errors());
    assert_eq!(diags.len(), 1);
}

struct Recorder {
    events: Vec<String>,
}

impl Walker for Recorder {
    fn enter(&mut self, expr: &Expression) -> Diagnostics {
        self.events.push(format!("enter {}", expr.kind()));
        Diagnostics::new()
    }

    fn exit(&mut self, expr: &Expression) -> Diagnostics {
        self.events.push(format!("exit {}", expr.kind()));
        Diagnostics::new()
    }
}

#[test]
fn test_walk_order() {
    let expr = Expression::tuple(vec![call_foo(), Expression::literal(true)]);
    let mut recorder = Recorder { events: Vec::new() };
    let diags = walk(&expr, &mut recorder);

    assert!(diags.is_empty());
    assert_eq!(
        recorder.events,
        vec![
            "enter tuple constructor",
            "enter function call",
            "enter literal value",
            "exit literal value",
            "enter literal value",
            "exit literal value",
            "exit function call",
            "enter literal value",
            "exit literal value",
            "exit tuple constructor",
        ]
    );
}

#[test]
fn test_expression_serializes_with_type_tag() {
    let zero = json!({"line": 0, "column": 0, "byte": 0});
    let json = serde_json::to_value(Expression::tuple(vec![Expression::literal("a")])).unwrap();
    assert_eq!(json["type"], "Tuple");
    assert_eq!(
        json["exprs"][0],
        json!({
            "type": "LiteralValue",
            "value": "a",
            "src_range": {"start": zero, "end": zero}
        })
    );
}

#[test]
fn test_traversal_and_operator_serialization() {
    let step = Traverser::Root {
        name: "var".into(),
        src_range: range(0, 3),
    };
    let json = serde_json::to_value(Traversal::new(vec![step])).unwrap();
    assert_eq!(json[0]["step"], "root");
    assert_eq!(json[0]["name"], "var");
    assert_eq!(
        serde_json::to_value(Operation::GreaterThanOrEqual).unwrap(),
        json!("greater-than-or-equal")
    );
}
