use super::*;
use hclast_ir::{Operation, Traverser};

fn parse(src: &str) -> Expression {
    let (expr, diags) = parse_expression(src, "test.hcl", Pos::START);
    assert!(diags.is_empty(), "unexpected diagnostics for {src:?}: {diags}");
    expr
}

fn template(src: &str) -> Expression {
    let (expr, diags) = parse_template(src, "test.hcl", Pos::START);
    assert!(diags.is_empty(), "unexpected diagnostics for {src:?}: {diags}");
    expr
}

fn parts(expr: &Expression) -> &[Expression] {
    match expr {
        Expression::Template(tmpl) => &tmpl.parts,
        other => panic!("expected template, got {}", other.kind()),
    }
}

fn string_value(expr: &Expression) -> &str {
    match expr {
        Expression::LiteralValue(LiteralValueExpr {
            value: Value::String(s),
            ..
        }) => s,
        other => panic!("expected literal, got {}", other.kind()),
    }
}

fn span(expr: &Expression) -> (usize, usize) {
    let range = expr.range();
    (range.start.byte, range.end.byte)
}

#[test]
fn test_number_literal() {
    let expr = parse("42");
    let Expression::LiteralValue(lit) = &expr else {
        panic!("expected literal, got {}", expr.kind());
    };
    assert_eq!(lit.value, Value::Number(42.0));
    assert_eq!(lit.src_range.start, Pos::new(1, 1, 0));
    assert_eq!(lit.src_range.end, Pos::new(1, 3, 2));
}

#[test]
fn test_keyword_literals() {
    assert_eq!(parse("true"), Expression::LiteralValue(LiteralValueExpr {
        value: Value::Bool(true),
        src_range: Range::new(Pos::new(1, 1, 0), Pos::new(1, 5, 4)),
    }));
    let Expression::LiteralValue(lit) = parse("null") else {
        panic!("expected literal");
    };
    assert!(lit.value.is_null());
}

#[test]
fn test_start_position_offsets_ranges() {
    let (expr, diags) = parse_expression("x", "test.hcl", Pos::new(3, 5, 10));
    assert!(diags.is_empty());
    assert_eq!(expr.range().start, Pos::new(3, 5, 10));
    assert_eq!(expr.range().end, Pos::new(3, 6, 11));
}

#[test]
fn test_columns_count_characters() {
    let expr = parse("\"é${x}\"");
    let Expression::TemplateWrap(wrap) = &expr else {
        panic!("expected template wrap, got {}", expr.kind());
    };
    assert_eq!(wrap.wrapped.range().start, Pos::new(1, 5, 5));
    assert_eq!(wrap.wrapped.range().end, Pos::new(1, 6, 6));
}

#[test]
fn test_positions_on_later_lines() {
    let Expression::Tuple(tuple) = parse("[\n  a,\n]") else {
        panic!("expected tuple");
    };
    assert_eq!(tuple.exprs[0].range().start, Pos::new(2, 3, 4));
    assert_eq!(tuple.src_range.end, Pos::new(3, 2, 8));
}

#[test]
fn test_binary_precedence() {
    let expr = parse("1 + 2 * 3");
    let Expression::BinaryOp(add) = &expr else {
        panic!("expected binary op, got {}", expr.kind());
    };
    assert_eq!(add.op, Operation::Add);
    let Expression::BinaryOp(mul) = add.rhs.as_ref() else {
        panic!("expected nested binary op");
    };
    assert_eq!(mul.op, Operation::Multiply);
    assert_eq!(span(&expr), (0, 9));
}

#[test]
fn test_logical_precedence() {
    let Expression::BinaryOp(or) = parse("a || b && c") else {
        panic!("expected binary op");
    };
    assert_eq!(or.op, Operation::LogicalOr);
    assert!(matches!(or.rhs.as_ref(), Expression::BinaryOp(and) if and.op == Operation::LogicalAnd));
}

#[test]
fn test_comparison_operators() {
    for (src, op) in [
        ("a == b", Operation::Equal),
        ("a != b", Operation::NotEqual),
        ("a < b", Operation::LessThan),
        ("a <= b", Operation::LessThanOrEqual),
        ("a > b", Operation::GreaterThan),
        ("a >= b", Operation::GreaterThanOrEqual),
        ("a % b", Operation::Modulo),
    ] {
        let Expression::BinaryOp(bin) = parse(src) else {
            panic!("expected binary op for {src}");
        };
        assert_eq!(bin.op, op, "{src}");
    }
}

#[test]
fn test_unary_operators() {
    let Expression::UnaryOp(neg) = parse("-x") else {
        panic!("expected unary op");
    };
    assert_eq!(neg.op, Operation::Negate);
    assert_eq!((neg.symbol_range.start.byte, neg.symbol_range.end.byte), (0, 1));

    let Expression::UnaryOp(not) = parse("!true") else {
        panic!("expected unary op");
    };
    assert_eq!(not.op, Operation::LogicalNot);
}

#[test]
fn test_conditional() {
    let expr = parse("a ? 1 : 2");
    let Expression::Conditional(cond) = &expr else {
        panic!("expected conditional, got {}", expr.kind());
    };
    assert!(matches!(cond.condition.as_ref(), Expression::ScopeTraversal(_)));
    assert_eq!(span(&expr), (0, 9));
}

#[test]
fn test_comments_are_skipped() {
    let Expression::BinaryOp(bin) = parse("1 /* one */ + # rest\n 2") else {
        panic!("expected binary op");
    };
    assert_eq!(bin.op, Operation::Add);
}

#[test]
fn test_scope_traversal() {
    let expr = parse("var.foo[0].bar");
    let Expression::ScopeTraversal(trav) = &expr else {
        panic!("expected scope traversal, got {}", expr.kind());
    };
    assert_eq!(trav.traversal.len(), 4);
    assert_eq!(trav.traversal.root_name(), Some("var"));
    match &trav.traversal.0[2] {
        Traverser::Index { key, src_range } => {
            assert_eq!(key, &Value::Number(0.0));
            assert_eq!((src_range.start.byte, src_range.end.byte), (7, 10));
        }
        other => panic!("expected index step, got {other:?}"),
    }
    assert_eq!(span(&expr), (0, 14));
}

#[test]
fn test_legacy_index() {
    let Expression::ScopeTraversal(trav) = parse("a.0.b") else {
        panic!("expected scope traversal");
    };
    assert_eq!(trav.traversal.len(), 3);
    assert!(matches!(
        &trav.traversal.0[1],
        Traverser::Index { key: Value::Number(n), .. } if *n == 0.0
    ));
    assert!(matches!(&trav.traversal.0[2], Traverser::Attr { name, .. } if name == "b"));
}

#[test]
fn test_string_key_index_is_a_step() {
    let Expression::ScopeTraversal(trav) = parse(r#"a["b"]"#) else {
        panic!("expected scope traversal");
    };
    assert!(matches!(
        &trav.traversal.0[1],
        Traverser::Index { key: Value::String(s), .. } if s == "b"
    ));
}

#[test]
fn test_dynamic_index() {
    let expr = parse("a[b]");
    let Expression::Index(index) = &expr else {
        panic!("expected index, got {}", expr.kind());
    };
    assert!(matches!(index.key.as_ref(), Expression::ScopeTraversal(_)));
    assert_eq!(
        (index.bracket_range.start.byte, index.bracket_range.end.byte),
        (1, 4)
    );
    assert_eq!(span(&expr), (0, 4));
}

#[test]
fn test_traversal_after_call_is_relative() {
    let expr = parse("f(x).y");
    let Expression::RelativeTraversal(rel) = &expr else {
        panic!("expected relative traversal, got {}", expr.kind());
    };
    assert!(matches!(rel.source.as_ref(), Expression::FunctionCall(_)));
    assert_eq!(rel.traversal.len(), 1);
}

#[test]
fn test_full_splat() {
    let expr = parse("a[*].b");
    let Expression::Splat(splat) = &expr else {
        panic!("expected splat, got {}", expr.kind());
    };
    assert_eq!(
        (splat.marker_range.start.byte, splat.marker_range.end.byte),
        (1, 4)
    );
    let Expression::RelativeTraversal(each) = splat.each.as_ref() else {
        panic!("expected relative traversal in splat");
    };
    assert!(matches!(each.source.as_ref(), Expression::AnonSymbol(_)));
    assert_eq!(span(&expr), (0, 6));
}

#[test]
fn test_attribute_splat() {
    let Expression::Splat(splat) = parse("a.*.b") else {
        panic!("expected splat");
    };
    assert!(matches!(splat.each.as_ref(), Expression::RelativeTraversal(_)));
}

#[test]
fn test_function_call_ranges() {
    let Expression::FunctionCall(call) = parse("foo(1, 2)") else {
        panic!("expected function call");
    };
    assert_eq!(call.name, "foo");
    assert_eq!(call.args.len(), 2);
    assert!(!call.expand_final);
    assert_eq!((call.name_range.start.byte, call.name_range.end.byte), (0, 3));
    assert_eq!(
        (call.open_paren_range.start.byte, call.open_paren_range.end.byte),
        (3, 4)
    );
    assert_eq!(
        (call.close_paren_range.start.byte, call.close_paren_range.end.byte),
        (8, 9)
    );
}

#[test]
fn test_function_call_expansion_and_namespace() {
    let Expression::FunctionCall(call) = parse("f(a, b...)") else {
        panic!("expected function call");
    };
    assert!(call.expand_final);

    let Expression::FunctionCall(call) = parse("provider::aws::arn(x,)") else {
        panic!("expected function call");
    };
    assert_eq!(call.name, "provider::aws::arn");
    assert_eq!(call.args.len(), 1);
    assert_eq!((call.name_range.start.byte, call.name_range.end.byte), (0, 18));
}

#[test]
fn test_tuple() {
    let expr = parse("[1, true, \"x\",]");
    let Expression::Tuple(tuple) = &expr else {
        panic!("expected tuple, got {}", expr.kind());
    };
    assert_eq!(tuple.exprs.len(), 3);
    assert_eq!(span(&expr), (0, 15));
}

#[test]
fn test_object_keys() {
    let Expression::Object(obj) = parse("{a = 1, \"b\": 2\n(c) = 3}") else {
        panic!("expected object");
    };
    assert_eq!(obj.items.len(), 3);
    let keys: Vec<_> = obj
        .items
        .iter()
        .map(|item| match &item.key {
            Expression::ObjectKey(key) => (key.wrapped.kind(), key.force_non_literal),
            other => panic!("expected object key, got {}", other.kind()),
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("scope traversal", false),
            ("template", false),
            ("parentheses", true),
        ]
    );
}

#[test]
fn test_tuple_for() {
    let Expression::For(for_expr) = parse("[for x in xs : upper(x) if x != \"\"]") else {
        panic!("expected for expression");
    };
    assert_eq!(for_expr.key_var, None);
    assert_eq!(for_expr.val_var, "x");
    assert!(for_expr.key_expr.is_none());
    assert!(for_expr.cond_expr.is_some());
    assert!(!for_expr.group);
}

#[test]
fn test_object_for_grouped() {
    let Expression::For(for_expr) = parse("{for k, v in m : v => k...}") else {
        panic!("expected for expression");
    };
    assert_eq!(for_expr.key_var.as_deref(), Some("k"));
    assert_eq!(for_expr.val_var, "v");
    assert!(for_expr.key_expr.is_some());
    assert!(for_expr.group);
}

#[test]
fn test_quoted_template() {
    let expr = parse("\"hello ${name}!\"");
    let parts = parts(&expr);
    assert_eq!(parts.len(), 3);
    assert_eq!(string_value(&parts[0]), "hello ");
    assert!(matches!(parts[1], Expression::ScopeTraversal(_)));
    assert_eq!(string_value(&parts[2]), "!");
    assert_eq!(span(&expr), (0, 16));
}

#[test]
fn test_quoted_single_interpolation_wraps() {
    let expr = parse("\"${name}\"");
    let Expression::TemplateWrap(wrap) = &expr else {
        panic!("expected template wrap, got {}", expr.kind());
    };
    assert!(matches!(wrap.wrapped.as_ref(), Expression::ScopeTraversal(_)));
}

#[test]
fn test_empty_quoted_template() {
    let expr = parse("\"\"");
    let parts = parts(&expr);
    assert_eq!(parts.len(), 1);
    assert_eq!(string_value(&parts[0]), "");
}

#[test]
fn test_escapes() {
    let expr = parse(r#""a\n\"b\" $${x} é""#);
    assert_eq!(string_value(&parts(&expr)[0]), "a\n\"b\" ${x} é");
}

#[test]
fn test_bare_single_interpolation_does_not_wrap() {
    let expr = template("${a}");
    let parts = parts(&expr);
    assert_eq!(parts.len(), 1);
    assert!(matches!(parts[0], Expression::ScopeTraversal(_)));
}

#[test]
fn test_bare_template_literal() {
    let expr = template("plain text");
    assert_eq!(string_value(&parts(&expr)[0]), "plain text");
    assert_eq!(span(&expr), (0, 10));
}

#[test]
fn test_strip_markers() {
    let expr = parse("\"a  ${~ b ~}  c\"");
    let parts = parts(&expr);
    assert_eq!(string_value(&parts[0]), "a");
    assert_eq!(string_value(&parts[2]), "c");
}

#[test]
fn test_if_directive() {
    let expr = template("%{ if a }yes%{ else }no%{ endif }");
    let parts = parts(&expr);
    assert_eq!(parts.len(), 1);
    let Expression::Conditional(cond) = &parts[0] else {
        panic!("expected conditional, got {}", parts[0].kind());
    };
    assert_eq!(string_value(&self::parts(&cond.true_result)[0]), "yes");
    assert_eq!(string_value(&self::parts(&cond.false_result)[0]), "no");
}

#[test]
fn test_if_directive_without_else() {
    let expr = template("%{ if a }yes%{ endif }");
    let Expression::Conditional(cond) = &parts(&expr)[0] else {
        panic!("expected conditional");
    };
    assert_eq!(string_value(&parts(&cond.false_result)[0]), "");
}

#[test]
fn test_for_directive() {
    let expr = template("%{ for x in xs }${x},%{ endfor }");
    let Expression::TemplateJoin(join) = &parts(&expr)[0] else {
        panic!("expected template join");
    };
    let Expression::For(for_expr) = join.tuple.as_ref() else {
        panic!("expected for expression inside join");
    };
    assert_eq!(for_expr.val_var, "x");
    let body = parts(&for_expr.val_expr);
    assert_eq!(body.len(), 2);
    assert_eq!(string_value(&body[1]), ",");
}

#[test]
fn test_flush_heredoc() {
    let expr = parse("<<-EOT\n  hello\n    world\n  EOT\n");
    let parts = parts(&expr);
    assert_eq!(parts.len(), 2);
    assert_eq!(string_value(&parts[0]), "hello\n");
    assert_eq!(string_value(&parts[1]), "  world\n");
}

#[test]
fn test_heredoc_single_interpolation_line() {
    let expr = parse("<<EOT\n${a}\nEOT");
    let parts = parts(&expr);
    assert_eq!(parts.len(), 2);
    assert!(matches!(parts[0], Expression::ScopeTraversal(_)));
    assert_eq!(string_value(&parts[1]), "\n");
}

#[test]
fn test_invalid_expression() {
    let (expr, diags) = parse_expression("1 +", "main.tf", Pos::START);
    assert!(diags.has_errors());
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.summary, "Invalid expression");
    assert_eq!(diag.filename.as_deref(), Some("main.tf"));
    let Expression::LiteralValue(lit) = expr else {
        panic!("expected placeholder literal");
    };
    assert!(lit.value.is_null());
}

#[test]
fn test_extra_characters() {
    let (_, diags) = parse_expression("a\nb = 1", "main.tf", Pos::START);
    assert_eq!(diags.len(), 1);
    let diag = diags.iter().next().unwrap();
    assert_eq!(diag.summary, "Extra characters after expression");
    assert_eq!(diag.subject.map(|range| range.start), Some(Pos::new(2, 1, 2)));
}

#[test]
fn test_unterminated_string() {
    let (expr, diags) = parse_expression("\"abc", "main.tf", Pos::START);
    assert!(diags.has_errors());
    assert!(matches!(expr, Expression::LiteralValue(lit) if lit.value == Value::Null));
}

#[test]
fn test_unmatched_directive() {
    let (_, diags) = parse_template("x%{ endif }", "main.tf", Pos::START);
    assert!(diags.has_errors());
    let (_, diags) = parse_template("%{ if a }x", "main.tf", Pos::START);
    assert!(diags.has_errors());
}
