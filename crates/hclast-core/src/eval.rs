//! Evaluation of expressions that need no variables or functions.
//!
//! Only used to work out the result type of operator nodes, so it covers
//! the constant subset of the language and reports anything else as an
//! error diagnostic.

use std::collections::BTreeMap;

use hclast_ir::{Diagnostic, Expression, Operation, Range, Traverser, Value};

type EvalResult = Result<Value, Diagnostic>;

fn error(summary: &str, detail: impl Into<String>, range: Range) -> Diagnostic {
    Diagnostic::error(summary, detail).with_subject(range)
}

/// Evaluates `expr` with an empty scope.
pub fn evaluate(expr: &Expression) -> EvalResult {
    match expr {
        Expression::LiteralValue(lit) => Ok(lit.value.clone()),
        Expression::Template(tmpl) => {
            let mut out = String::new();
            for part in &tmpl.parts {
                let value = evaluate(part)?;
                out.push_str(&template_string(&value, part.range())?);
            }
            Ok(Value::String(out))
        }
        Expression::TemplateWrap(wrap) => evaluate(&wrap.wrapped),
        Expression::TemplateJoin(join) => {
            let value = evaluate(&join.tuple)?;
            let mut out = String::new();
            for (_, item) in value.elements() {
                out.push_str(&template_string(item, join.tuple.range())?);
            }
            Ok(Value::String(out))
        }
        Expression::Tuple(tuple) => tuple
            .exprs
            .iter()
            .map(evaluate)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Tuple),
        Expression::Object(obj) => {
            let mut attrs = BTreeMap::new();
            for item in &obj.items {
                let key = object_key(&item.key)?;
                attrs.insert(key, evaluate(&item.value)?);
            }
            Ok(Value::Object(attrs))
        }
        Expression::ObjectKey(_) => object_key(expr).map(Value::String),
        Expression::Parentheses(paren) => evaluate(&paren.inner),
        Expression::Conditional(cond) => {
            let condition = evaluate(&cond.condition)?;
            match to_bool(&condition) {
                Some(true) => evaluate(&cond.true_result),
                Some(false) => evaluate(&cond.false_result),
                None => Err(error(
                    "Incorrect condition type",
                    format!(
                        "The condition expression must be of type bool, not {}.",
                        condition.value_type()
                    ),
                    cond.condition.range(),
                )),
            }
        }
        Expression::UnaryOp(unary) => {
            let operand = evaluate(&unary.val)?;
            unary_op(unary.op, &operand, unary.val.range())
        }
        Expression::BinaryOp(binary) => {
            let lhs = evaluate(&binary.lhs)?;
            let rhs = evaluate(&binary.rhs)?;
            binary_op(binary.op, &lhs, &rhs, binary.src_range)
        }
        Expression::RelativeTraversal(rel) => {
            let mut value = evaluate(&rel.source)?;
            for step in rel.traversal.iter() {
                value = apply_step(&value, step)?;
            }
            Ok(value)
        }
        Expression::Index(index) => {
            let collection = evaluate(&index.collection)?;
            let key = evaluate(&index.key)?;
            index_value(&collection, &key, index.bracket_range)
        }
        Expression::ScopeTraversal(trav) => Err(error(
            "Variables not allowed",
            "Variables may not be used here.",
            trav.src_range,
        )),
        Expression::FunctionCall(call) => Err(error(
            "Function calls not allowed",
            format!("Functions may not be called here, including {:?}.", call.name),
            call.name_range,
        )),
        Expression::For(_) | Expression::Splat(_) | Expression::AnonSymbol(_) => Err(error(
            "Unsupported constant expression",
            format!("A {} cannot be evaluated without a scope.", expr.kind()),
            expr.range(),
        )),
    }
}

/// The string form of a value inside a template.
fn template_string(value: &Value, range: Range) -> Result<String, Diagnostic> {
    match value {
        Value::Null => Err(error(
            "Invalid template interpolation value",
            "The expression result is null. Cannot include a null value in a string template.",
            range,
        )),
        Value::Tuple(_) | Value::Object(_) => Err(error(
            "Invalid template interpolation value",
            format!(
                "Cannot include a {} value in a string template.",
                value.value_type()
            ),
            range,
        )),
        primitive => Ok(primitive.to_string()),
    }
}

/// Resolves an object item key. A bare identifier names the attribute
/// directly unless the key was forced to be an expression.
fn object_key(key: &Expression) -> Result<String, Diagnostic> {
    let (inner, force_non_literal) = match key {
        Expression::ObjectKey(key) => (key.wrapped.as_ref(), key.force_non_literal),
        other => (other, true),
    };
    if let Expression::ScopeTraversal(trav) = inner {
        if !force_non_literal && trav.traversal.len() == 1 {
            if let Some(name) = trav.traversal.root_name() {
                return Ok(name.to_string());
            }
        }
    }
    let value = evaluate(inner)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(_) | Value::Bool(_) => Ok(value.to_string()),
        other => Err(error(
            "Incorrect key type",
            format!("Can't use this value as a key: {} values are not allowed.", other.value_type()),
            inner.range(),
        )),
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s == "true" => Some(true),
        Value::String(s) if s == "false" => Some(false),
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn invalid_operand(expected: &str, value: &Value, range: Range) -> Diagnostic {
    error(
        "Invalid operand",
        format!(
            "Unsuitable value for operand: a {expected} is required, not {}.",
            value.value_type()
        ),
        range,
    )
}

fn unary_op(op: Operation, operand: &Value, range: Range) -> EvalResult {
    match op {
        Operation::Negate => to_number(operand)
            .map(|n| Value::Number(-n))
            .ok_or_else(|| invalid_operand("number", operand, range)),
        Operation::LogicalNot => to_bool(operand)
            .map(|b| Value::Bool(!b))
            .ok_or_else(|| invalid_operand("bool", operand, range)),
        other => Err(error(
            "Invalid unary operator",
            format!("{} is not a unary operator.", other.symbol()),
            range,
        )),
    }
}

fn binary_op(op: Operation, lhs: &Value, rhs: &Value, range: Range) -> EvalResult {
    match op {
        Operation::Equal => Ok(Value::Bool(lhs == rhs)),
        Operation::NotEqual => Ok(Value::Bool(lhs != rhs)),
        Operation::LogicalOr | Operation::LogicalAnd => {
            let a = to_bool(lhs).ok_or_else(|| invalid_operand("bool", lhs, range))?;
            let b = to_bool(rhs).ok_or_else(|| invalid_operand("bool", rhs, range))?;
            Ok(Value::Bool(if op == Operation::LogicalOr { a || b } else { a && b }))
        }
        _ => {
            let a = to_number(lhs).ok_or_else(|| invalid_operand("number", lhs, range))?;
            let b = to_number(rhs).ok_or_else(|| invalid_operand("number", rhs, range))?;
            arithmetic(op, a, b, range)
        }
    }
}

fn arithmetic(op: Operation, a: f64, b: f64, range: Range) -> EvalResult {
    let value = match op {
        Operation::GreaterThan => Value::Bool(a > b),
        Operation::GreaterThanOrEqual => Value::Bool(a >= b),
        Operation::LessThan => Value::Bool(a < b),
        Operation::LessThanOrEqual => Value::Bool(a <= b),
        Operation::Add => Value::Number(a + b),
        Operation::Subtract => Value::Number(a - b),
        Operation::Multiply => Value::Number(a * b),
        Operation::Divide | Operation::Modulo if b == 0.0 => {
            return Err(error(
                "Division by zero",
                "The right operand of a division or modulo must not be zero.",
                range,
            ));
        }
        Operation::Divide => Value::Number(a / b),
        Operation::Modulo => Value::Number(a % b),
        other => {
            return Err(error(
                "Invalid binary operator",
                format!("{} is not a binary operator.", other.symbol()),
                range,
            ));
        }
    };
    Ok(value)
}

fn apply_step(value: &Value, step: &Traverser) -> EvalResult {
    match step {
        Traverser::Attr { name, src_range } => match value {
            Value::Object(attrs) => attrs.get(name).cloned().ok_or_else(|| {
                error(
                    "Unsupported attribute",
                    format!("This object does not have an attribute named {name:?}."),
                    *src_range,
                )
            }),
            other => Err(error(
                "Unsupported attribute",
                format!("Can't access attributes on a {} value.", other.value_type()),
                *src_range,
            )),
        },
        Traverser::Index { key, src_range } => index_value(value, key, *src_range),
        Traverser::Root { name, src_range } => Err(error(
            "Variables not allowed",
            format!("The variable {name:?} may not be used here."),
            *src_range,
        )),
    }
}

fn index_value(collection: &Value, key: &Value, range: Range) -> EvalResult {
    let missing = || {
        error(
            "Invalid index",
            "The given key does not identify an element in this collection value.",
            range,
        )
    };
    match collection {
        Value::Tuple(items) => {
            let index = to_number(key).ok_or_else(|| invalid_operand("number", key, range))?;
            if index.fract() != 0.0 || index < 0.0 {
                return Err(missing());
            }
            items.get(index as usize).cloned().ok_or_else(missing)
        }
        Value::Object(attrs) => {
            let name = match key {
                Value::String(s) => s.clone(),
                Value::Number(_) | Value::Bool(_) => key.to_string(),
                other => return Err(invalid_operand("string", other, range)),
            };
            attrs.get(&name).cloned().ok_or_else(missing)
        }
        other => Err(error(
            "Invalid index",
            format!("This value does not have any indices: {} values cannot be indexed.", other.value_type()),
            range,
        )),
    }
}
