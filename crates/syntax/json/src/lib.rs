//! JSON-syntax expression reader.
//!
//! JSON has no expression syntax of its own, so a JSON expression is read
//! straight into a [`Value`]. Strings are kept exactly as written; any
//! `${ }` sequences inside them are left for the caller to interpret.

use hclast_ir::{Diagnostic, Diagnostics, Pos, Range, Value};

/// Reads `src` as a single JSON value.
///
/// On failure the value is [`Value::Null`] and the diagnostics hold one
/// error pointing at the position reported by the JSON reader.
pub fn parse_value(src: &str, filename: &str) -> (Value, Diagnostics) {
    let mut diags = Diagnostics::new();
    let value = match serde_json::from_str::<serde_json::Value>(src) {
        Ok(json) => convert(json, &mut diags),
        Err(err) => {
            let pos = error_pos(src, err.line(), err.column());
            diags.push(
                Diagnostic::error("Invalid JSON expression", err.to_string())
                    .with_subject(Range::at(pos)),
            );
            Value::Null
        }
    };
    (value, diags.in_file(filename))
}

fn convert(json: serde_json::Value, diags: &mut Diagnostics) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(number) => Value::Number(number),
            None => {
                diags.push(Diagnostic::error(
                    "Invalid number",
                    format!("The number {n} cannot be represented."),
                ));
                Value::Null
            }
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Tuple(items.into_iter().map(|item| convert(item, diags)).collect())
        }
        serde_json::Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, convert(value, diags)))
                .collect(),
        ),
    }
}

/// Maps the reader's 1-based line and column to a full position.
fn error_pos(src: &str, line: usize, column: usize) -> Pos {
    let line = line.max(1);
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    let line_len = src[line_start..]
        .split('\n')
        .next()
        .map_or(0, str::len);
    let offset = column.saturating_sub(1).min(line_len);
    Pos::new(line, offset + 1, line_start + offset)
}
