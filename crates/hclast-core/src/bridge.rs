//! The operations a host calls, each returning JSON text or one error
//! message.

use hclast_ir::Diagnostics;
use thiserror::Error;
use tracing::{debug, info};

use crate::ast::encode;
use crate::config::AstConfig;
use crate::lift::lift;
use crate::serializer::serialize;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("No arguments provided")]
    NoArguments,

    #[error("{name} expects {expected} arguments, got {got}")]
    ArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{0}")]
    Diagnostics(#[from] Diagnostics),

    #[error("failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Names accepted by [`call`].
pub const FUNCTIONS: &[&str] = &["parseExpression", "getExpressionAst", "getNativeExpressionAst"];

fn fail_on_errors(diags: Diagnostics) -> Result<(), BridgeError> {
    if diags.has_errors() {
        return Err(BridgeError::Diagnostics(diags));
    }
    Ok(())
}

/// Reads `json_source` as a JSON expression, lifts the value into an
/// expression tree and returns the tree itself as JSON text.
///
/// Each node is an object tagged with its variant name under `type`.
pub fn parse_expression(
    filename: &str,
    json_source: &str,
    config: &AstConfig,
) -> Result<String, BridgeError> {
    let (value, diags) = hclast_syntax_json::parse_value(json_source, filename);
    fail_on_errors(diags)?;

    let (expr, diags) = lift(&value);
    fail_on_errors(diags)?;

    debug!(nodes = expr.node_count(), "lifted expression");
    Ok(encode(&expr, config.indent)?)
}

/// Reads `json_source` as a JSON expression, lifts the value into an
/// expression tree and returns its AST as JSON text.
pub fn expression_ast(
    filename: &str,
    json_source: &str,
    config: &AstConfig,
) -> Result<String, BridgeError> {
    let (value, diags) = hclast_syntax_json::parse_value(json_source, filename);
    fail_on_errors(diags)?;

    let (expr, diags) = lift(&value);
    fail_on_errors(diags)?;

    let (ast, warnings) = serialize(&expr);
    debug!(nodes = ast.node_count(), warnings = warnings.len(), "serialized lifted expression");
    Ok(encode(&ast, config.indent)?)
}

/// Parses `source` as a native expression and returns its AST as JSON text.
pub fn native_expression_ast(
    filename: &str,
    source: &str,
    config: &AstConfig,
) -> Result<String, BridgeError> {
    let (expr, diags) =
        hclast_syntax_hcl::parse_expression(source, filename, hclast_ir::Pos::START);
    fail_on_errors(diags)?;

    let (ast, warnings) = serialize(&expr);
    debug!(nodes = ast.node_count(), warnings = warnings.len(), "serialized native expression");
    Ok(encode(&ast, config.indent)?)
}

/// Dispatches a host call by name. Every function takes
/// `[filename, source]`.
pub fn call(name: &str, args: &[String], config: &AstConfig) -> Result<String, BridgeError> {
    let op: fn(&str, &str, &AstConfig) -> Result<String, BridgeError> = match name {
        "parseExpression" => parse_expression,
        "getExpressionAst" => expression_ast,
        "getNativeExpressionAst" => native_expression_ast,
        other => return Err(BridgeError::UnknownFunction(other.to_string())),
    };
    match args {
        [] => Err(BridgeError::NoArguments),
        [filename, source] => {
            info!(function = name, filename = filename.as_str(), "bridge call");
            op(filename, source, config)
        }
        _ => Err(BridgeError::ArgumentCount {
            name: name.to_string(),
            expected: 2,
            got: args.len(),
        }),
    }
}
