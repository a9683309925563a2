//! Native-syntax expression and template parser.
//!
//! Parses with the tree-sitter HCL grammar, then maps the syntax tree onto an
//! [`Expression`] with source ranges. The grammar only accepts whole files,
//! so an expression is parsed as the value of a one-attribute body and a bare
//! template as the body of a heredoc. Ranges are reported relative to the
//! caller's text.
//!
//! Parse failures are reported as [`Diagnostics`] alongside a placeholder null
//! literal so callers always get a tree back.

mod reader;
mod template;

use hclast_ir::{Diagnostic, Diagnostics, Expression, LiteralValueExpr, Pos, Range, Value};
use tree_sitter::{Parser, Tree};

use reader::ReadContext;

const ATTRIBUTE_PREFIX: &str = "expr = ";

/// Parses `src` as a single native-syntax expression starting at `start`.
pub fn parse_expression(src: &str, filename: &str, start: Pos) -> (Expression, Diagnostics) {
    let source = format!("{ATTRIBUTE_PREFIX}{src}");
    let ctx = ReadContext::new(&source, ATTRIBUTE_PREFIX.len(), src.len(), start);
    let result = parse_tree(&source).and_then(|tree| ctx.read_root_expression(&tree));
    finish(result, filename, start)
}

/// Parses `src` as a bare template, where text outside `${ }` and `%{ }`
/// sequences is literal.
///
/// Unlike a quoted template inside an expression, a bare template made of a
/// single interpolation is still a template expression with one part.
pub fn parse_template(src: &str, filename: &str, start: Pos) -> (Expression, Diagnostics) {
    let marker = heredoc_marker(src);
    let prefix = format!("{ATTRIBUTE_PREFIX}<<{marker}\n");
    let source = format!("{prefix}{src}\n{marker}\n");
    let ctx = ReadContext::new(&source, prefix.len(), src.len(), start);
    let result = parse_tree(&source).and_then(|tree| ctx.read_root_template(&tree));
    finish(result, filename, start)
}

/// A heredoc marker that cannot close the heredoc early.
fn heredoc_marker(src: &str) -> String {
    let mut marker = String::from("HCLAST_TEMPLATE");
    while src.contains(&marker) {
        marker.push('_');
    }
    marker
}

fn parse_tree(source: &str) -> Result<Tree, Diagnostic> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_hcl::language().into())
        .map_err(|err| Diagnostic::error("Failed to load the HCL grammar", err.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| Diagnostic::error("Failed to parse", "The parser produced no syntax tree."))
}

fn finish(result: Result<Expression, Diagnostic>, filename: &str, start: Pos) -> (Expression, Diagnostics) {
    let mut diags = Diagnostics::new();
    let expr = match result {
        Ok(expr) => expr,
        Err(diag) => {
            let src_range = diag.subject.unwrap_or(Range::at(start));
            diags.push(diag);
            Expression::LiteralValue(LiteralValueExpr {
                value: Value::Null,
                src_range,
            })
        }
    };
    (expr, diags.in_file(filename))
}

#[cfg(test)]
mod tests;
