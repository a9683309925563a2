//! Assembles template parts from the literal text and sequences found
//! between a template's delimiters.
//!
//! The reader flattens a template into [`Piece`]s in source order. Strip
//! markers and `<<-` indentation are applied to the flat list before
//! directives are folded into conditionals and joins.

use hclast_ir::{
    ConditionalExpr, Diagnostic, Expression, ForExpr, LiteralValueExpr, Range, TemplateExpr,
    TemplateJoinExpr, TemplateWrapExpr, Value,
};

use crate::reader::{ReadResult, error};

pub(crate) enum Directive {
    If(Expression),
    Else,
    EndIf,
    For {
        key_var: Option<String>,
        val_var: String,
        coll: Expression,
    },
    EndFor,
}

impl Directive {
    fn keyword(&self) -> &'static str {
        match self {
            Directive::If(_) => "if",
            Directive::Else => "else",
            Directive::EndIf => "endif",
            Directive::For { .. } => "for",
            Directive::EndFor => "endfor",
        }
    }
}

pub(crate) enum Piece {
    Literal {
        text: String,
        range: Range,
        /// The text begins a line of a heredoc body.
        line_start: bool,
    },
    Interp {
        expr: Expression,
        strip_left: bool,
        strip_right: bool,
    },
    Directive {
        directive: Directive,
        range: Range,
        strip_left: bool,
        strip_right: bool,
    },
}

impl Piece {
    fn strip_flags(&self) -> (bool, bool) {
        match self {
            Piece::Literal { .. } => (false, false),
            Piece::Interp {
                strip_left,
                strip_right,
                ..
            }
            | Piece::Directive {
                strip_left,
                strip_right,
                ..
            } => (*strip_left, *strip_right),
        }
    }
}

fn string_literal(text: String, range: Range) -> Expression {
    Expression::LiteralValue(LiteralValueExpr {
        value: Value::String(text),
        src_range: range,
    })
}

/// A template with no content evaluates to the empty string.
fn template(mut parts: Vec<Expression>, src_range: Range) -> Expression {
    if parts.is_empty() {
        parts.push(string_literal(String::new(), Range::at(src_range.start)));
    }
    Expression::Template(TemplateExpr { parts, src_range })
}

/// Applies `~` markers by trimming whitespace from the neighbouring literals.
fn apply_strip(pieces: &mut [Piece]) {
    for i in 0..pieces.len() {
        let (left, right) = pieces[i].strip_flags();
        if left && i > 0 {
            if let Piece::Literal { text, .. } = &mut pieces[i - 1] {
                *text = text.trim_end().to_string();
            }
        }
        if right && i + 1 < pieces.len() {
            if let Piece::Literal { text, .. } = &mut pieces[i + 1] {
                *text = text.trim_start().to_string();
            }
        }
    }
}

/// Removes the indentation shared by every non-blank line of a `<<-` heredoc.
fn flush_indent(pieces: &mut [Piece]) {
    let indent_of = |text: &str| text.chars().take_while(|c| *c == ' ' || *c == '\t').count();
    let shared = pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Literal {
                text,
                line_start: true,
                ..
            } if !text.trim().is_empty() => Some(indent_of(text)),
            _ => None,
        })
        .min()
        .unwrap_or(0);

    for piece in pieces.iter_mut() {
        if let Piece::Literal {
            text,
            line_start: true,
            ..
        } = piece
        {
            let strip = indent_of(text).min(shared);
            *text = text.chars().skip(strip).collect();
        }
    }
}

type Stop = Option<(Directive, Range)>;

/// Builds template parts up to the next `else`, `endif` or `endfor`, which is
/// returned alongside the parts.
fn build_parts(pieces: &mut std::vec::IntoIter<Piece>) -> ReadResult<(Vec<Expression>, Stop)> {
    let mut parts = Vec::new();
    while let Some(piece) = pieces.next() {
        match piece {
            Piece::Literal { text, range, .. } => {
                if !text.is_empty() {
                    parts.push(string_literal(text, range));
                }
            }
            Piece::Interp { expr, .. } => parts.push(expr),
            Piece::Directive {
                directive, range, ..
            } => match directive {
                Directive::If(condition) => parts.push(build_if(condition, range, pieces)?),
                Directive::For {
                    key_var,
                    val_var,
                    coll,
                } => parts.push(build_for(key_var, val_var, coll, range, pieces)?),
                end => return Ok((parts, Some((end, range)))),
            },
        }
    }
    Ok((parts, None))
}

fn unterminated(keyword: &str, range: Range) -> Diagnostic {
    error(
        "Unterminated template directive",
        format!("The %{{ {keyword} }} directive has no matching end directive."),
        range,
    )
}

fn unexpected_directive(directive: &Directive, range: Range) -> Diagnostic {
    error(
        "Unexpected template directive",
        format!(
            "The %{{ {} }} directive does not close any open directive here.",
            directive.keyword()
        ),
        range,
    )
}

fn build_if(
    condition: Expression,
    if_range: Range,
    pieces: &mut std::vec::IntoIter<Piece>,
) -> ReadResult<Expression> {
    let (true_parts, stop) = build_parts(pieces)?;
    let (true_end, false_result, end_range) = match stop {
        Some((Directive::EndIf, end_range)) => {
            let empty = template(Vec::new(), Range::at(end_range.start));
            (end_range, empty, end_range)
        }
        Some((Directive::Else, else_range)) => {
            let (false_parts, stop) = build_parts(pieces)?;
            match stop {
                Some((Directive::EndIf, end_range)) => {
                    let false_result = template(false_parts, Range::between(else_range, end_range));
                    (else_range, false_result, end_range)
                }
                Some((other, range)) => return Err(unexpected_directive(&other, range)),
                None => return Err(unterminated("if", if_range)),
            }
        }
        Some((other, range)) => return Err(unexpected_directive(&other, range)),
        None => return Err(unterminated("if", if_range)),
    };
    let true_result = template(true_parts, Range::between(if_range, true_end));
    Ok(Expression::Conditional(ConditionalExpr {
        condition: Box::new(condition),
        true_result: Box::new(true_result),
        false_result: Box::new(false_result),
        src_range: Range::between(if_range, end_range),
    }))
}

fn build_for(
    key_var: Option<String>,
    val_var: String,
    coll: Expression,
    for_range: Range,
    pieces: &mut std::vec::IntoIter<Piece>,
) -> ReadResult<Expression> {
    let (body, stop) = build_parts(pieces)?;
    let end_range = match stop {
        Some((Directive::EndFor, end_range)) => end_range,
        Some((other, range)) => return Err(unexpected_directive(&other, range)),
        None => return Err(unterminated("for", for_range)),
    };
    let src_range = Range::between(for_range, end_range);
    let tuple = Expression::For(ForExpr {
        key_var,
        val_var,
        coll_expr: Box::new(coll),
        key_expr: None,
        val_expr: Box::new(template(body, src_range)),
        cond_expr: None,
        group: false,
        src_range,
        open_range: for_range,
        close_range: end_range,
    });
    Ok(Expression::TemplateJoin(TemplateJoinExpr {
        tuple: Box::new(tuple),
    }))
}

/// Turns the pieces of one template into an expression.
///
/// With `allow_wrap`, a template made of exactly one interpolation becomes a
/// [`TemplateWrapExpr`] instead of a one-part [`TemplateExpr`].
pub(crate) fn finish_template(
    mut pieces: Vec<Piece>,
    src_range: Range,
    allow_wrap: bool,
    flush: bool,
) -> ReadResult<Expression> {
    if flush {
        flush_indent(&mut pieces);
    }
    apply_strip(&mut pieces);

    if allow_wrap && pieces.len() == 1 {
        if let Some(Piece::Interp { .. }) = pieces.first() {
            if let Some(Piece::Interp { expr, .. }) = pieces.pop() {
                return Ok(Expression::TemplateWrap(TemplateWrapExpr {
                    wrapped: Box::new(expr),
                    src_range,
                }));
            }
        }
    }

    let mut iter = pieces.into_iter();
    let (parts, stop) = build_parts(&mut iter)?;
    if let Some((directive, range)) = stop {
        return Err(unexpected_directive(&directive, range));
    }
    Ok(template(parts, src_range))
}
