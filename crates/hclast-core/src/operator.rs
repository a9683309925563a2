//! Stable names for operators in serialized ASTs.

use hclast_ir::Operation;

const OPERATOR_NAMES: &[(Operation, &str)] = &[
    (Operation::LogicalOr, "logical-or"),
    (Operation::LogicalAnd, "logical-and"),
    (Operation::LogicalNot, "logical-not"),
    (Operation::Equal, "equal"),
    (Operation::NotEqual, "not-equal"),
    (Operation::GreaterThan, "greater-than"),
    (Operation::GreaterThanOrEqual, "greater-than-or-equal"),
    (Operation::LessThan, "less-than"),
    (Operation::LessThanOrEqual, "less-than-or-equal"),
    (Operation::Add, "add"),
    (Operation::Subtract, "subtract"),
    (Operation::Multiply, "multiply"),
    (Operation::Divide, "divide"),
    (Operation::Modulo, "modulo"),
    (Operation::Negate, "negate"),
];

/// The serialized name of `op`, or `None` for an operator without one.
pub fn operator_name(op: Operation) -> Option<&'static str> {
    OPERATOR_NAMES
        .iter()
        .find(|(known, _)| *known == op)
        .map(|(_, name)| *name)
}
