//! Unary and binary operators.

use serde::Serialize;

use crate::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    LogicalOr,
    LogicalAnd,
    LogicalNot,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
}

impl Operation {
    /// The type every successful application of this operator produces.
    pub fn result_type(self) -> ValueType {
        match self {
            Operation::LogicalOr
            | Operation::LogicalAnd
            | Operation::LogicalNot
            | Operation::Equal
            | Operation::NotEqual
            | Operation::GreaterThan
            | Operation::GreaterThanOrEqual
            | Operation::LessThan
            | Operation::LessThanOrEqual => ValueType::Bool,
            Operation::Add
            | Operation::Subtract
            | Operation::Multiply
            | Operation::Divide
            | Operation::Modulo
            | Operation::Negate => ValueType::Number,
        }
    }

    /// The operator as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::LogicalOr => "||",
            Operation::LogicalAnd => "&&",
            Operation::LogicalNot => "!",
            Operation::Equal => "==",
            Operation::NotEqual => "!=",
            Operation::GreaterThan => ">",
            Operation::GreaterThanOrEqual => ">=",
            Operation::LessThan => "<",
            Operation::LessThanOrEqual => "<=",
            Operation::Add => "+",
            Operation::Subtract | Operation::Negate => "-",
            Operation::Multiply => "*",
            Operation::Divide => "/",
            Operation::Modulo => "%",
        }
    }

    /// Binary operator precedence levels, loosest first.
    pub const BINARY_PRECEDENCE: &'static [&'static [Operation]] = &[
        &[Operation::LogicalOr],
        &[Operation::LogicalAnd],
        &[Operation::Equal, Operation::NotEqual],
        &[
            Operation::GreaterThan,
            Operation::GreaterThanOrEqual,
            Operation::LessThan,
            Operation::LessThanOrEqual,
        ],
        &[Operation::Add, Operation::Subtract],
        &[Operation::Multiply, Operation::Divide, Operation::Modulo],
    ];
}
