//! Value lifting and JSON AST serialization for HCL expressions.
//!
//! Two pipelines share one serializer:
//!
//! - JSON expression text → [`Value`](hclast_ir::Value) → [`lift`] →
//!   expression tree → [`serialize`] → [`encode`]
//! - native expression text → expression tree → [`serialize`] → [`encode`]
//!
//! [`bridge`] wraps both as string-in, string-out operations for hosts, along
//! with one that returns the lifted expression tree without serializing it
//! as an AST.

pub mod ast;
pub mod bridge;
pub mod config;
pub mod eval;
pub mod lift;
pub mod operator;
pub mod serializer;

pub use ast::{AstNode, encode};
pub use bridge::{BridgeError, call, expression_ast, native_expression_ast, parse_expression};
pub use config::{AstConfig, ConfigError};
pub use eval::evaluate;
pub use lift::lift;
pub use operator::operator_name;
pub use serializer::{AstSerializer, serialize};
