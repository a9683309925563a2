//! The serializable AST node and its JSON encoding.

use hclast_ir::Range;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// One node of the serialized AST.
///
/// Fields serialize in declaration order. `meta` is left out entirely when
/// it has no entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AstNode {
    pub children: Vec<AstNode>,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
    pub range: Range,
}

impl AstNode {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(AstNode::node_count).sum::<usize>()
    }
}

/// Encodes `node` as JSON text indented by `indent` spaces per level.
pub fn encode<T: Serialize + ?Sized>(node: &T, indent: usize) -> Result<String, serde_json::Error> {
    let indent = " ".repeat(indent);
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    node.serialize(&mut serializer)?;
    // serde_json only writes valid UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}
