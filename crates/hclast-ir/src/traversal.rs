//! Attribute and index access paths such as `a.b[0]`.

use serde::Serialize;

use crate::{Range, Value};

/// One step of a traversal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Traverser {
    /// The variable a scope traversal starts from.
    Root { name: String, src_range: Range },
    /// `.name`
    Attr { name: String, src_range: Range },
    /// `[key]` or the legacy `.0` form, with a key known at parse time.
    Index { key: Value, src_range: Range },
}

impl Traverser {
    pub fn src_range(&self) -> Range {
        match self {
            Traverser::Root { src_range, .. }
            | Traverser::Attr { src_range, .. }
            | Traverser::Index { src_range, .. } => *src_range,
        }
    }

    fn src_range_mut(&mut self) -> &mut Range {
        match self {
            Traverser::Root { src_range, .. }
            | Traverser::Attr { src_range, .. }
            | Traverser::Index { src_range, .. } => src_range,
        }
    }
}

/// An ordered sequence of traversal steps.
///
/// An absolute traversal starts with a [`Traverser::Root`]; a relative one
/// applies to the value of some other expression.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Traversal(pub Vec<Traverser>);

impl Traversal {
    pub fn new(steps: Vec<Traverser>) -> Self {
        Self(steps)
    }

    pub fn push(&mut self, step: Traverser) {
        self.0.push(step);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Traverser> {
        self.0.iter()
    }

    pub fn root_name(&self) -> Option<&str> {
        match self.0.first() {
            Some(Traverser::Root { name, .. }) => Some(name),
            _ => None,
        }
    }

    pub(crate) fn reset_ranges(&mut self, range: Range) {
        for step in &mut self.0 {
            *step.src_range_mut() = range;
        }
    }
}
