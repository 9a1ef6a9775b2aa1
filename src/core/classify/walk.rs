//! Depth-bounded JSON tree walk
//!
//! [`walk`] visits every node of a `serde_json::Value` once, in document
//! order, handing each object to a [`JsonVisitor`] together with the chain of
//! enclosing objects (outermost first). Arrays contribute no context of their
//! own. Subtrees deeper than `max_depth` are skipped and reported through
//! [`JsonVisitor::depth_exceeded`].

use serde_json::{Map, Value};

/// Callback interface for [`walk`]
pub trait JsonVisitor<'a> {
    /// Called for every object node, before its children
    fn visit_object(
        &mut self,
        object: &'a Map<String, Value>,
        ancestors: &[&'a Map<String, Value>],
    );

    /// Called for every scalar or null node
    fn visit_scalar(&mut self, _value: &'a Value) {}

    /// Called once per subtree skipped because of the depth bound
    fn depth_exceeded(&mut self, _depth: usize) {}
}

/// Walk `root` with `visitor`, never descending below `max_depth`
///
/// The root is at depth 0, so `max_depth = 0` visits only the root.
pub fn walk<'a, V: JsonVisitor<'a>>(root: &'a Value, visitor: &mut V, max_depth: usize) {
    let mut ancestors: Vec<&'a Map<String, Value>> = Vec::new();
    walk_node(root, visitor, &mut ancestors, 0, max_depth);
}

fn walk_node<'a, V: JsonVisitor<'a>>(
    node: &'a Value,
    visitor: &mut V,
    ancestors: &mut Vec<&'a Map<String, Value>>,
    depth: usize,
    max_depth: usize,
) {
    if depth > max_depth {
        visitor.depth_exceeded(depth);
        return;
    }

    match node {
        Value::Object(object) => {
            visitor.visit_object(object, ancestors);
            ancestors.push(object);
            for child in object.values() {
                walk_node(child, visitor, ancestors, depth + 1, max_depth);
            }
            ancestors.pop();
        }
        Value::Array(items) => {
            for child in items {
                walk_node(child, visitor, ancestors, depth + 1, max_depth);
            }
        }
        scalar => visitor.visit_scalar(scalar),
    }
}
