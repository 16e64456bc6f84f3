//! Condition trees for WHERE and HAVING clauses.
//!
//! A tree is an ordered list of boolean-connected nodes. A leaf holds one
//! opaque predicate fragment plus its named parameters; a group holds a
//! parenthesized child list. Nodes accumulate into whichever buffer is
//! current (the root, or the innermost open group), which is what lets
//! nested closure-style grouping compose to arbitrary depth.

use crate::params::Params;

/// Boolean connector between adjacent nodes.
///
/// The connector of the first node in any list is ignored: no operator
/// precedes the first predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// One node of a condition tree.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionNode {
    /// An opaque predicate fragment, e.g. `age > :age`.
    Leaf {
        connector: Connector,
        fragment: String,
        params: Params,
    },
    /// A parenthesized, boolean-connected list of child nodes.
    Group {
        connector: Connector,
        children: Vec<ConditionNode>,
    },
}

/// Open group buffer: nodes pushed while the group is the innermost one.
#[derive(Clone, Debug)]
struct OpenGroup {
    connector: Connector,
    nodes: Vec<ConditionNode>,
}

/// Ordered condition tree with an owned insertion cursor.
///
/// `begin_group` pushes a fresh child buffer; `end_group` pops it and appends
/// the accumulated children as a single group node to the parent buffer. A
/// group that ends with zero children is dropped silently. The tree is read
/// by the compiler through [`ConditionTree::nodes`] and never mutated after
/// compilation begins.
#[derive(Clone, Debug, Default)]
pub struct ConditionTree {
    root: Vec<ConditionNode>,
    open: Vec<OpenGroup>,
}

impl ConditionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.open.iter().all(|g| g.nodes.is_empty())
    }

    /// Append a leaf to the current insertion point.
    ///
    /// Empty fragments are dropped, matching the builder contract that blank
    /// input is a no-op rather than an error.
    pub fn push_leaf(&mut self, connector: Connector, fragment: impl Into<String>, params: Params) {
        let fragment = fragment.into();
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }

        self.push_node(ConditionNode::Leaf {
            connector,
            fragment: fragment.to_string(),
            params,
        });
    }

    /// Open a new group; subsequent nodes accumulate inside it.
    pub fn begin_group(&mut self, connector: Connector) {
        self.open.push(OpenGroup {
            connector,
            nodes: Vec::new(),
        });
    }

    /// Close the innermost group, appending it to the parent buffer.
    ///
    /// Panics on unbalanced pop; the closure-based builder API always pairs
    /// `begin_group`/`end_group`, so this can only fire on an internal bug.
    pub fn end_group(&mut self) {
        let group = match self.open.pop() {
            Some(g) => g,
            None => panic!("end_group without matching begin_group"),
        };

        if group.nodes.is_empty() {
            return;
        }

        self.push_node(ConditionNode::Group {
            connector: group.connector,
            children: group.nodes,
        });
    }

    fn push_node(&mut self, node: ConditionNode) {
        match self.open.last_mut() {
            Some(group) => group.nodes.push(node),
            None => self.root.push(node),
        }
    }

    /// Snapshot of the accumulated top-level nodes.
    pub fn nodes(&self) -> &[ConditionNode] {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    #[test]
    fn pushes_leaves_in_order() {
        let mut tree = ConditionTree::new();
        tree.push_leaf(Connector::And, "a = 1", Params::new());
        tree.push_leaf(Connector::Or, "b = 2", Params::new());

        match &tree.nodes()[1] {
            ConditionNode::Leaf { connector, fragment, .. } => {
                assert_eq!(*connector, Connector::Or);
                assert_eq!(fragment, "b = 2");
            }
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[test]
    fn drops_blank_fragments() {
        let mut tree = ConditionTree::new();
        tree.push_leaf(Connector::And, "   ", Params::new());
        assert!(tree.is_empty());
    }

    #[test]
    fn group_collects_children() {
        let mut tree = ConditionTree::new();
        tree.push_leaf(Connector::And, "a = 1", Params::new());
        tree.begin_group(Connector::Or);
        tree.push_leaf(Connector::And, "b = 2", Params::new());
        tree.push_leaf(Connector::Or, "c = 3", Params::new());
        tree.end_group();

        assert_eq!(tree.nodes().len(), 2);
        match &tree.nodes()[1] {
            ConditionNode::Group { connector, children } => {
                assert_eq!(*connector, Connector::Or);
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn empty_group_is_dropped() {
        let mut tree = ConditionTree::new();
        tree.begin_group(Connector::And);
        tree.end_group();
        assert!(tree.is_empty());
        assert!(tree.nodes().is_empty());
    }

    #[test]
    fn nested_groups_attach_to_innermost() {
        let mut tree = ConditionTree::new();
        tree.begin_group(Connector::And);
        tree.push_leaf(Connector::And, "a", Params::new());
        tree.begin_group(Connector::Or);
        tree.push_leaf(Connector::And, "b", params! { "b" => 1 });
        tree.end_group();
        tree.end_group();

        match &tree.nodes()[0] {
            ConditionNode::Group { children, .. } => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[1], ConditionNode::Group { .. }));
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "end_group without matching begin_group")]
    fn unbalanced_pop_panics() {
        let mut tree = ConditionTree::new();
        tree.end_group();
    }
}
