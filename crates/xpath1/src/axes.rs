//! Pure functions for collecting nodes along each XPath axis.
//!
//! Every collector appends in axis order: document order for forward axes,
//! nearest-first for reverse axes. Proximity positions in predicates are
//! counted in this order.

use crate::ast::Axis;
use crate::datasource::{DataSourceNode, NodeType};

/// Collects the nodes on `axis` from a single context node.
pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N) -> Vec<N> {
    let mut results = Vec::new();
    match axis {
        Axis::Child => collect_child_nodes(node, &mut results),
        Axis::Attribute => collect_attribute_nodes(node, &mut results),
        Axis::Descendant => collect_descendant_nodes(node, &mut results),
        Axis::DescendantOrSelf => collect_descendant_or_self_nodes(node, &mut results),
        Axis::Parent => results.extend(node.parent()),
        Axis::Ancestor => collect_ancestor_nodes(node, &mut results),
        Axis::AncestorOrSelf => {
            results.push(node);
            collect_ancestor_nodes(node, &mut results);
        }
        Axis::SelfAxis => results.push(node),
        Axis::FollowingSibling => collect_following_sibling_nodes(node, &mut results),
        Axis::PrecedingSibling => collect_preceding_sibling_nodes(node, &mut results),
        Axis::Following => collect_following_nodes(node, &mut results),
        Axis::Preceding => collect_preceding_nodes(node, &mut results),
    }
    results
}

fn has_siblings<'a, N: DataSourceNode<'a>>(node: N) -> bool {
    !matches!(node.node_type(), NodeType::Attribute | NodeType::Root)
}

pub fn collect_child_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.children());
}

pub fn collect_attribute_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    if node.node_type() == NodeType::Element {
        results.extend(node.attributes());
    }
}

/// Pre-order walk below `node`.
pub fn collect_descendant_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        results.push(current);
        let start = stack.len();
        stack.extend(current.children());
        stack[start..].reverse();
    }
}

pub fn collect_descendant_or_self_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    results.push(node);
    collect_descendant_nodes(node, results);
}

pub fn collect_ancestor_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        results.push(p);
        current = p.parent();
    }
}

pub fn collect_following_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    if !has_siblings(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        results.extend(parent.children().skip_while(|s| *s != node).skip(1));
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: DataSourceNode<'a>>(
    node: N,
    results: &mut Vec<N>,
) {
    if !has_siblings(node) {
        return;
    }
    if let Some(parent) = node.parent() {
        let mut siblings: Vec<N> = parent.children().take_while(|s| *s != node).collect();
        siblings.reverse();
        results.extend(siblings);
    }
}

/// Everything after `node` in document order, excluding its descendants.
pub fn collect_following_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    if node.node_type() == NodeType::Attribute {
        // The owner element's content follows its attributes.
        match node.parent() {
            Some(owner) => {
                collect_descendant_nodes(owner, results);
                current = owner;
            }
            None => return,
        }
    }
    let mut next = Some(current);
    while let Some(c) = next {
        if has_siblings(c) {
            if let Some(p) = c.parent() {
                for sibling in p.children().skip_while(|s| *s != c).skip(1) {
                    collect_descendant_or_self_nodes(sibling, results);
                }
            }
        }
        next = c.parent();
    }
}

/// Everything before `node` in document order, excluding its ancestors,
/// nearest first.
pub fn collect_preceding_nodes<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut in_order = Vec::new();
    let mut next = if node.node_type() == NodeType::Attribute {
        node.parent()
    } else {
        Some(node)
    };
    let mut chain = Vec::new();
    while let Some(c) = next {
        chain.push(c);
        next = c.parent();
    }
    // Walk from the top so that `in_order` ends up in document order.
    for &c in chain.iter().rev() {
        if !has_siblings(c) {
            continue;
        }
        if let Some(p) = c.parent() {
            for sibling in p.children().take_while(|s| *s != c) {
                collect_descendant_or_self_nodes(sibling, &mut in_order);
            }
        }
    }
    in_order.reverse();
    results.extend(in_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, create_test_tree};

    fn ids(nodes: &[MockNode<'_>]) -> Vec<usize> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_collect_child() {
        let tree = create_test_tree();
        let nodes = collect(Axis::Child, tree.node(2));
        assert_eq!(ids(&nodes), vec![3, 6, 9]);
    }

    #[test]
    fn test_collect_attribute_only_on_elements() {
        let tree = create_test_tree();
        assert_eq!(ids(&collect(Axis::Attribute, tree.node(3))), vec![4, 5]);
        assert!(collect(Axis::Attribute, tree.node(9)).is_empty());
    }

    #[test]
    fn test_collect_descendant_in_document_order() {
        let tree = create_test_tree();
        let nodes = collect(Axis::Descendant, tree.root());
        assert_eq!(ids(&nodes), vec![1, 2, 3, 6, 9, 10, 11, 13, 14]);
        let with_self = collect(Axis::DescendantOrSelf, tree.node(10));
        assert_eq!(ids(&with_self), vec![10, 11]);
    }

    #[test]
    fn test_collect_ancestor_nearest_first() {
        let tree = create_test_tree();
        let nodes = collect(Axis::Ancestor, tree.node(4));
        assert_eq!(ids(&nodes), vec![3, 2, 1, 0]);
        let with_self = collect(Axis::AncestorOrSelf, tree.node(3));
        assert_eq!(ids(&with_self), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_collect_siblings() {
        let tree = create_test_tree();
        let following = collect(Axis::FollowingSibling, tree.node(3));
        assert_eq!(ids(&following), vec![6, 9]);
        let preceding = collect(Axis::PrecedingSibling, tree.node(9));
        assert_eq!(ids(&preceding), vec![6, 3]);
        assert!(collect(Axis::PrecedingSibling, tree.node(5)).is_empty());
    }

    #[test]
    fn test_collect_following_preceding() {
        let tree = create_test_tree();
        let following = collect(Axis::Following, tree.node(6));
        assert_eq!(ids(&following), vec![9, 10, 11, 13, 14]);

        let preceding = collect(Axis::Preceding, tree.node(10));
        assert_eq!(ids(&preceding), vec![9, 6, 3, 2]);

        // An attribute's following axis starts with its owner's content.
        let from_attribute = collect(Axis::Following, tree.node(12));
        assert_eq!(ids(&from_attribute), vec![13, 14]);
    }
}
