//! Comparison, arithmetic and union operators.
//!
//! `and` and `or` are short-circuited by the engine; they are handled here
//! only for completeness when both operands are already evaluated.

use crate::ast::BinaryOperator;
use crate::datasource::DataSourceNode;
use crate::engine::XPathValue;
use crate::error::XPathError;

pub fn evaluate<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    let result = match op {
        BinaryOperator::Or => XPathValue::Boolean(left.to_bool() || right.to_bool()),
        BinaryOperator::And => XPathValue::Boolean(left.to_bool() && right.to_bool()),
        BinaryOperator::Equals
        | BinaryOperator::NotEquals
        | BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => XPathValue::Boolean(compare(op, &left, &right)),
        BinaryOperator::Plus => XPathValue::Number(left.to_number() + right.to_number()),
        BinaryOperator::Minus => XPathValue::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiply => XPathValue::Number(left.to_number() * right.to_number()),
        BinaryOperator::Divide => XPathValue::Number(left.to_number() / right.to_number()),
        // f64 `%` truncates towards zero and keeps the dividend's sign, as `mod` requires.
        BinaryOperator::Modulo => XPathValue::Number(left.to_number() % right.to_number()),
        BinaryOperator::Union => {
            let mut nodes = left.into_node_set("The left operand of '|'")?;
            nodes.extend(right.into_node_set("The right operand of '|'")?);
            nodes.sort();
            nodes.dedup();
            XPathValue::NodeSet(nodes)
        }
    };
    Ok(result)
}

/// Compares two values. A node-set compares true if any of its members does.
fn compare<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    use XPathValue::{Boolean, NodeSet};
    match (left, right) {
        (NodeSet(l), NodeSet(r)) => {
            let right_values: Vec<XPathValue<N>> =
                r.iter().map(|n| XPathValue::String(n.string_value())).collect();
            l.iter().any(|a| {
                let a = XPathValue::String(a.string_value());
                right_values.iter().any(|b| compare_atomic(op, &a, b))
            })
        }
        (NodeSet(l), Boolean(_)) => compare_atomic(op, &Boolean(!l.is_empty()), right),
        (Boolean(_), NodeSet(r)) => compare_atomic(op, left, &Boolean(!r.is_empty())),
        (NodeSet(l), other) => l
            .iter()
            .any(|n| compare_atomic(op, &XPathValue::String(n.string_value()), other)),
        (other, NodeSet(r)) => r
            .iter()
            .any(|n| compare_atomic(op, other, &XPathValue::String(n.string_value()))),
        _ => compare_atomic(op, left, right),
    }
}

fn compare_atomic<'a, N: DataSourceNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    let is_bool = |v: &XPathValue<N>| matches!(v, XPathValue::Boolean(_));
    let is_number = |v: &XPathValue<N>| matches!(v, XPathValue::Number(_));
    match op {
        BinaryOperator::Equals | BinaryOperator::NotEquals => {
            let equal = if is_bool(left) || is_bool(right) {
                left.to_bool() == right.to_bool()
            } else if is_number(left) || is_number(right) {
                left.to_number() == right.to_number()
            } else {
                left.to_string() == right.to_string()
            };
            (op == BinaryOperator::Equals) == equal
        }
        BinaryOperator::LessThan => left.to_number() < right.to_number(),
        BinaryOperator::LessThanOrEqual => left.to_number() <= right.to_number(),
        BinaryOperator::GreaterThan => left.to_number() > right.to_number(),
        BinaryOperator::GreaterThanOrEqual => left.to_number() >= right.to_number(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::{MockNode, create_test_tree};

    type Value<'a> = XPathValue<MockNode<'a>>;

    #[test]
    fn test_scalar_equality_rules() {
        let eq = |l: Value<'static>, r: Value<'static>| evaluate(BinaryOperator::Equals, l, r).unwrap();
        assert_eq!(
            eq(XPathValue::String("1.0".into()), XPathValue::Number(1.0)),
            XPathValue::Boolean(true)
        );
        assert_eq!(
            eq(XPathValue::String("abc".into()), XPathValue::Boolean(true)),
            XPathValue::Boolean(true)
        );
        assert_eq!(
            eq(XPathValue::String("1.0".into()), XPathValue::String("1".into())),
            XPathValue::Boolean(false)
        );
    }

    #[test]
    fn test_nan_is_unequal_to_itself() {
        let nan = || -> Value { XPathValue::Number(f64::NAN) };
        assert_eq!(
            evaluate(BinaryOperator::NotEquals, nan(), nan()).unwrap(),
            XPathValue::Boolean(true)
        );
        assert_eq!(
            evaluate(BinaryOperator::Equals, nan(), nan()).unwrap(),
            XPathValue::Boolean(false)
        );
    }

    #[test]
    fn test_node_set_comparisons() {
        let tree = create_test_tree();
        let keys: Value = XPathValue::NodeSet(vec![tree.node(4), tree.node(7)]);
        let values: Value = XPathValue::NodeSet(vec![tree.node(5), tree.node(8)]);
        let empty: Value = XPathValue::NodeSet(vec![]);

        let cmp = |op, l: &_, r| evaluate(op, Clone::clone(l), r).unwrap();
        assert_eq!(
            cmp(BinaryOperator::Equals, &keys, XPathValue::String("b".into())),
            XPathValue::Boolean(true)
        );
        // Both `=` and `!=` hold when members differ.
        assert_eq!(
            cmp(BinaryOperator::NotEquals, &keys, XPathValue::String("b".into())),
            XPathValue::Boolean(true)
        );
        assert_eq!(
            cmp(BinaryOperator::LessThan, &values, XPathValue::Number(2.0)),
            XPathValue::Boolean(true)
        );
        assert_eq!(
            cmp(BinaryOperator::Equals, &keys, values.clone()),
            XPathValue::Boolean(false)
        );
        assert_eq!(
            cmp(BinaryOperator::Equals, &empty, XPathValue::Boolean(false)),
            XPathValue::Boolean(true)
        );
        assert_eq!(
            cmp(BinaryOperator::Equals, &empty, XPathValue::String("".into())),
            XPathValue::Boolean(false)
        );
    }

    #[test]
    fn test_union_requires_node_sets() {
        let tree = create_test_tree();
        let nodes: Value = XPathValue::NodeSet(vec![tree.node(6)]);
        let result = evaluate(BinaryOperator::Union, nodes, XPathValue::Number(1.0));
        assert!(matches!(result, Err(XPathError::TypeError(_))));
    }
}
