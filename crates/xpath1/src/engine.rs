//! The evaluation engine for executing a parsed XPath AST against a generic `DataSourceNode`.

use super::ast::{
    Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step, UnaryOperator,
};
use super::{axes, functions, operators};
use crate::datasource::{DataSourceNode, NodeType};
use crate::error::XPathError;
use std::fmt;

/// Represents the possible result types of an XPath expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: DataSourceNode<'a>> XPathValue<N> {
    /// Coerces the XPath value to a boolean as per XPath 1.0 rules.
    pub fn to_bool(&self) -> bool {
        match self {
            XPathValue::NodeSet(nodes) => !nodes.is_empty(),
            XPathValue::String(s) => !s.is_empty(),
            XPathValue::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathValue::Boolean(b) => *b,
        }
    }

    /// Coerces the XPath value to a number as per XPath 1.0 rules.
    pub fn to_number(&self) -> f64 {
        match self {
            XPathValue::Number(n) => *n,
            XPathValue::String(s) => string_to_number(s),
            XPathValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            XPathValue::NodeSet(nodes) => nodes
                .first()
                .map(|n| string_to_number(&n.string_value()))
                .unwrap_or(f64::NAN),
        }
    }

    /// Returns the node-set, or a type error naming `what` needed one.
    pub fn into_node_set(self, what: &str) -> Result<Vec<N>, XPathError> {
        match self {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::TypeError(format!(
                "{} must be a node-set, got {}",
                what,
                other.type_name()
            ))),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            XPathValue::NodeSet(_) => "node-set",
            XPathValue::String(_) => "string",
            XPathValue::Number(_) => "number",
            XPathValue::Boolean(_) => "boolean",
        }
    }
}

impl<'a, N: DataSourceNode<'a>> fmt::Display for XPathValue<N> {
    /// Coerces the XPath value to a string as per XPath 1.0 rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPathValue::NodeSet(nodes) => write!(
                f,
                "{}",
                nodes.first().map(|n| n.string_value()).unwrap_or_default()
            ),
            XPathValue::String(s) => write!(f, "{}", s),
            XPathValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            XPathValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// `number()` applied to a string: optional whitespace, an optional minus
/// sign, digits with an optional fraction. Anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let well_formed = unsigned.chars().any(|c| c.is_ascii_digit())
        && unsigned.chars().all(|c| c.is_ascii_digit() || c == '.')
        && unsigned.matches('.').count() <= 1;
    if well_formed {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// The state an expression is evaluated in.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<N> {
    pub context_node: N,
    pub root_node: N,
    pub context_position: usize, // 1-based index
    pub context_size: usize,
}

impl<'a, N: DataSourceNode<'a>> EvaluationContext<N> {
    pub fn new(context_node: N, root_node: N) -> Self {
        Self {
            context_node,
            root_node,
            context_position: 1,
            context_size: 1,
        }
    }

    /// A context for one node of a node-set being filtered.
    pub fn with_position(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            root_node: self.root_node,
            context_position: position,
            context_size: size,
        }
    }
}

/// Evaluates a compiled expression and returns a concrete `XPathValue`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::LocationPath(path) => {
            let nodes = evaluate_location_path(path, e_ctx)?;
            Ok(XPathValue::NodeSet(nodes))
        }
        Expression::FunctionCall { name, args } => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, e_ctx)?);
            }
            functions::evaluate_function(name, evaluated_args, e_ctx)
        }
        Expression::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => Ok(XPathValue::Boolean(
            evaluate(left, e_ctx)?.to_bool() && evaluate(right, e_ctx)?.to_bool(),
        )),
        Expression::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => Ok(XPathValue::Boolean(
            evaluate(left, e_ctx)?.to_bool() || evaluate(right, e_ctx)?.to_bool(),
        )),
        Expression::BinaryOp { left, op, right } => {
            let left_val = evaluate(left, e_ctx)?;
            let right_val = evaluate(right, e_ctx)?;
            operators::evaluate(*op, left_val, right_val)
        }
        Expression::UnaryOp { op, expr } => {
            let val = evaluate(expr, e_ctx)?;
            match op {
                UnaryOperator::Minus => Ok(XPathValue::Number(-val.to_number())),
            }
        }
        Expression::Filter { expr, predicates } => {
            let nodes = evaluate(expr, e_ctx)?.into_node_set("A filtered expression")?;
            Ok(XPathValue::NodeSet(apply_predicates(nodes, predicates, e_ctx)?))
        }
    }
}

/// Evaluates an expression that must produce a node-set, returned in document order.
pub fn select_nodes<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    evaluate(expr, e_ctx)?.into_node_set("The expression")
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    e_ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut current_nodes = if let Some(start_expr) = &path.start_point {
        evaluate(start_expr, e_ctx)?.into_node_set("The start of a path")?
    } else if path.is_absolute {
        vec![e_ctx.root_node]
    } else {
        vec![e_ctx.context_node]
    };

    for step in &path.steps {
        current_nodes = evaluate_step(step, &current_nodes, e_ctx)?;
    }
    Ok(current_nodes)
}

/// Evaluates one step from every context node and merges the results into
/// document order without duplicates.
fn evaluate_step<'a, N>(
    step: &Step,
    context_nodes: &[N],
    e_ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut merged = Vec::new();
    for &node in context_nodes {
        let tested: Vec<N> = axes::collect(step.axis, node)
            .into_iter()
            .filter(|candidate| matches_node_test(candidate, &step.node_test, step.axis))
            .collect();
        merged.extend(apply_predicates(tested, &step.predicates, e_ctx)?);
    }
    merged.sort();
    merged.dedup();
    Ok(merged)
}

fn matches_node_test<'a, N>(node: &N, test: &NodeTest, axis: Axis) -> bool
where
    N: DataSourceNode<'a>,
{
    let principal = if axis == Axis::Attribute {
        NodeType::Attribute
    } else {
        NodeType::Element
    };
    match test {
        NodeTest::Wildcard => node.node_type() == principal,
        NodeTest::PrefixWildcard(prefix) => {
            node.node_type() == principal
                && node.name().is_some_and(|q| q.prefix == Some(prefix.as_str()))
        }
        NodeTest::Name { prefix, local } => {
            node.node_type() == principal
                && node.name().is_some_and(|q| {
                    q.local_part == local
                        && prefix.as_deref().is_none_or(|p| q.prefix == Some(p))
                })
        }
        NodeTest::NodeType(ntt) => match ntt {
            NodeTypeTest::Text => node.node_type() == NodeType::Text,
            NodeTypeTest::Comment => node.node_type() == NodeType::Comment,
            NodeTypeTest::ProcessingInstruction => {
                node.node_type() == NodeType::ProcessingInstruction
            }
            NodeTypeTest::Node => true,
        },
    }
}

/// Filters `nodes` by each predicate in turn. Positions count in the order
/// the nodes are given.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: DataSourceNode<'a> + 'a,
{
    let mut final_nodes = nodes;
    for predicate in predicates {
        let context_size = final_nodes.len();
        let mut kept = Vec::with_capacity(context_size);
        for (i, node) in final_nodes.iter().enumerate() {
            let predicate_ctx = e_ctx.with_position(*node, i + 1, context_size);
            let keep = match evaluate(predicate, &predicate_ctx)? {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_bool(),
            };
            if keep {
                kept.push(*node);
            }
        }
        final_nodes = kept;
    }
    Ok(final_nodes)
}
