//! XPath 1.0 for locating nodes in a document that implements [`DataSourceNode`].
//!
//! Expressions are parsed once into an [`Expression`] tree with `nom`, then
//! evaluated any number of times against different context nodes.

pub mod ast;
pub mod axes;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod functions;
pub mod operators;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step};
pub use datasource::{DataSourceNode, NodeType, QName};
pub use engine::{EvaluationContext, XPathValue, evaluate, select_nodes};
pub use error::XPathError;
pub use parser::parse_expression;
