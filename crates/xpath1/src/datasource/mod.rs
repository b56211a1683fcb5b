//! The read-only tree abstraction the evaluator runs against.
use std::hash::Hash;

/// A qualified name, consisting of an optional prefix and a local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub prefix: Option<&'a str>,
    pub local_part: &'a str,
}

/// The type of a node, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// A node in a navigable, read-only tree.
///
/// The evaluator is written exclusively against this trait, so any document
/// representation can be queried by wrapping its node handles. `Ord` must
/// follow document order; node-sets are sorted with it.
///
/// `'a` is the lifetime of the underlying document.
pub trait DataSourceNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    fn node_type(&self) -> NodeType;

    /// Element and attribute names, and the target of a processing instruction.
    /// `None` for the root, text and comment nodes.
    fn name(&self) -> Option<QName<'a>>;

    /// The XPath string-value: concatenated descendant text for elements and
    /// the root, the value for attributes, the content for everything else.
    fn string_value(&self) -> String;

    /// Attribute nodes of an element, excluding namespace declarations.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// Child nodes in document order.
    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent node. For an attribute this is its owner element.
    fn parent(&self) -> Option<Self>;
}
