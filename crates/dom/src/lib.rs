pub mod error;
pub mod name;
pub mod parser;
pub mod serializer;
pub mod tree;

pub use error::{DomError, Location};
pub use name::{QualifiedName, XML_NAMESPACE, XMLNS_NAMESPACE};
pub use parser::parse;
pub use serializer::{serialize, serialize_node};
pub use tree::{Attribute, Document, Element, NodeId, NodeKind, XmlDeclaration};
