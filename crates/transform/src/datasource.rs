// Exposes an `xdt_dom::Document` to the XPath engine.
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use xdt_dom::{Document, NodeId, NodeKind};
use xdt_xpath1::{DataSourceNode, NodeType, QName};

/// Either a tree node or one attribute of an element.
///
/// Attributes are not arena nodes in `xdt_dom`, so they are addressed through
/// their owner element and their index in its attribute list.
#[derive(Debug, Clone, Copy)]
pub enum SourceNode<'a> {
    Node {
        doc: &'a Document,
        id: NodeId,
    },
    Attribute {
        doc: &'a Document,
        owner: NodeId,
        index: usize,
    },
}

impl<'a> SourceNode<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        SourceNode::Node { doc, id }
    }

    /// The document node, used as the root of absolute paths.
    pub fn root(doc: &'a Document) -> Self {
        SourceNode::Node {
            doc,
            id: doc.document_node(),
        }
    }

    /// The arena node, or `None` for attributes.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            SourceNode::Node { id, .. } => Some(*id),
            SourceNode::Attribute { .. } => None,
        }
    }

    fn doc(&self) -> &'a Document {
        match *self {
            SourceNode::Node { doc, .. } | SourceNode::Attribute { doc, .. } => doc,
        }
    }

    /// The arena node this value sits on: itself, or the owner of an attribute.
    fn anchor(&self) -> NodeId {
        match *self {
            SourceNode::Node { id, .. } => id,
            SourceNode::Attribute { owner, .. } => owner,
        }
    }
}

impl<'a> PartialEq for SourceNode<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SourceNode::Node { id: a, .. }, SourceNode::Node { id: b, .. }) => a == b,
            (
                SourceNode::Attribute {
                    owner: o1,
                    index: i1,
                    ..
                },
                SourceNode::Attribute {
                    owner: o2,
                    index: i2,
                    ..
                },
            ) => o1 == o2 && i1 == i2,
            _ => false,
        }
    }
}

impl<'a> Eq for SourceNode<'a> {}

impl<'a> PartialOrd for SourceNode<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Ord for SourceNode<'a> {
    /// Document order. An element's attributes come after the element and
    /// before its children.
    fn cmp(&self, other: &Self) -> Ordering {
        let by_anchor = self
            .doc()
            .compare_document_order(self.anchor(), other.anchor());
        if by_anchor != Ordering::Equal {
            return by_anchor;
        }
        match (self, other) {
            (SourceNode::Node { .. }, SourceNode::Node { .. }) => Ordering::Equal,
            (SourceNode::Node { .. }, SourceNode::Attribute { .. }) => Ordering::Less,
            (SourceNode::Attribute { .. }, SourceNode::Node { .. }) => Ordering::Greater,
            (
                SourceNode::Attribute { index: i1, .. },
                SourceNode::Attribute { index: i2, .. },
            ) => i1.cmp(i2),
        }
    }
}

impl<'a> Hash for SourceNode<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            SourceNode::Node { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            SourceNode::Attribute { owner, index, .. } => {
                1u8.hash(state);
                owner.hash(state);
                index.hash(state);
            }
        }
    }
}

impl<'a> DataSourceNode<'a> for SourceNode<'a> {
    fn node_type(&self) -> NodeType {
        match *self {
            SourceNode::Node { doc, id } => match doc.kind(id) {
                NodeKind::Document => NodeType::Root,
                NodeKind::Element(_) => NodeType::Element,
                NodeKind::Text(_) | NodeKind::CData(_) => NodeType::Text,
                NodeKind::Comment(_) => NodeType::Comment,
                NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
                // Hidden by `children`.
                NodeKind::DocType(_) => NodeType::Comment,
            },
            SourceNode::Attribute { .. } => NodeType::Attribute,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        match *self {
            SourceNode::Node { doc, id } => match doc.kind(id) {
                NodeKind::Element(element) => Some(QName {
                    prefix: element.name.prefix.as_deref(),
                    local_part: element.name.local.as_str(),
                }),
                NodeKind::ProcessingInstruction { target, .. } => Some(QName {
                    prefix: None,
                    local_part: target.as_str(),
                }),
                _ => None,
            },
            SourceNode::Attribute { doc, owner, index } => doc
                .element(owner)
                .and_then(|element| element.attributes.get(index))
                .map(|attr| QName {
                    prefix: attr.name.prefix.as_deref(),
                    local_part: attr.name.local.as_str(),
                }),
        }
    }

    fn string_value(&self) -> String {
        match *self {
            SourceNode::Node { doc, id } => match doc.kind(id) {
                NodeKind::Document | NodeKind::Element(_) => doc.text_content(id),
                NodeKind::Text(text)
                | NodeKind::CData(text)
                | NodeKind::Comment(text)
                | NodeKind::DocType(text) => text.clone(),
                NodeKind::ProcessingInstruction { data, .. } => data.clone(),
            },
            SourceNode::Attribute { doc, owner, index } => doc
                .element(owner)
                .and_then(|element| element.attributes.get(index))
                .map(|attr| attr.value.clone())
                .unwrap_or_default(),
        }
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let SourceNode::Node { doc, id } = *self else {
            return Box::new(std::iter::empty());
        };
        let Some(element) = doc.element(id) else {
            return Box::new(std::iter::empty());
        };
        Box::new(
            element
                .attributes
                .iter()
                .enumerate()
                .filter(|(_, attr)| !attr.name.is_namespace_declaration())
                .map(move |(index, _)| SourceNode::Attribute {
                    doc,
                    owner: id,
                    index,
                }),
        )
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        match *self {
            SourceNode::Node { doc, id } => Box::new(
                doc.children(id)
                    .iter()
                    .filter(move |&&child| !matches!(doc.kind(child), NodeKind::DocType(_)))
                    .map(move |&child| SourceNode::Node { doc, id: child }),
            ),
            SourceNode::Attribute { .. } => Box::new(std::iter::empty()),
        }
    }

    fn parent(&self) -> Option<Self> {
        match *self {
            SourceNode::Node { doc, id } => doc.parent(id).map(|p| SourceNode::Node { doc, id: p }),
            SourceNode::Attribute { doc, owner, .. } => Some(SourceNode::Node { doc, id: owner }),
        }
    }
}
