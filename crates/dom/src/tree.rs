//! Arena-backed, mutable XML document tree.
//!
//! Every node lives in a `Vec<NodeData>` owned by the [`Document`] and is
//! addressed by a [`NodeId`]. Parent links are plain handles, children are an
//! ordered `Vec<NodeId>`, so there are no ownership cycles and a node can be
//! moved by rewriting two index lists. Detached nodes stay in the arena until
//! the document is dropped.

use crate::error::DomError;
use crate::name::{QualifiedName, XML_NAMESPACE, XMLNS_NAMESPACE};
use std::cmp::Ordering;

/// Handle to a node inside one particular [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The raw arena index. Stable for the lifetime of the document.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: QualifiedName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualifiedName,
    pub attributes: Vec<Attribute>,
    /// Whether an element without children is written as `<a/>` (true) or
    /// `<a></a>` (false).
    pub self_closing: bool,
}

impl Element {
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            self_closing: true,
        }
    }

    /// Looks up an attribute value by its lexical name (`key`, `xml:lang`).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.is_lexical(name))
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Sets an attribute, overwriting an existing one with the same expanded
    /// name in place, or appending it after the existing attributes.
    pub fn set_attribute(&mut self, attribute: Attribute) {
        match self
            .attributes
            .iter_mut()
            .find(|existing| existing.name.same_name(&attribute.name))
        {
            Some(existing) => existing.value = attribute.value,
            None => self.attributes.push(attribute),
        }
    }

    /// Removes an attribute by lexical name, returning it if it was present.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let index = self
            .attributes
            .iter()
            .position(|attr| attr.name.is_lexical(name))?;
        Some(self.attributes.remove(index))
    }

    /// Attributes that carry data, i.e. everything except namespace declarations.
    pub fn data_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes
            .iter()
            .filter(|attr| !attr.name.is_namespace_declaration())
    }
}

/// The `<?xml ...?>` declaration at the top of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: None,
            standalone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
    DocType(String),
}

impl NodeKind {
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element(_))
    }

    fn accepts_children(&self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element(_))
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An XML document: a document node owning the root element, plus the
/// top-level comments, processing instructions and whitespace around it.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    declaration: Option<XmlDeclaration>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document containing only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            declaration: None,
        }
    }

    /// Parses `text` into a document. See [`crate::parser::parse`].
    pub fn parse_str(text: &str) -> Result<Self, DomError> {
        crate::parser::parse(text)
    }

    /// Serializes the document. See [`crate::serializer::serialize`].
    pub fn to_xml_string(&self) -> String {
        crate::serializer::serialize(self)
    }

    pub fn document_node(&self) -> NodeId {
        NodeId(0)
    }

    pub fn declaration(&self) -> Option<&XmlDeclaration> {
        self.declaration.as_ref()
    }

    pub fn set_declaration(&mut self, declaration: Option<XmlDeclaration>) {
        self.declaration = declaration;
    }

    /// The single top-level element, if one has been attached.
    pub fn root_element(&self) -> Option<NodeId> {
        self.child_elements(self.document_node()).next()
    }

    /// True for an element attached directly under the document node.
    pub fn is_root_element(&self, id: NodeId) -> bool {
        self.parent(id) == Some(self.document_node()) && self.kind(id).is_element()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |&child| self.kind(child).is_element())
    }

    /// Position of `id` within its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// True when the node is reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.document_node() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// True when `ancestor` is `node` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// True for text nodes made only of XML whitespace.
    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Text(text) => text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r')),
            _ => false,
        }
    }

    /// Concatenated text and CDATA content of all descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.kind(current) {
                NodeKind::Text(text) | NodeKind::CData(text) => out.push_str(text),
                NodeKind::Document | NodeKind::Element(_) => {
                    stack.extend(self.children(current).iter().rev().copied())
                }
                _ => {}
            }
        }
        out
    }

    /// All nodes below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    // --- Node creation ---

    /// Adds a detached node to the arena.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.create_node(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Comment(text.into()))
    }

    // --- Mutation ---

    /// Moves `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Moves `child` into `parent`'s child list at `index` (clamped to the end).
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        if !self.kind(parent).accepts_children() {
            return Err(DomError::HierarchyRequest(
                "only elements and the document node can have children".to_string(),
            ));
        }
        if matches!(self.kind(child), NodeKind::Document) {
            return Err(DomError::HierarchyRequest(
                "the document node cannot be inserted".to_string(),
            ));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::HierarchyRequest(
                "a node cannot be inserted into its own subtree".to_string(),
            ));
        }
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Inserts `new` as the previous sibling of `reference`.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) -> Result<(), DomError> {
        let (parent, index) = self.sibling_slot(reference)?;
        self.insert_child(parent, index, new)
    }

    /// Inserts `new` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) -> Result<(), DomError> {
        let (parent, index) = self.sibling_slot(reference)?;
        self.insert_child(parent, index + 1, new)
    }

    /// Puts `new` where `old` is and detaches `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        self.insert_before(old, new)?;
        self.detach(old);
        Ok(())
    }

    fn sibling_slot(&self, reference: NodeId) -> Result<(NodeId, usize), DomError> {
        let parent = self.parent(reference).ok_or_else(|| {
            DomError::HierarchyRequest("reference node has no parent".to_string())
        })?;
        let index = self.index_in_parent(reference).unwrap_or(0);
        Ok((parent, index))
    }

    /// Unlinks a node (and with it its subtree) from its parent. No-op for
    /// detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Deep-copies the subtree rooted at `node` of `source` into this document's
    /// arena, keeping only the attributes accepted by `keep_attribute`. The copy
    /// is returned detached.
    pub fn import_subtree<F>(
        &mut self,
        source: &Document,
        node: NodeId,
        keep_attribute: F,
    ) -> NodeId
    where
        F: Fn(&Attribute) -> bool,
    {
        let copy_kind = |kind: &NodeKind| match kind {
            NodeKind::Element(element) => NodeKind::Element(Element {
                name: element.name.clone(),
                attributes: element
                    .attributes
                    .iter()
                    .filter(|attr| keep_attribute(*attr))
                    .cloned()
                    .collect(),
                self_closing: element.self_closing,
            }),
            other => other.clone(),
        };

        let root = self.create_node(copy_kind(source.kind(node)));
        let mut stack = vec![(node, root)];
        while let Some((src, dst)) = stack.pop() {
            for &child in source.children(src) {
                let copy = self.create_node(copy_kind(source.kind(child)));
                self.nodes[copy.0].parent = Some(dst);
                self.nodes[dst.0].children.push(copy);
                stack.push((child, copy));
            }
        }
        root
    }

    // --- Namespaces ---

    /// Resolves `prefix` (or the default namespace for `None`) as seen from
    /// `node`, walking up through ancestor declarations.
    pub fn lookup_namespace(&self, node: NodeId, prefix: Option<&str>) -> Option<String> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE.to_string());
        }
        if prefix == Some("xmlns") {
            return Some(XMLNS_NAMESPACE.to_string());
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(element) = self.element(id) {
                for attr in &element.attributes {
                    if attr.name.declared_prefix() == Some(prefix) {
                        return (!attr.value.is_empty()).then(|| attr.value.clone());
                    }
                }
            }
            current = self.parent(id);
        }
        None
    }

    /// Adds `xmlns` declarations inside the subtree at `node` wherever an element
    /// or attribute prefix would otherwise resolve to a different namespace in
    /// its current position. Used after moving nodes between documents.
    pub fn declare_missing_namespaces(&mut self, node: NodeId) {
        let mut subtree = vec![node];
        subtree.extend(self.descendants(node));

        for id in subtree {
            let Some(element) = self.element(id) else {
                continue;
            };
            let mut wanted: Vec<(Option<String>, Option<String>)> =
                vec![(element.name.prefix.clone(), element.name.namespace.clone())];
            for attr in element.data_attributes() {
                if attr.name.prefix.is_some() {
                    wanted.push((attr.name.prefix.clone(), attr.name.namespace.clone()));
                }
            }

            for (prefix, namespace) in wanted {
                if prefix.as_deref() == Some("xml") {
                    continue;
                }
                if self.lookup_namespace(id, prefix.as_deref()) == namespace {
                    continue;
                }
                let declaration = match &prefix {
                    Some(p) => QualifiedName {
                        prefix: Some("xmlns".to_string()),
                        local: p.clone(),
                        namespace: Some(XMLNS_NAMESPACE.to_string()),
                    },
                    None => QualifiedName::local("xmlns")
                        .with_namespace(Some(XMLNS_NAMESPACE.to_string())),
                };
                log::debug!(
                    "Declaring namespace {} = {:?} on moved element",
                    declaration,
                    namespace
                );
                if let Some(element) = self.element_mut(id) {
                    element.attributes.insert(
                        0,
                        Attribute::new(declaration, namespace.unwrap_or_default()),
                    );
                }
            }
        }
    }

    // --- Ordering & comparison ---

    fn ancestor_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Orders two nodes of this document by document order. Nodes in different
    /// detached fragments fall back to arena order.
    pub fn compare_document_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let path_a = self.ancestor_path(a);
        let path_b = self.ancestor_path(b);
        if path_a[0] != path_b[0] {
            return a.cmp(&b);
        }
        let common = path_a
            .iter()
            .zip(&path_b)
            .take_while(|(x, y)| x == y)
            .count();
        match (path_a.get(common), path_b.get(common)) {
            (None, _) => Ordering::Less,
            (_, None) => Ordering::Greater,
            (Some(&x), Some(&y)) => {
                let parent = path_a[common - 1];
                let siblings = self.children(parent);
                let ix = siblings.iter().position(|&c| c == x);
                let iy = siblings.iter().position(|&c| c == y);
                ix.cmp(&iy)
            }
        }
    }

    fn subtree_eq(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        if self.kind(a) != other.kind(b) {
            return false;
        }
        let left = self.children(a);
        let right = other.children(b);
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .all(|(&x, &y)| self.subtree_eq(x, other, y))
    }
}

/// Structural equality: same declaration and the same attached tree, regardless
/// of arena layout or detached leftovers.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.declaration == other.declaration
            && self.subtree_eq(self.document_node(), other, other.document_node())
    }
}
