//! Applies one transform action to its located matches.
//!
//! Every action works on a snapshot of match ids taken before the first
//! mutation. Copies of transform elements are imported with their directive
//! attributes stripped, then given whatever namespace declarations they need
//! at their new position.

use crate::datasource::SourceNode;
use crate::directive::TransformAction;
use crate::error::TransformError;
use crate::options::TransformOptions;
use log::debug;
use xdt_dom::{Attribute, Document, DomError, Element, NodeId, NodeKind};
use xdt_xpath1::{EvaluationContext, Expression, select_nodes};

/// Where an action runs: the transform element that carries it and the
/// source element its siblings were located under.
#[derive(Debug, Clone, Copy)]
pub struct Site<'t> {
    pub transform: &'t Document,
    pub node: NodeId,
    pub element: &'t Element,
    pub context: NodeId,
}

impl Site<'_> {
    fn element_name(&self) -> String {
        self.element.name.to_string()
    }
}

/// Runs `action` against `matches` and returns the number of edits made.
pub fn apply(
    source: &mut Document,
    action: &TransformAction,
    matches: &[NodeId],
    site: &Site<'_>,
    options: &TransformOptions,
) -> Result<usize, TransformError> {
    let mut editor = Editor {
        doc: source,
        site,
        options,
    };
    match action {
        TransformAction::Insert => editor.insert().map(|()| 1),
        TransformAction::InsertIfMissing => {
            if matches.is_empty() {
                editor.insert().map(|()| 1)
            } else {
                debug!(
                    "InsertIfMissing on <{}>: {} match(es) already present",
                    site.element_name(),
                    matches.len()
                );
                Ok(0)
            }
        }
        TransformAction::InsertBefore(xpath) | TransformAction::InsertAfter(xpath) => {
            let references = match xpath {
                Some(expression) => editor.select_references(expression)?,
                None => matches.to_vec(),
            };
            if references.is_empty() {
                return Err(TransformError::no_match(action.name(), site.element_name()));
            }
            refuse_root(editor.doc, action, &references, site)?;
            let after = matches!(action, TransformAction::InsertAfter(_));
            for &reference in &references {
                editor.insert_adjacent(reference, after)?;
            }
            Ok(references.len())
        }
        TransformAction::Replace => {
            require_matches(action, matches, site)?;
            editor.for_each_attached(matches, |editor, target| editor.replace(target))
        }
        TransformAction::Remove => {
            require_matches(action, matches, site)?;
            refuse_root(editor.doc, action, matches, site)?;
            editor.for_each_attached(matches, |editor, target| editor.remove(target))
        }
        TransformAction::RemoveAll => {
            refuse_root(editor.doc, action, matches, site)?;
            editor.for_each_attached(matches, |editor, target| editor.remove(target))
        }
        TransformAction::SetAttributes(names) => {
            let attributes: Vec<Attribute> = editor
                .carried_attributes()
                .filter(|attr| {
                    names.is_empty() || names.iter().any(|name| attr.name.is_lexical(name))
                })
                .cloned()
                .collect();
            let mut edits = 0;
            for &target in matches {
                if let Some(element) = editor.doc.element_mut(target) {
                    for attr in &attributes {
                        element.set_attribute(attr.clone());
                        edits += 1;
                    }
                }
                editor.doc.declare_missing_namespaces(target);
            }
            Ok(edits)
        }
        TransformAction::RemoveAttributes(names) => {
            let names: Vec<String> = if names.is_empty() {
                editor
                    .carried_attributes()
                    .map(|attr| attr.name.to_string())
                    .collect()
            } else {
                names.clone()
            };
            let mut edits = 0;
            for &target in matches {
                if let Some(element) = editor.doc.element_mut(target) {
                    edits += names
                        .iter()
                        .filter_map(|name| element.remove_attribute(name))
                        .count();
                }
            }
            Ok(edits)
        }
    }
}

fn require_matches(
    action: &TransformAction,
    matches: &[NodeId],
    site: &Site<'_>,
) -> Result<(), TransformError> {
    if matches.is_empty() {
        Err(TransformError::no_match(action.name(), site.element_name()))
    } else {
        Ok(())
    }
}

/// Removals and adjacent inserts must not reach the root element.
fn refuse_root(
    doc: &Document,
    action: &TransformAction,
    targets: &[NodeId],
    site: &Site<'_>,
) -> Result<(), TransformError> {
    if targets.iter().any(|&target| doc.is_root_element(target)) {
        Err(TransformError::RootTarget {
            action: action.name().to_string(),
            element: site.element_name(),
        })
    } else {
        Ok(())
    }
}

struct Editor<'d, 's, 't> {
    doc: &'d mut Document,
    site: &'s Site<'t>,
    options: &'s TransformOptions,
}

impl Editor<'_, '_, '_> {
    /// Attributes of the transform element other than directives and
    /// namespace declarations.
    fn carried_attributes(&self) -> impl Iterator<Item = &Attribute> + '_ {
        let namespace = self.options.directive_namespace.as_str();
        self.site
            .element
            .data_attributes()
            .filter(move |attr| !attr.name.is_in_namespace(namespace))
    }

    /// Imports the transform element as a detached subtree of the source.
    fn copy(&mut self) -> NodeId {
        let namespace = self.options.directive_namespace.as_str();
        self.doc.import_subtree(self.site.transform, self.site.node, |attr| {
            !attr.name.is_in_namespace(namespace)
                && !(attr.name.is_namespace_declaration() && attr.value == namespace)
        })
    }

    fn insert(&mut self) -> Result<(), TransformError> {
        let copy = self.copy();
        let parent = self.site.context;
        match self.closing_whitespace(parent) {
            Some((indent, closing)) => {
                let text = self.doc.create_text(indent);
                self.doc.insert_before(closing, text)?;
                self.doc.insert_before(closing, copy)?;
            }
            None => self.doc.append_child(parent, copy)?,
        }
        self.doc.declare_missing_namespaces(copy);
        Ok(())
    }

    /// For an indented parent, the indentation of its first child element and
    /// the whitespace node that closes the child list.
    fn closing_whitespace(&self, parent: NodeId) -> Option<(String, NodeId)> {
        if !self.options.tidy_whitespace {
            return None;
        }
        let closing = self
            .doc
            .children(parent)
            .last()
            .copied()
            .filter(|&last| self.doc.is_whitespace_text(last))?;
        let first = self.doc.child_elements(parent).next()?;
        Some((self.indentation_before(first)?, closing))
    }

    fn indentation_before(&self, node: NodeId) -> Option<String> {
        let previous = self.doc.previous_sibling(node)?;
        match self.doc.kind(previous) {
            NodeKind::Text(text) if self.doc.is_whitespace_text(previous) => Some(text.clone()),
            _ => None,
        }
    }

    fn insert_adjacent(&mut self, reference: NodeId, after: bool) -> Result<(), TransformError> {
        let indent = if self.options.tidy_whitespace {
            self.indentation_before(reference)
        } else {
            None
        };
        let copy = self.copy();
        if after {
            self.doc.insert_after(reference, copy)?;
        } else {
            self.doc.insert_before(reference, copy)?;
        }
        if let Some(indent) = indent {
            let text = self.doc.create_text(indent);
            // Keeps the order `indent reference indent copy` for InsertAfter and
            // `indent copy indent reference` for InsertBefore.
            if after {
                self.doc.insert_after(reference, text)?;
            } else {
                self.doc.insert_before(reference, text)?;
            }
        }
        self.doc.declare_missing_namespaces(copy);
        Ok(())
    }

    fn replace(&mut self, target: NodeId) -> Result<(), DomError> {
        let copy = self.copy();
        self.doc.replace(target, copy)?;
        self.doc.declare_missing_namespaces(copy);
        Ok(())
    }

    fn remove(&mut self, target: NodeId) -> Result<(), DomError> {
        if self.options.tidy_whitespace {
            if let Some(previous) = self.doc.previous_sibling(target) {
                if self.doc.is_whitespace_text(previous) {
                    self.doc.detach(previous);
                }
            }
        }
        self.doc.detach(target);
        Ok(())
    }

    /// Runs `edit` on each match still attached to the document. Matches
    /// nested inside an earlier match are gone once that one is edited.
    fn for_each_attached<F>(
        &mut self,
        matches: &[NodeId],
        mut edit: F,
    ) -> Result<usize, TransformError>
    where
        F: FnMut(&mut Self, NodeId) -> Result<(), DomError>,
    {
        let mut edits = 0;
        for &target in matches {
            if !self.doc.is_attached(target) {
                debug!("Skipping a match detached by an earlier edit");
                continue;
            }
            edit(self, target)?;
            edits += 1;
        }
        Ok(edits)
    }

    /// Nodes selected by an `InsertBefore`/`InsertAfter` argument, evaluated
    /// from the source context.
    fn select_references(&self, expression: &Expression) -> Result<Vec<NodeId>, TransformError> {
        let doc: &Document = &*self.doc;
        let ctx = EvaluationContext::new(
            SourceNode::new(doc, self.site.context),
            SourceNode::root(doc),
        );
        let nodes = select_nodes(expression, &ctx).map_err(|source| TransformError::XPath {
            element: self.site.element_name(),
            source,
        })?;
        Ok(nodes
            .into_iter()
            .filter_map(|node| node.node_id())
            .filter(|&id| doc.parent(id).is_some())
            .collect())
    }
}
