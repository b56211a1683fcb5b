//! Walks the transform document and drives location and interpretation.
//!
//! The walk is depth-first over an explicit stack. A transform element
//! without a `Transform` directive only steers the walk: its counterparts in
//! the source become the context for its children. An element with a
//! `Transform` directive is located and interpreted, and its children are
//! never visited on their own.

use crate::directive::read_directives;
use crate::error::{DocumentRole, TransformError};
use crate::interpreter::{self, Site};
use crate::locator::locate;
use crate::options::{ErrorPolicy, TransformOptions};
use log::{debug, info, warn};
use xdt_dom::{Document, DomError, NodeId};

/// Result of a run that was not aborted: the serialized source plus the
/// directive errors that were collected along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    pub output: String,
    pub diagnostics: Vec<TransformError>,
}

impl TransformOutcome {
    /// True when every directive applied.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

enum Frame {
    /// Pair each child element of `transform` with the source `counterpart`.
    Descend { transform: NodeId, counterpart: NodeId },
    /// Locate `transform` below the source `context` and either act on it or
    /// descend into its counterparts.
    Visit { transform: NodeId, context: NodeId },
}

#[derive(Debug, Default)]
struct RunStats {
    applied: usize,
    edits: usize,
    skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Transformer {
    options: TransformOptions,
}

impl Transformer {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Parses both documents, applies the transform and serializes the result.
    pub fn run(&self, source: &str, transform: &str) -> Result<TransformOutcome, TransformError> {
        let mut source = Document::parse_str(source).map_err(|e| TransformError::MalformedDocument {
            role: DocumentRole::Source,
            source: e,
        })?;
        let transform =
            Document::parse_str(transform).map_err(|e| TransformError::MalformedDocument {
                role: DocumentRole::Transform,
                source: e,
            })?;
        let diagnostics = self.apply(&mut source, &transform)?;
        Ok(TransformOutcome {
            output: source.to_xml_string(),
            diagnostics,
        })
    }

    /// Applies `transform` to `source` in place.
    ///
    /// Returns the collected directive errors. Fatal errors, and with
    /// [`ErrorPolicy::FailFast`] the first directive error, are returned as
    /// `Err`; nothing is mutated when the roots do not match.
    pub fn apply(
        &self,
        source: &mut Document,
        transform: &Document,
    ) -> Result<Vec<TransformError>, TransformError> {
        let missing_root = |role| TransformError::MalformedDocument {
            role,
            source: DomError::MissingRoot,
        };
        let source_root = source
            .root_element()
            .ok_or_else(|| missing_root(DocumentRole::Source))?;
        let transform_root = transform
            .root_element()
            .ok_or_else(|| missing_root(DocumentRole::Transform))?;
        let (Some(source_element), Some(transform_element)) =
            (source.element(source_root), transform.element(transform_root))
        else {
            return Err(missing_root(DocumentRole::Source));
        };
        if !source_element.name.same_name(&transform_element.name) {
            return Err(TransformError::RootMismatch {
                source_root: source_element.name.to_string(),
                transform: transform_element.name.to_string(),
            });
        }

        let mut stats = RunStats::default();
        let mut diagnostics = Vec::new();
        let mut stack = vec![Frame::Descend {
            transform: transform_root,
            counterpart: source_root,
        }];

        while let Some(frame) = stack.pop() {
            let result = match frame {
                Frame::Descend {
                    transform: parent,
                    counterpart,
                } => {
                    let children: Vec<NodeId> = transform.child_elements(parent).collect();
                    stack.extend(children.into_iter().rev().map(|child| Frame::Visit {
                        transform: child,
                        context: counterpart,
                    }));
                    Ok(())
                }
                Frame::Visit {
                    transform: node,
                    context,
                } => self.visit(source, transform, node, context, &mut stack, &mut stats),
            };

            if let Err(error) = result {
                match self.options.error_policy {
                    ErrorPolicy::FailFast => {
                        warn!("Stopping at the first failed directive: {}", error);
                        return Err(error);
                    }
                    ErrorPolicy::Collect => {
                        warn!("Skipping directive: {}", error);
                        diagnostics.push(error);
                    }
                }
            }
        }

        info!(
            "Applied {} directive(s) with {} edit(s); {} element(s) without counterpart, {} failed",
            stats.applied,
            stats.edits,
            stats.skipped,
            diagnostics.len()
        );
        Ok(diagnostics)
    }

    fn visit(
        &self,
        source: &mut Document,
        transform: &Document,
        node: NodeId,
        context: NodeId,
        stack: &mut Vec<Frame>,
        stats: &mut RunStats,
    ) -> Result<(), TransformError> {
        let Some(element) = transform.element(node) else {
            return Ok(());
        };
        let directives = read_directives(element, &self.options.directive_namespace)?;
        let matches = locate(directives.locator.as_ref(), source, context, element)?;

        match directives.action {
            Some(action) => {
                debug!(
                    "{} on <{}>: {} match(es)",
                    action.name(),
                    element.name,
                    matches.len()
                );
                let site = Site {
                    transform,
                    node,
                    element,
                    context,
                };
                stats.edits += interpreter::apply(source, &action, &matches, &site, &self.options)?;
                stats.applied += 1;
            }
            None if matches.is_empty() => {
                debug!("No counterpart for <{}>, skipping its subtree", element.name);
                stats.skipped += 1;
            }
            None => {
                stack.extend(matches.into_iter().rev().map(|counterpart| Frame::Descend {
                    transform: node,
                    counterpart,
                }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::XDT_NAMESPACE;

    fn transform_doc(body: &str) -> String {
        format!(
            "<configuration xmlns:xdt=\"{}\">{}</configuration>",
            XDT_NAMESPACE, body
        )
    }

    const SOURCE: &str = concat!(
        r#"<configuration><appSettings><add key="a" value="1"/><add key="b" value="2"/>"#,
        r#"</appSettings><system.web><compilation debug="true"/></system.web></configuration>"#
    );

    fn run(options: TransformOptions, body: &str) -> Result<TransformOutcome, TransformError> {
        Transformer::new(options).run(SOURCE, &transform_doc(body))
    }

    #[test]
    fn test_descend_then_act() {
        let outcome = run(
            TransformOptions::default(),
            concat!(
                r#"<system.web><compilation xdt:Transform="RemoveAttributes(debug)"/></system.web>"#,
                r#"<appSettings><add key="b" value="9" xdt:Transform="SetAttributes""#,
                r#" xdt:Locator="Match(key)"/></appSettings>"#
            ),
        )
        .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(
            outcome.output,
            concat!(
                r#"<configuration><appSettings><add key="a" value="1"/><add key="b" value="9"/>"#,
                r#"</appSettings><system.web><compilation/></system.web></configuration>"#
            )
        );
    }

    #[test]
    fn test_element_without_counterpart_is_skipped() {
        let outcome = run(
            TransformOptions::default(),
            r#"<connectionStrings><add xdt:Transform="Remove"/></connectionStrings>"#,
        )
        .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(outcome.output, SOURCE);
    }

    #[test]
    fn test_locator_on_descend_narrows_counterparts() {
        let source = r#"<root><group name="x"><item/></group><group name="y"><item/></group></root>"#;
        let transform = format!(
            concat!(
                r#"<root xmlns:xdt="{}"><group name="y" xdt:Locator="Match(name)">"#,
                r#"<item xdt:Transform="Remove"/></group></root>"#
            ),
            XDT_NAMESPACE
        );
        let outcome = Transformer::default().run(source, &transform).unwrap();
        assert_eq!(
            outcome.output,
            r#"<root><group name="x"><item/></group><group name="y"></group></root>"#
        );
    }

    #[test]
    fn test_errors_are_collected_and_the_rest_applies() {
        let outcome = run(
            TransformOptions::default(),
            concat!(
                r#"<appSettings><add key="z" xdt:Transform="Remove" xdt:Locator="Match(key)"/>"#,
                r#"<add xdt:Transform="Upsert"/><add key="c" xdt:Transform="Insert"/></appSettings>"#
            ),
        )
        .unwrap();
        assert_eq!(
            outcome.diagnostics,
            vec![
                TransformError::NoMatchFound {
                    action: "Remove".into(),
                    element: "add".into()
                },
                TransformError::UnsupportedAction("Upsert".into()),
            ]
        );
        assert!(outcome.output.contains(r#"<add key="c"/></appSettings>"#));
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let result = run(
            TransformOptions::default().fail_fast(),
            r#"<appSettings><add xdt:Transform="Replace" xdt:Locator="Match(key)"/></appSettings>"#,
        );
        assert_eq!(
            result,
            Err(TransformError::LocatorKeyMissing {
                element: "add".into(),
                key: "key".into()
            })
        );
    }

    #[test]
    fn test_root_mismatch_leaves_source_untouched() {
        let mut source = Document::parse_str(SOURCE).unwrap();
        let before = source.clone();
        let transform = Document::parse_str(&format!(
            r#"<settings xmlns:xdt="{}"><add xdt:Transform="Insert"/></settings>"#,
            XDT_NAMESPACE
        ))
        .unwrap();
        let result = Transformer::default().apply(&mut source, &transform);
        assert!(matches!(result, Err(TransformError::RootMismatch { .. })));
        assert_eq!(source, before);
    }

    #[test]
    fn test_malformed_input_reports_role() {
        let result = Transformer::default().run(SOURCE, "<configuration>");
        assert!(matches!(
            result,
            Err(TransformError::MalformedDocument {
                role: DocumentRole::Transform,
                ..
            })
        ));
        let result = Transformer::default().run("not xml", &transform_doc(""));
        assert!(matches!(
            result,
            Err(TransformError::MalformedDocument {
                role: DocumentRole::Source,
                ..
            })
        ));
    }

    #[test]
    fn test_custom_directive_namespace() {
        let options = TransformOptions {
            directive_namespace: "urn:custom".to_string(),
            ..TransformOptions::default()
        };
        let transform =
            r#"<configuration xmlns:t="urn:custom"><appSettings t:Transform="RemoveAll"/></configuration>"#;
        let outcome = Transformer::new(options).run(SOURCE, transform).unwrap();
        assert_eq!(
            outcome.output,
            r#"<configuration><system.web><compilation debug="true"/></system.web></configuration>"#
        );
    }
}
