//! Finds the source elements a transform element refers to.

use crate::datasource::SourceNode;
use crate::directive::Locator;
use crate::error::TransformError;
use xdt_dom::{Document, Element, NodeId, QualifiedName};
use xdt_xpath1::{EvaluationContext, Expression, XPathError, XPathValue, evaluate, select_nodes};

/// Child elements of `context` with the same expanded name as `name`, in
/// document order.
pub fn candidates(source: &Document, context: NodeId, name: &QualifiedName) -> Vec<NodeId> {
    source
        .child_elements(context)
        .filter(|&child| {
            source
                .element(child)
                .is_some_and(|element| element.name.same_name(name))
        })
        .collect()
}

/// Resolves `locator` for `transform_element` below the source `context`.
///
/// The result is a snapshot in document order; callers mutate the tree only
/// after it has been computed.
pub fn locate(
    locator: Option<&Locator>,
    source: &Document,
    context: NodeId,
    transform_element: &Element,
) -> Result<Vec<NodeId>, TransformError> {
    let xpath_error = |source: XPathError| TransformError::XPath {
        element: transform_element.name.to_string(),
        source,
    };

    match locator {
        None => Ok(candidates(source, context, &transform_element.name)),
        Some(Locator::Match(keys)) => {
            let wanted = keys
                .iter()
                .map(|key| {
                    transform_element
                        .attribute(key)
                        .map(|value| (key.as_str(), value))
                        .ok_or_else(|| TransformError::LocatorKeyMissing {
                            element: transform_element.name.to_string(),
                            key: key.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(candidates(source, context, &transform_element.name)
                .into_iter()
                .filter(|&candidate| {
                    source.element(candidate).is_some_and(|element| {
                        wanted
                            .iter()
                            .all(|(key, value)| element.attribute(key) == Some(*value))
                    })
                })
                .collect())
        }
        Some(Locator::Condition(predicate)) => {
            let found = candidates(source, context, &transform_element.name);
            filter_by_predicate(source, found, predicate).map_err(xpath_error)
        }
        Some(Locator::XPath(expression)) => {
            let root = SourceNode::root(source);
            let ctx = EvaluationContext::new(SourceNode::new(source, context), root);
            let nodes = select_nodes(expression, &ctx).map_err(xpath_error)?;
            Ok(nodes
                .into_iter()
                .filter_map(|node| node.node_id())
                .filter(|&id| source.element(id).is_some())
                .collect())
        }
    }
}

/// Keeps the candidates for which `predicate` holds, numbering them from 1
/// in document order the way a step predicate would.
fn filter_by_predicate(
    source: &Document,
    candidates: Vec<NodeId>,
    predicate: &Expression,
) -> Result<Vec<NodeId>, XPathError> {
    let root = SourceNode::root(source);
    let size = candidates.len();
    let base = EvaluationContext::new(root, root);
    let mut kept = Vec::new();
    for (i, candidate) in candidates.into_iter().enumerate() {
        let ctx = base.with_position(SourceNode::new(source, candidate), i + 1, size);
        let keep = match evaluate(predicate, &ctx)? {
            XPathValue::Number(n) => n == (i + 1) as f64,
            other => other.to_bool(),
        };
        if keep {
            kept.push(candidate);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse_locator;

    const SOURCE: &str = r#"<configuration>
  <appSettings>
    <add key="a" value="1"/>
    <add key="b" value="2"/>
    <add key="c" value="2"/>
    <remove key="a"/>
  </appSettings>
</configuration>"#;

    struct Fixture {
        doc: Document,
        settings: NodeId,
    }

    fn fixture() -> Fixture {
        let doc = Document::parse_str(SOURCE).unwrap();
        let root = doc.root_element().unwrap();
        let settings = doc.child_elements(root).next().unwrap();
        Fixture { doc, settings }
    }

    fn transform_element(xml: &str) -> Element {
        let doc = Document::parse_str(xml).unwrap();
        let root = doc.root_element().unwrap();
        doc.element(root).unwrap().clone()
    }

    fn keys(doc: &Document, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| doc.element(id).unwrap().attribute("key").unwrap().to_string())
            .collect()
    }

    fn run(locator: Option<&str>, element_xml: &str) -> Result<Vec<String>, TransformError> {
        let f = fixture();
        let element = transform_element(element_xml);
        let locator = locator.map(|l| parse_locator(l, "add").unwrap());
        let found = locate(locator.as_ref(), &f.doc, f.settings, &element)?;
        Ok(keys(&f.doc, &found))
    }

    #[test]
    fn test_no_locator_matches_by_name() {
        assert_eq!(run(None, "<add/>").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(run(None, "<remove/>").unwrap(), vec!["a"]);
        assert!(run(None, "<clear/>").unwrap().is_empty());
    }

    #[test]
    fn test_match_locator() {
        assert_eq!(
            run(Some("Match(key)"), r#"<add key="b" value="9"/>"#).unwrap(),
            vec!["b"]
        );
        assert_eq!(
            run(Some("Match(value)"), r#"<add value="2"/>"#).unwrap(),
            vec!["b", "c"]
        );
        assert!(run(Some("Match(key,value)"), r#"<add key="b" value="1"/>"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_match_locator_requires_key_on_transform_element() {
        assert_eq!(
            run(Some("Match(key)"), r#"<add value="2"/>"#),
            Err(TransformError::LocatorKeyMissing {
                element: "add".into(),
                key: "key".into()
            })
        );
    }

    #[test]
    fn test_condition_locator() {
        assert_eq!(
            run(Some("Condition(@value='2')"), "<add/>").unwrap(),
            vec!["b", "c"]
        );
        assert_eq!(run(Some("Condition(2)"), "<add/>").unwrap(), vec!["b"]);
        assert_eq!(
            run(Some("Condition(position() = last())"), "<add/>").unwrap(),
            vec!["c"]
        );
        assert!(matches!(
            run(Some("Condition(nope())"), "<add/>"),
            Err(TransformError::XPath { .. })
        ));
    }

    #[test]
    fn test_xpath_locator() {
        assert_eq!(
            run(Some("XPath(/configuration/appSettings/add[@key='c'])"), "<add/>").unwrap(),
            vec!["c"]
        );
        // Relative paths start at the source context.
        assert_eq!(
            run(Some("XPath(add[@value='2'] | remove)"), "<add/>").unwrap(),
            vec!["b", "c", "a"]
        );
        // Non-element results are dropped.
        assert!(run(Some("XPath(add/@key)"), "<add/>").unwrap().is_empty());
    }
}
