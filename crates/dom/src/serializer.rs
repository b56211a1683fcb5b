//! Writes a [`Document`] back to XML text.
//!
//! Output is a pure function of the tree: no pretty-printing is applied, the
//! whitespace text nodes recorded by the parser are written back verbatim.

use crate::name::QualifiedName;
use crate::tree::{Document, Element, NodeId, NodeKind, XmlDeclaration};
use quick_xml::escape::partial_escape;

/// Serializes the attached part of the document to a string.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    if let Some(decl) = doc.declaration() {
        write_declaration(&mut out, decl);
    }
    for &child in doc.children(doc.document_node()) {
        write_node(&mut out, doc, child);
    }
    out
}

/// Serializes a single node and its subtree.
pub fn serialize_node(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(&mut out, doc, node);
    out
}

fn push_all(out: &mut String, parts: &[&str]) {
    for part in parts {
        out.push_str(part);
    }
}

fn push_name(out: &mut String, name: &QualifiedName) {
    if let Some(prefix) = &name.prefix {
        push_all(out, &[prefix, ":"]);
    }
    out.push_str(&name.local);
}

fn write_declaration(out: &mut String, decl: &XmlDeclaration) {
    push_all(out, &["<?xml version=\"", &decl.version, "\""]);
    if let Some(encoding) = &decl.encoding {
        push_all(out, &[" encoding=\"", encoding, "\""]);
    }
    if let Some(standalone) = &decl.standalone {
        push_all(out, &[" standalone=\"", standalone, "\""]);
    }
    out.push_str("?>");
}

enum Step {
    Enter(NodeId),
    Close(NodeId),
}

fn write_node(out: &mut String, doc: &Document, node: NodeId) {
    let mut stack = vec![Step::Enter(node)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => match doc.kind(id) {
                NodeKind::Document => {
                    stack.extend(doc.children(id).iter().rev().map(|&c| Step::Enter(c)));
                }
                NodeKind::Element(element) => {
                    write_start_tag(out, element);
                    let children = doc.children(id);
                    if children.is_empty() && element.self_closing {
                        out.push_str("/>");
                    } else {
                        out.push('>');
                        stack.push(Step::Close(id));
                        stack.extend(children.iter().rev().map(|&c| Step::Enter(c)));
                    }
                }
                NodeKind::Text(text) => out.push_str(&partial_escape(text.as_str())),
                NodeKind::CData(text) => push_all(out, &["<![CDATA[", text, "]]>"]),
                NodeKind::Comment(text) => push_all(out, &["<!--", text, "-->"]),
                NodeKind::ProcessingInstruction { target, data } => {
                    if data.is_empty() {
                        push_all(out, &["<?", target, "?>"]);
                    } else {
                        push_all(out, &["<?", target, " ", data, "?>"]);
                    }
                }
                NodeKind::DocType(text) => push_all(out, &["<!DOCTYPE ", text, ">"]),
            },
            Step::Close(id) => {
                if let Some(element) = doc.element(id) {
                    out.push_str("</");
                    push_name(out, &element.name);
                    out.push('>');
                }
            }
        }
    }
}

fn write_start_tag(out: &mut String, element: &Element) {
    out.push('<');
    push_name(out, &element.name);
    for attr in &element.attributes {
        out.push(' ');
        push_name(out, &attr.name);
        out.push_str("=\"");
        escape_attribute_value(out, &attr.value);
        out.push('"');
    }
}

/// Escapes an attribute value for a double-quoted attribute. Whitespace control
/// characters are written as character references so that attribute-value
/// normalization on re-parse does not turn them into spaces.
fn escape_attribute_value(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn round_trip(input: &str) -> String {
        serialize(&parse(input).unwrap())
    }

    #[test]
    fn test_round_trip_is_textually_stable() {
        let inputs = [
            r#"<config><setting name="x" value="1"/></config>"#,
            concat!(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<configuration>\n",
                "  <!-- keep me -->\n  <appSettings>\n    <add key=\"a\" value=\"1\"/>\n",
                "  </appSettings>\n</configuration>\n"
            ),
            "<a><b></b><![CDATA[<raw>]]><?pi data?></a>",
            "<!DOCTYPE html><html lang=\"en\"/>",
        ];
        for input in inputs {
            assert_eq!(round_trip(input), input);
        }
    }

    #[test]
    fn test_escaping() {
        let output = round_trip(r#"<a v="x &amp; &quot;y&quot; &lt;">1 &lt; 2 &amp; 3</a>"#);
        assert_eq!(output, r#"<a v="x &amp; &quot;y&quot; &lt;">1 &lt; 2 &amp; 3</a>"#);
    }

    #[test]
    fn test_reparse_is_structurally_equal() {
        let input =
            "<?xml version=\"1.0\"?>\n<r xmlns:p=\"urn:p\">\n\t<p:x a=\"&#10;\">t&gt;</p:x>\n</r>";
        let first = parse(input).unwrap();
        let second = parse(&serialize(&first)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_literal_attribute_whitespace_keeps_its_meaning() {
        let input = "<a v=\"x\ny\tz\" r=\"x&#10;y\"/>";
        let output = round_trip(input);
        assert_eq!(output, "<a v=\"x y z\" r=\"x&#10;y\"/>");
        let expected = roxmltree::Document::parse(input).unwrap();
        let checked = roxmltree::Document::parse(&output).unwrap();
        for name in ["v", "r"] {
            assert_eq!(
                checked.root_element().attribute(name),
                expected.root_element().attribute(name)
            );
        }
    }

    #[test]
    fn test_output_is_accepted_by_independent_parser() {
        let input = "<root><item key=\"a&amp;b\">text &amp; more</item><!--c--></root>";
        let output = round_trip(input);
        let checked = roxmltree::Document::parse(&output).unwrap();
        let item = checked.root_element().first_element_child().unwrap();
        assert_eq!(item.attribute("key"), Some("a&b"));
        assert_eq!(item.text(), Some("text & more"));
    }

    #[test]
    fn test_serialize_node() {
        let doc = parse("<a><b x=\"1\">y</b></a>").unwrap();
        let root = doc.root_element().unwrap();
        let b = doc.child_elements(root).next().unwrap();
        assert_eq!(serialize_node(&doc, b), "<b x=\"1\">y</b>");
    }
}
