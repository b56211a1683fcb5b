#![allow(dead_code)]

use std::path::PathBuf;
use xdt::{Document, XDT_NAMESPACE};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e))
}

/// Wraps `body` in a transform root named `root` that binds the `t` prefix to
/// the XDT namespace.
pub fn xdt_transform(root: &str, body: &str) -> String {
    format!(r#"<{root} xmlns:t="{XDT_NAMESPACE}">{body}</{root}>"#)
}

/// Parses `xml` with an independent parser and panics if it is not well-formed.
pub fn assert_well_formed(xml: &str) {
    if let Err(e) = roxmltree::Document::parse(xml) {
        panic!("Output is not well-formed XML ({}):\n{}", e, xml);
    }
}

/// Number of element children of the first element named `name`.
pub fn child_element_count(xml: &str, name: &str) -> usize {
    let doc = Document::parse_str(xml).expect("valid XML");
    let mut stack: Vec<_> = doc.root_element().into_iter().collect();
    while let Some(id) = stack.pop() {
        if doc.element(id).is_some_and(|e| e.name.local == name) {
            return doc.child_elements(id).count();
        }
        stack.extend(doc.child_elements(id).collect::<Vec<_>>().into_iter().rev());
    }
    panic!("No element <{}> in:\n{}", name, xml);
}
