//! XML Document Transform (XDT) engine.
//!
//! A transform document mirrors the shape of the source document. Elements
//! in the transform carry `xdt:Transform` and `xdt:Locator` attributes that say
//! which source elements to edit and how:
//!
//! ```xml
//! <configuration xmlns:xdt="http://schemas.microsoft.com/XML-Document-Transform">
//!   <appSettings>
//!     <add key="mode" value="release" xdt:Transform="SetAttributes" xdt:Locator="Match(key)"/>
//!   </appSettings>
//! </configuration>
//! ```
//!
//! [`transform`] is the strict entry point; [`Transformer`] exposes the
//! options and the partial result with its diagnostics.

pub mod datasource;
pub mod directive;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod locator;
pub mod options;

pub use directive::{Directives, Locator, TransformAction};
pub use engine::{TransformOutcome, Transformer};
pub use error::{DocumentRole, TransformError};
pub use options::{ErrorPolicy, TransformOptions, XDT_NAMESPACE};

use xdt_dom::Document;

/// Applies `transform` to `source` and returns the transformed text.
///
/// Fails unless every directive applied; the individual failures are carried
/// in [`TransformError::Directives`].
pub fn transform(source: &str, transform: &str) -> Result<String, TransformError> {
    let outcome = Transformer::default().run(source, transform)?;
    if outcome.is_complete() {
        Ok(outcome.output)
    } else {
        Err(TransformError::Directives(outcome.diagnostics))
    }
}

/// True if `content` is a well-formed XML document with a root element.
pub fn is_supported(content: &str) -> bool {
    Document::parse_str(content).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported("<configuration/>"));
        assert!(is_supported("<?xml version=\"1.0\"?>\n<a><b/></a>\n"));
        assert!(!is_supported(""));
        assert!(!is_supported("<a><b></a>"));
        assert!(!is_supported("{\"json\": true}"));
    }

    #[test]
    fn test_strict_transform_refuses_partial_result() {
        let source = "<configuration><appSettings/></configuration>";
        let transform = format!(
            concat!(
                r#"<configuration xmlns:xdt="{}"><appSettings><add key="x" xdt:Transform="Remove"/>"#,
                r#"<add key="y" xdt:Transform="Insert"/></appSettings></configuration>"#
            ),
            XDT_NAMESPACE
        );
        let error = super::transform(source, &transform).unwrap_err();
        match error {
            TransformError::Directives(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(errors[0], TransformError::NoMatchFound { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!TransformError::NoMatchFound {
            action: "Remove".into(),
            element: "add".into()
        }
        .is_fatal());
    }
}
