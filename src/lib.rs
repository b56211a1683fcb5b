//! Applies XML Document Transform files to XML documents.
//!
//! The engine lives in the workspace crates and is re-exported here:
//! `xdt-dom` holds the mutable document, `xdt-xpath1` the XPath evaluator
//! used by locators, and `xdt-transform` the directive engine. The [`cli`]
//! module backs the `xdt` binary.

pub mod cli;

pub use xdt_dom::{Document, DomError};
pub use xdt_transform::{
    DocumentRole, ErrorPolicy, Locator, TransformAction, TransformError, TransformOptions,
    TransformOutcome, Transformer, XDT_NAMESPACE, is_supported, transform,
};
pub use xdt_xpath1::XPathError;
