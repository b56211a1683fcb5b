use thiserror::Error;
use xdt_dom::DomError;
use xdt_xpath1::XPathError;

/// Which of the two input documents an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentRole {
    Source,
    Transform,
}

impl std::fmt::Display for DocumentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRole::Source => write!(f, "source"),
            DocumentRole::Transform => write!(f, "transform"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("The {role} document is malformed: {source}")]
    MalformedDocument {
        role: DocumentRole,
        #[source]
        source: DomError,
    },

    #[error("Root element <{transform}> of the transform does not match source root <{source_root}>")]
    RootMismatch {
        source_root: String,
        transform: String,
    },

    #[error("Locator on <{element}> needs key attribute '{key}', which the transform element does not carry")]
    LocatorKeyMissing { element: String, key: String },

    #[error("{action} on <{element}> found no matching node")]
    NoMatchFound { action: String, element: String },

    #[error("{action} on <{element}> cannot target the root element")]
    RootTarget { action: String, element: String },

    #[error("Unsupported transform action '{0}'")]
    UnsupportedAction(String),

    #[error("Unsupported locator '{0}'")]
    UnsupportedLocator(String),

    #[error("Invalid directive value '{value}': {message}")]
    InvalidDirective { value: String, message: String },

    #[error("XPath error on <{element}>: {source}")]
    XPath {
        element: String,
        #[source]
        source: XPathError,
    },

    #[error("Document structure error: {0}")]
    Dom(#[from] DomError),

    #[error("{} transform directive(s) failed", .0.len())]
    Directives(Vec<TransformError>),
}

impl TransformError {
    /// Fatal errors abort a run before any directive is applied; everything
    /// else is scoped to one directive and can be collected.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TransformError::MalformedDocument { .. }
                | TransformError::RootMismatch { .. }
                | TransformError::Directives(_)
        )
    }

    pub(crate) fn no_match(action: impl Into<String>, element: impl Into<String>) -> Self {
        TransformError::NoMatchFound {
            action: action.into(),
            element: element.into(),
        }
    }
}
