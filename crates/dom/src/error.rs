use thiserror::Error;

/// A 1-based line/column position inside the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl Location {
    /// Computes the line and column of a byte offset in `source`.
    pub fn from_offset(source: &str, pos: usize) -> Self {
        let bytes = &source.as_bytes()[..pos.min(source.len())];
        let line = bytes.iter().filter(|&&b| b == b'\n').count() + 1;
        let col = match bytes.iter().rposition(|&b| b == b'\n') {
            Some(nl) => bytes.len() - nl,
            None => bytes.len() + 1,
        };
        Location { line, col }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

impl From<(usize, usize)> for Location {
    fn from((line, col): (usize, usize)) -> Self {
        Location { line, col }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Malformed XML at {location}: {message}")]
    Malformed { message: String, location: Location },

    #[error("Namespace prefix '{prefix}' is not declared at {location}")]
    UnboundPrefix { prefix: String, location: Location },

    #[error("Duplicate attribute '{name}' at {location}")]
    DuplicateAttribute { name: String, location: Location },

    #[error("Document has no root element")]
    MissingRoot,

    #[error("Invalid tree operation: {0}")]
    HierarchyRequest(String),

    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl DomError {
    pub(crate) fn malformed(message: impl Into<String>, location: Location) -> Self {
        DomError::Malformed {
            message: message.into(),
            location,
        }
    }
}
