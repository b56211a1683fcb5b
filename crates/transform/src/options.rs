/// Namespace of the `Transform` and `Locator` directive attributes.
pub const XDT_NAMESPACE: &str = "http://schemas.microsoft.com/XML-Document-Transform";

/// What to do when a single directive fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Record the error, leave the affected subtree untouched and keep going.
    #[default]
    Collect,
    /// Stop at the first failing directive.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    pub error_policy: ErrorPolicy,
    /// Keep the source indentation intact around inserted and removed elements.
    pub tidy_whitespace: bool,
    /// Namespace URI that marks directive attributes.
    pub directive_namespace: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::Collect,
            tidy_whitespace: true,
            directive_namespace: XDT_NAMESPACE.to_string(),
        }
    }
}

impl TransformOptions {
    pub fn fail_fast(mut self) -> Self {
        self.error_policy = ErrorPolicy::FailFast;
        self
    }

    pub fn with_tidy_whitespace(mut self, tidy: bool) -> Self {
        self.tidy_whitespace = tidy;
        self
    }
}
