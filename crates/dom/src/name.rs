//! Qualified names and the well-known namespace URIs.

use std::fmt;

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of `xmlns` and `xmlns:*` declaration attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// A qualified XML name: the lexical `prefix:local` form plus the namespace URI
/// the prefix resolved to when the node was parsed or created.
///
/// Two names are the *same node name* when their namespace and local part
/// agree; the prefix is presentation only. Use [`QualifiedName::same_name`]
/// for that comparison, `==` compares all three parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub prefix: Option<String>,
    pub local: String,
    pub namespace: Option<String>,
}

impl QualifiedName {
    /// An unprefixed name in no namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
        }
    }

    /// Splits a lexical name like `xdt:Transform` into prefix and local part.
    /// The namespace is left unresolved.
    pub fn from_lexical(name: &str) -> Self {
        match name.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Self {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
                namespace: None,
            },
            _ => Self::local(name),
        }
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Compares expanded names (namespace URI + local part).
    pub fn same_name(&self, other: &QualifiedName) -> bool {
        self.local == other.local && self.namespace == other.namespace
    }

    /// Compares against a lexical `prefix:local` or `local` name.
    pub fn is_lexical(&self, lexical: &str) -> bool {
        match (&self.prefix, lexical.split_once(':')) {
            (Some(prefix), Some((p, l))) => prefix == p && self.local == l,
            (None, None) => self.local == lexical,
            _ => false,
        }
    }

    pub fn is_in_namespace(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }

    /// True for `xmlns` and `xmlns:p` attributes.
    pub fn is_namespace_declaration(&self) -> bool {
        match &self.prefix {
            Some(prefix) => prefix == "xmlns",
            None => self.local == "xmlns",
        }
    }

    /// The prefix this attribute declares: `Some(None)` for `xmlns`,
    /// `Some(Some(p))` for `xmlns:p`, `None` when it is not a declaration.
    pub fn declared_prefix(&self) -> Option<Option<&str>> {
        match &self.prefix {
            Some(prefix) if prefix == "xmlns" => Some(Some(self.local.as_str())),
            None if self.local == "xmlns" => Some(None),
            _ => None,
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lexical() {
        let name = QualifiedName::from_lexical("xdt:Transform");
        assert_eq!(name.prefix.as_deref(), Some("xdt"));
        assert_eq!(name.local, "Transform");
        assert_eq!(name.to_string(), "xdt:Transform");

        let plain = QualifiedName::from_lexical("add");
        assert_eq!(plain.prefix, None);
        assert_eq!(plain.to_string(), "add");
    }

    #[test]
    fn test_same_name_ignores_prefix() {
        let a = QualifiedName::from_lexical("a:item").with_namespace(Some("urn:x".into()));
        let b = QualifiedName::from_lexical("b:item").with_namespace(Some("urn:x".into()));
        let c = QualifiedName::local("item");
        assert!(a.same_name(&b));
        assert!(!a.same_name(&c));
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_lexical_compares_prefix_and_local() {
        let name = QualifiedName::from_lexical("xml:lang");
        assert!(name.is_lexical("xml:lang"));
        assert!(!name.is_lexical("lang"));
        assert!(!name.is_lexical("xsi:lang"));
        assert!(QualifiedName::local("debug").is_lexical("debug"));
        assert!(!QualifiedName::local("debug").is_lexical("x:debug"));
    }

    #[test]
    fn test_namespace_declarations() {
        assert_eq!(QualifiedName::local("xmlns").declared_prefix(), Some(None));
        assert_eq!(
            QualifiedName::from_lexical("xmlns:xdt").declared_prefix(),
            Some(Some("xdt"))
        );
        assert_eq!(QualifiedName::local("key").declared_prefix(), None);
        assert!(QualifiedName::from_lexical("xmlns:p").is_namespace_declaration());
    }
}
