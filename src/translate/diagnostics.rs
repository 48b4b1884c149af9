//! Non-fatal conditions reported while translating.

use std::fmt;

/// What went wrong for a single element or connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The element's name path does not form a valid prim path.
    InvalidPrimPath { path: String },
    /// No prim exists at the computed upstream path.
    MissingSource { path: String },
    /// The upstream prim exists but is not a Material, NodeGraph or Shader.
    UnsupportedSource { path: String },
    /// No prim exists for the element being connected.
    MissingDestination { path: String },
    /// The downstream prim exists but is not a Material, NodeGraph or Shader.
    UnsupportedDestination { path: String },
    /// The downstream prim has no port with the expected name.
    MissingDestinationPort { prim: String, port: String },
    /// An `interfacename` reference names an input the enclosing graph does not have.
    MissingInterfaceInput { prim: String, input: String },
    /// A value string could not be parsed for its declared type.
    InvalidValue { value_type: String, value: String },
    /// The stage refused the connection.
    ConnectFailed { source: String, destination: String, reason: String },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::InvalidPrimPath { path } => write!(f, "invalid prim path '{path}'"),
            DiagnosticKind::MissingSource { path } => write!(f, "failed to find source at path '{path}'"),
            DiagnosticKind::UnsupportedSource { path } => write!(f, "source at '{path}' is not a shading prim"),
            DiagnosticKind::MissingDestination { path } => write!(f, "failed to find destination at path '{path}'"),
            DiagnosticKind::UnsupportedDestination { path } => {
                write!(f, "destination at '{path}' is not a shading prim")
            }
            DiagnosticKind::MissingDestinationPort { prim, port } => {
                write!(f, "failed to find destination port '{port}' on '{prim}'")
            }
            DiagnosticKind::MissingInterfaceInput { prim, input } => {
                write!(f, "interface input '{input}' not found on '{prim}'")
            }
            DiagnosticKind::InvalidValue { value_type, value } => {
                write!(f, "cannot convert value '{value}' of type '{value_type}'")
            }
            DiagnosticKind::ConnectFailed {
                source,
                destination,
                reason,
            } => write!(f, "failed to connect {source} --> {destination}: {reason}"),
        }
    }
}

/// A diagnostic attached to the name path of the source element it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub element: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.element, self.kind)
    }
}

/// Collected diagnostics of one translation, in the order they were raised.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Record a diagnostic and log it as a warning.
    pub fn push(&mut self, element: &str, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            element: element.to_string(),
            kind,
        };
        log::warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics raised for the given element name path.
    pub fn for_element<'a>(&'a self, element: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.element == element)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_order() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(
            "NG/b/in",
            DiagnosticKind::MissingSource {
                path: "/NG/a".to_string(),
            },
        );
        diagnostics.push(
            "NG/c/in",
            DiagnosticKind::InvalidValue {
                value_type: "float".to_string(),
                value: "abc".to_string(),
            },
        );

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.for_element("NG/b/in").count(), 1);
        let rendered: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(rendered[0], "NG/b/in: failed to find source at path '/NG/a'");
        assert_eq!(rendered[1], "NG/c/in: cannot convert value 'abc' of type 'float'");
    }
}
