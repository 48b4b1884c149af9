use anyhow::{bail, ensure, Result};
use std::fmt;

/// An absolute prim path such as `/Material/NodeGraph/image1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(String);

/// Shorthand for [`Path::new`].
pub fn path(value: &str) -> Result<Path> {
    Path::new(value)
}

impl Path {
    /// The absolute root path `/`.
    pub fn abs_root() -> Self {
        Self("/".to_string())
    }

    /// Parse and validate an absolute prim path.
    pub fn new(value: &str) -> Result<Self> {
        ensure!(value.starts_with('/'), "Prim path must be absolute: '{value}'");
        if value == "/" {
            return Ok(Self::abs_root());
        }

        for segment in value[1..].split('/') {
            if !is_valid_identifier(segment) {
                bail!("Invalid prim name '{segment}' in path '{value}'");
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_abs_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last path component, empty for the root.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.is_abs_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::abs_root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Append a child prim name.
    pub fn append_child(&self, name: &str) -> Result<Path> {
        ensure!(is_valid_identifier(name), "Invalid prim name '{name}'");
        if self.is_abs_root() {
            Ok(Self(format!("/{name}")))
        } else {
            Ok(Self(format!("{}/{name}", self.0)))
        }
    }

    /// All prefixes of this path from the top-level prim down to the path itself.
    ///
    /// The root has no prefixes.
    pub fn prefixes(&self) -> Vec<Path> {
        if self.is_abs_root() {
            return Vec::new();
        }
        self.0
            .match_indices('/')
            .skip(1)
            .map(|(idx, _)| Self(self.0[..idx].to_string()))
            .chain(std::iter::once(self.clone()))
            .collect()
    }

    /// Property path string, e.g. `/Mat/Shader.outputs:out`.
    pub fn property(&self, property_name: &str) -> String {
        format!("{}.{property_name}", self.0)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// USD identifiers: a letter or underscore followed by letters, digits or underscores.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
