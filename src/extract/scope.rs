//! Scope context threaded through the traversal.
//!
//! A [`Scope`] is an immutable value. Entering a package, architecture or
//! generate produces a fresh scope; the caller's copy is never touched.

/// Where a node sits: package name, architecture/generate path, and the
/// innermost generate label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    package: Option<String>,
    path: Option<String>,
    generate: Option<String>,
}

impl Scope {
    /// File-level scope.
    pub fn file() -> Self {
        Self::default()
    }

    /// Scope for the body of a package (declaration or body).
    pub fn in_package(&self, name: &str) -> Self {
        Self {
            package: Some(name.to_string()),
            path: None,
            generate: None,
        }
    }

    /// Scope for the body of an architecture (or an entity's statement part).
    pub fn in_architecture(&self, name: &str) -> Self {
        Self {
            package: None,
            path: Some(name.to_string()),
            generate: None,
        }
    }

    /// Scope for the body of a generate labelled `label`.
    pub fn in_generate(&self, label: &str) -> Self {
        let path = match &self.path {
            Some(parent) if !parent.is_empty() => format!("{}.{}", parent, label),
            _ => label.to_string(),
        };
        Self {
            package: self.package.clone(),
            path: Some(path),
            generate: Some(label.to_string()),
        }
    }

    /// Enclosing package, if any.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Architecture/generate path, if any.
    pub fn arch(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Architecture/generate path, empty outside architectures.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("")
    }

    /// Architecture name (first path segment).
    pub fn architecture(&self) -> Option<&str> {
        self.path
            .as_deref()
            .and_then(|p| p.split('.').next())
            .filter(|s| !s.is_empty())
    }

    /// Innermost generate label, if inside a generate.
    pub fn generate(&self) -> Option<&str> {
        self.generate.as_deref()
    }

    /// The name a declaration is filed under: architecture path, else
    /// package name, else empty.
    pub fn owner(&self) -> &str {
        self.path
            .as_deref()
            .or(self.package.as_deref())
            .unwrap_or("")
    }
}
