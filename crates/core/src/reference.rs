//! Image reference grammar.
//!
//! A reference is `[registry/]namespace/name[:tag]`. The same grammar is
//! used to parse `FROM` lines in rendered build definitions, to interpret
//! repository tags reported by the container runtime, and to construct the
//! fully qualified tag an image is built and pushed under.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed image reference.
///
/// The registry component is optional and only present when the source
/// string carried one (a segment containing a `.` or `:`, or `localhost`,
/// ahead of the namespace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Registry address, e.g. `registry.example.com:5000`.
    pub registry: Option<String>,
    /// Image namespace (the project prefix shared by all components).
    pub namespace: String,
    /// Short image name, unique within the namespace.
    pub name: String,
    /// Tag, if the reference carried one.
    pub tag: Option<String>,
}

impl ImageRef {
    /// Construct a reference from its parts.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            registry: None,
            namespace: namespace.into(),
            name: name.into(),
            tag,
        }
    }

    /// Whether this reference lives in the given namespace.
    #[must_use]
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace == namespace
    }

    /// Render the fully qualified tag, optionally prefixed with a registry.
    ///
    /// The `registry` argument takes precedence over a registry parsed from
    /// the source string; pass `None` to emit an unprefixed tag.
    #[must_use]
    pub fn qualified(&self, registry: Option<&str>, tag: &str) -> String {
        match registry {
            Some(registry) => format!("{}/{}/{}:{}", registry, self.namespace, self.name, tag),
            None => format!("{}/{}:{}", self.namespace, self.name, tag),
        }
    }
}

impl FromStr for ImageRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidReference(
                s.to_string(),
                "empty reference".to_string(),
            ));
        }

        // Split off the tag: the last ':' counts only if it comes after the
        // final '/', otherwise it belongs to a registry port.
        let (repository, tag) = match trimmed.rsplit_once(':') {
            Some((left, right)) if !right.contains('/') && !left.is_empty() => {
                (left, Some(right.to_string()))
            }
            _ => (trimmed, None),
        };

        let segments: Vec<&str> = repository.split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(Error::InvalidReference(
                s.to_string(),
                "empty path segment".to_string(),
            ));
        }

        match segments.as_slice() {
            [namespace, name] => Ok(Self {
                registry: None,
                namespace: (*namespace).to_string(),
                name: (*name).to_string(),
                tag,
            }),
            [registry, namespace, name] => Ok(Self {
                registry: Some((*registry).to_string()),
                namespace: (*namespace).to_string(),
                name: (*name).to_string(),
                tag,
            }),
            _ => Err(Error::InvalidReference(
                s.to_string(),
                "expected [registry/]namespace/name[:tag]".to_string(),
            )),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        write!(f, "{}/{}", self.namespace, self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        Ok(())
    }
}
