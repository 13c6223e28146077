//! Build-context assembly.
//!
//! A build context starts as a copy of the component directory; registered
//! [`SourceResolver`]s then place external source trees into it before the
//! definition is rendered.

use crate::{Error, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Materialises one named external source into a build context.
pub trait SourceResolver: Send + Sync {
    /// Resolver name, used in logs and errors.
    fn name(&self) -> &str;

    /// Place this resolver's files under `context_dir`.
    fn resolve(&self, context_dir: &Path) -> Result<()>;
}

/// Resolver that copies a local directory into the context under a fixed
/// subdirectory name.
pub struct CopyResolver {
    name: String,
    source: std::path::PathBuf,
    dest: String,
}

impl CopyResolver {
    /// Copy `source` into `<context>/<dest>`.
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<std::path::PathBuf>, dest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            dest: dest.into(),
        }
    }
}

impl SourceResolver for CopyResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, context_dir: &Path) -> Result<()> {
        let dest = context_dir.join(&self.dest);
        copy_tree(&self.source, &dest)?;
        tracing::debug!(resolver = %self.name, dest = %dest.display(), "Resolved source tree");
        Ok(())
    }
}

/// Assemble a build context: copy the component directory into
/// `context_dir`, then run every resolver against it.
pub fn assemble_context(
    component_dir: &Path,
    context_dir: &Path,
    resolvers: &[Box<dyn SourceResolver>],
) -> Result<()> {
    copy_tree(component_dir, context_dir)?;
    for resolver in resolvers {
        resolver.resolve(context_dir)?;
    }
    Ok(())
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| Error::Io {
            operation: "walk".to_string(),
            path: source.to_path_buf(),
            source: e.into(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .unwrap_or_else(|_| Path::new(""));
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(Error::io("create dir", &target))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(Error::io("create dir", parent))?;
            }
            std::fs::copy(entry.path(), &target).map_err(Error::io("copy", entry.path()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn assembles_component_copy() {
        let source = TempDir::new().unwrap();
        std::fs::write(source.path().join("Dockerfile"), "FROM acme/base").unwrap();
        std::fs::create_dir(source.path().join("scripts")).unwrap();
        std::fs::write(source.path().join("scripts/start.sh"), "#!/bin/sh").unwrap();

        let context = TempDir::new().unwrap();
        assemble_context(source.path(), context.path(), &[]).unwrap();

        assert!(context.path().join("Dockerfile").exists());
        assert!(context.path().join("scripts/start.sh").exists());
    }

    #[test]
    fn copy_resolver_places_tree_under_dest() {
        let external = TempDir::new().unwrap();
        std::fs::write(external.path().join("app.py"), "print()").unwrap();

        let component = TempDir::new().unwrap();
        std::fs::write(component.path().join("Dockerfile"), "FROM acme/base").unwrap();

        let context = TempDir::new().unwrap();
        let resolvers: Vec<Box<dyn SourceResolver>> = vec![Box::new(CopyResolver::new(
            "app-source",
            external.path(),
            "src",
        ))];
        assemble_context(component.path(), context.path(), &resolvers).unwrap();

        assert!(context.path().join("src/app.py").exists());
    }
}
