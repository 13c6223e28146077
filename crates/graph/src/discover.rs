//! Component discovery.
//!
//! Walks the components root, assembles a build context per component,
//! renders its definition, and produces a fully linked [`ImageGraph`].

use crate::{Error, ImageGraph, ImageNode, Result, parse_base_image};
use kiln_core::BuildConfig;
use kiln_render::{RenderContext, Renderer, SourceResolver, assemble_context};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Discover every component under the configured root and build the graph.
///
/// Each immediate subdirectory of `components_root` is one component and
/// must contain exactly one build definition (a file whose name starts
/// with the configured stem). Components without one are skipped or fatal
/// depending on the skip-missing policy. The returned graph is linked and
/// cycle-checked; nothing is matched yet.
pub fn discover_graph(
    config: &BuildConfig,
    renderer: &dyn Renderer,
    resolvers: &[Box<dyn SourceResolver>],
) -> Result<ImageGraph> {
    let mut graph = ImageGraph::new();
    let mut component_dirs = list_component_dirs(&config.components_root)?;
    component_dirs.sort();

    for component_dir in component_dirs {
        let name = component_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(definition) = find_definition(&component_dir, &name, &config.definition_stem)?
        else {
            if config.skip_missing {
                warn!(component = %name, "No build definition, skipping");
                continue;
            }
            return Err(Error::MissingDefinition { component: name });
        };

        let context_dir = config.context_root.join(&name);
        std::fs::create_dir_all(&context_dir).map_err(|source| Error::Io {
            operation: "create context dir".to_string(),
            path: context_dir.clone(),
            source,
        })?;
        assemble_context(&component_dir, &context_dir, resolvers)?;

        let template = std::fs::read_to_string(&definition).map_err(|source| Error::Io {
            operation: "read definition".to_string(),
            path: definition.clone(),
            source,
        })?;
        let rendered = renderer.render(&template, &render_context(config))?;

        // The copied template inside the context is replaced by its
        // rendered form; that file is what the runtime builds from.
        let definition_path = context_dir.join(
            definition
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("Dockerfile")),
        );
        std::fs::write(&definition_path, &rendered).map_err(|source| Error::Io {
            operation: "write rendered definition".to_string(),
            path: definition_path.clone(),
            source,
        })?;

        let base = parse_base_image(&rendered, &definition_path)?;
        let full_tag = config.full_tag(&name);
        graph.insert(ImageNode::new(name, full_tag, definition_path, context_dir, base))?;
    }

    graph.link_parents(&config.namespace)?;
    info!(components = graph.len(), "Discovered image graph");
    Ok(graph)
}

fn render_context(config: &BuildConfig) -> RenderContext {
    let mut context = RenderContext::new(config.variables.clone());
    // The active namespace and tag are always available to templates and
    // always reflect the run configuration.
    context.set("namespace", config.namespace.clone());
    context.set("tag", config.tag.clone());
    if config.permissive_render {
        context = context.permissive();
    }
    context
}

fn list_component_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root).map_err(|source| Error::Io {
        operation: "read components root".to_string(),
        path: root.to_path_buf(),
        source,
    })?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::Io {
            operation: "read components root".to_string(),
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

fn find_definition(dir: &Path, component: &str, stem: &str) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| Error::Io {
        operation: "read component dir".to_string(),
        path: dir.to_path_buf(),
        source,
    })?;
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            entry.file_type().map(|t| t.is_file()).unwrap_or(false)
                && entry.file_name().to_string_lossy().starts_with(stem)
        })
        .map(|entry| entry.path())
        .collect();

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        count => Err(Error::AmbiguousDefinition {
            component: component.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_render::TemplateRenderer;
    use tempfile::TempDir;

    fn write_component(root: &Path, name: &str, definition: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Dockerfile"), definition).unwrap();
    }

    fn config(root: &TempDir) -> BuildConfig {
        BuildConfig {
            namespace: "acme".to_string(),
            tag: "dev".to_string(),
            components_root: root.path().join("components"),
            context_root: root.path().join("contexts"),
            ..Default::default()
        }
    }

    #[test]
    fn discovers_and_links_components() {
        let root = TempDir::new().unwrap();
        let components = root.path().join("components");
        write_component(&components, "base", "FROM debian:12\nRUN true\n");
        write_component(&components, "app", "FROM {{ namespace }}/base:{{ tag }}\n");

        let graph = discover_graph(&config(&root), &TemplateRenderer::new(), &[]).unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get("app").unwrap().parent.as_deref(), Some("base"));
        assert_eq!(graph.get("base").unwrap().children, vec!["app".to_string()]);
        assert_eq!(graph.get("app").unwrap().full_tag, "acme/app:dev");

        // The rendered definition on disk has its placeholders resolved.
        let rendered =
            std::fs::read_to_string(&graph.get("app").unwrap().definition_path).unwrap();
        assert_eq!(rendered, "FROM acme/base:dev\n");
    }

    #[test]
    fn missing_definition_is_fatal_by_default() {
        let root = TempDir::new().unwrap();
        let components = root.path().join("components");
        write_component(&components, "base", "FROM debian:12\n");
        std::fs::create_dir_all(components.join("empty")).unwrap();

        let err = discover_graph(&config(&root), &TemplateRenderer::new(), &[]).unwrap_err();
        assert!(matches!(err, Error::MissingDefinition { component } if component == "empty"));
    }

    #[test]
    fn missing_definition_is_skipped_when_configured() {
        let root = TempDir::new().unwrap();
        let components = root.path().join("components");
        write_component(&components, "base", "FROM debian:12\n");
        std::fs::create_dir_all(components.join("empty")).unwrap();

        let mut config = config(&root);
        config.skip_missing = true;
        let graph = discover_graph(&config, &TemplateRenderer::new(), &[]).unwrap();
        assert_eq!(graph.len(), 1);
        assert!(graph.contains("base"));
    }

    #[test]
    fn ambiguous_definitions_are_fatal() {
        let root = TempDir::new().unwrap();
        let components = root.path().join("components");
        let dir = components.join("base");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Dockerfile"), "FROM debian:12\n").unwrap();
        std::fs::write(dir.join("Dockerfile.alt"), "FROM debian:13\n").unwrap();

        let err = discover_graph(&config(&root), &TemplateRenderer::new(), &[]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousDefinition { count: 2, .. }));
    }

    #[test]
    fn strict_render_failure_propagates() {
        let root = TempDir::new().unwrap();
        let components = root.path().join("components");
        write_component(&components, "base", "FROM {{ undefined_base }}\n");

        let err = discover_graph(&config(&root), &TemplateRenderer::new(), &[]).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }
}
