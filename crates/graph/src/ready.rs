//! Ready-set computation.
//!
//! An image already present in the local runtime under the active
//! namespace and tag needs no build this run, unless explicitly requested
//! or pulled back in by the consistency cascade.

use kiln_core::ImageRef;
use std::collections::HashSet;
use tracing::debug;

/// Short names of locally present images matching the active namespace and
/// tag.
///
/// `repo_tags` are repository-tag strings as reported by the runtime;
/// entries that do not follow the reference grammar are skipped.
#[must_use]
pub fn ready_set<I>(repo_tags: I, namespace: &str, tag: &str) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut ready = HashSet::new();
    for repo_tag in repo_tags {
        let repo_tag = repo_tag.as_ref();
        let Ok(reference) = repo_tag.parse::<ImageRef>() else {
            debug!(%repo_tag, "Skipping unparseable local image");
            continue;
        };
        if reference.in_namespace(namespace) && reference.tag.as_deref() == Some(tag) {
            ready.insert(reference.name);
        }
    }
    debug!(count = ready.len(), %namespace, %tag, "Computed ready set");
    ready
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_matching_namespace_and_tag() {
        let ready = ready_set(
            [
                "acme/base:dev",
                "acme/mid:dev",
                "acme/leaf:stale",
                "other/base:dev",
                "registry.example.com:5000/acme/api:dev",
                "<none>:<none>",
            ],
            "acme",
            "dev",
        );
        assert_eq!(
            ready,
            ["base", "mid", "api"]
                .into_iter()
                .map(String::from)
                .collect()
        );
    }

    #[test]
    fn empty_listing_yields_empty_set() {
        let ready = ready_set(Vec::<String>::new(), "acme", "dev");
        assert!(ready.is_empty());
    }
}
