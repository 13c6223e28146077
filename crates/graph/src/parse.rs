//! Base-image extraction from rendered definitions.

use crate::{Error, Result};
use kiln_core::ImageRef;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static FROM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*FROM\s+(\S+)").expect("FROM regex is valid")
});

/// Extract the base-image reference from rendered definition text.
///
/// Only the first `FROM` line is honored; later stages of a multi-stage
/// definition are ignored. Returns `Ok(None)` when the base image does not
/// follow the `namespace/name[:tag]` grammar (an external base such as
/// `debian:12`), which never links a parent.
///
/// # Errors
///
/// Fails when no `FROM` line exists or a `FROM` keyword carries no image.
pub fn parse_base_image(text: &str, path: &Path) -> Result<Option<ImageRef>> {
    for line in text.lines() {
        if line.split_whitespace().next() != Some("FROM") {
            continue;
        }
        let Some(captures) = FROM_LINE.captures(line) else {
            return Err(Error::MalformedFrom {
                path: path.to_path_buf(),
                line: line.trim().to_string(),
            });
        };
        let image = &captures[1];
        return match image.parse::<ImageRef>() {
            Ok(reference) => Ok(Some(reference)),
            Err(_) => {
                tracing::debug!(%image, path = %path.display(), "External base image");
                Ok(None)
            }
        };
    }
    Err(Error::MissingFrom {
        path: path.to_path_buf(),
    })
}
