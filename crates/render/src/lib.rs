//! Template rendering and build-context assembly.
//!
//! Build definitions are templates: `{{ name }}` placeholders are resolved
//! against a variable table before the definition is handed to the
//! container runtime. Rendering is strict by default (an undefined variable
//! fails the render); contexts can be marked permissive to leave unknown
//! placeholders untouched.
//!
//! External source trees are brought into a build context through named
//! [`SourceResolver`]s registered on the renderer, so per-component copy
//! behavior is explicit rather than captured in closures.

mod context;
mod error;
mod template;

pub use context::{CopyResolver, SourceResolver, assemble_context};
pub use error::{Error, Result};
pub use template::{RenderContext, RenderMode, Renderer, TemplateRenderer};
