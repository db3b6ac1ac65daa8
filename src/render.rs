//! Converting source files to HTML.

use std::io;
use std::path::Path;
use std::process::ExitStatus;

use thiserror::Error;

use crate::ViewOptions;

mod vim;

pub use vim::VimRenderer;

/// Errors returned by a [`Renderer`].
#[derive(Debug, Error)]
pub enum RenderError {
    /// The renderer process could not be started.
    #[error("failed to start renderer: {0}")]
    Spawn(#[source] io::Error),

    /// The renderer ran but did not exit successfully.
    #[error("renderer exited with {status}: {stderr}")]
    Failed {
        /// Exit status of the process.
        status: ExitStatus,
        /// Whatever the process wrote to stderr.
        stderr: String,
    },

    /// The private output file could not be created or read.
    #[error("renderer output unavailable: {0}")]
    Output(#[source] io::Error),
}

/// Source-to-HTML renderer.
///
/// Implementors convert the file at `path` into a complete HTML document, honoring the display
/// settings in `options`. Rendering is blocking; the server calls it from a blocking-capable
/// thread.
pub trait Renderer: Send + Sync {
    /// Renders the regular file at `path` as HTML.
    fn render(&self, path: &Path, options: &ViewOptions) -> Result<String, RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&self, path: &Path, options: &ViewOptions) -> Result<String, RenderError> {
        (**self).render(path, options)
    }
}
