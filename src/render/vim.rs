use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use tempfile::NamedTempFile;
use tracing::log::*;

use super::{RenderError, Renderer};
use crate::ViewOptions;

/// Renderer that drives Vim's `:TOhtml` to produce highlighted HTML.
///
/// Vim is started on the target file with, in order: the configured start-up directives, the
/// directives derived from the [`ViewOptions`], and finally `+TOhtml`, `+w! <output>` and
/// `+qa!`. The output is written to a private temporary file that is removed once the render
/// finishes, whether or not it succeeded.
///
/// # Example
///
/// ```no_run
/// use codeserve::render::VimRenderer;
///
/// let vim = VimRenderer::new().with_directives(vec![String::from("set tabstop=4")]);
/// ```
#[derive(Debug, Clone)]
pub struct VimRenderer {
    program: PathBuf,
    directives: Vec<String>,
}

impl VimRenderer {
    /// Create a renderer that runs `vim` from `PATH`.
    pub fn new() -> VimRenderer {
        VimRenderer {
            program: PathBuf::from("vim"),
            directives: vec![],
        }
    }

    /// Use a different executable. It must accept Vim's `+<command>` arguments.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> VimRenderer {
        self.program = program.into();
        self
    }

    /// Directives (without the leading `+`) issued before any view option.
    pub fn with_directives(mut self, directives: Vec<String>) -> VimRenderer {
        self.directives = directives;
        self
    }

    fn command(&self, path: &Path, options: &ViewOptions, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.arg(path);

        command.args(self.directives.iter().map(|directive| plus(directive)));
        command.args(options.directives().iter().map(|directive| plus(directive)));

        let mut write = OsString::from("+w! ");
        write.push(output);
        command.args([OsStr::new("+TOhtml"), write.as_os_str(), OsStr::new("+qa!")]);

        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        command
    }
}

impl Default for VimRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for VimRenderer {
    fn render(&self, path: &Path, options: &ViewOptions) -> Result<String, RenderError> {
        let started_at = Instant::now();
        let job = RenderJob::new(path)?;

        let mut command = self.command(path, options, job.output_path());
        debug!("spawning renderer: {:?}", command);

        let output = command.output().map_err(RenderError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            warn!(
                "rendering {} failed ({}): {}",
                path.display(),
                output.status,
                stderr
            );
            return Err(RenderError::Failed {
                status: output.status,
                stderr,
            });
        }

        let html = job.read_output()?;

        info!(
            "rendered {} in {}ms ({} bytes)",
            path.display(),
            started_at.elapsed().as_millis(),
            html.len()
        );

        Ok(html)
    }
}

/// One invocation of the renderer against one file.
///
/// Owns the temporary output file; dropping the job deletes it.
struct RenderJob {
    output: NamedTempFile,
}

impl RenderJob {
    fn new(source: &Path) -> Result<RenderJob, RenderError> {
        remove_swap_file(source);

        let output = tempfile::Builder::new()
            .prefix("codeserve-")
            .suffix(".html")
            .tempfile()
            .map_err(RenderError::Output)?;

        Ok(RenderJob { output })
    }

    fn output_path(&self) -> &Path {
        self.output.path()
    }

    fn read_output(self) -> Result<String, RenderError> {
        let bytes = fs::read(self.output.path()).map_err(RenderError::Output)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The swap file Vim keeps next to a file it is editing.
fn swap_file(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;

    let mut swap = OsString::from(".");
    swap.push(name);
    swap.push(".swp");

    Some(path.with_file_name(swap))
}

/// A swap file left over from an interrupted render would make Vim stop at the recovery prompt.
fn remove_swap_file(path: &Path) {
    let swap = match swap_file(path) {
        Some(swap) => swap,
        None => return,
    };

    match fs::remove_file(&swap) {
        Ok(()) => debug!("removed stale swap file {}", swap.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove swap file {}: {}", swap.display(), e),
    }
}

fn plus(directive: &str) -> String {
    format!("+{}", directive)
}
