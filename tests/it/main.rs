use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::lookup_host;

use codeserve::{Config, RenderCache, RenderError, Renderer, Server, ViewOptions};

mod files;
mod render;

/// Stand-in for Vim that produces `:TOhtml`-shaped markup for `#include` lines and counts how
/// often it runs.
#[derive(Debug, Clone, Default)]
pub struct FakeVim {
    renders: Arc<AtomicUsize>,
}

impl FakeVim {
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl Renderer for FakeVim {
    fn render(&self, path: &Path, options: &ViewOptions) -> Result<String, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);

        let source = fs::read_to_string(path).map_err(RenderError::Output)?;

        let mut html = format!(
            "<html>\n<head><!-- {} --></head>\n<body>\n<pre id='vimCodeElement'>\n",
            options.directives().join(" | ")
        );

        for line in source.lines() {
            let line = line
                .replace('&', "&amp;")
                .replace('"', "&quot;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");

            match line.strip_prefix("#include ") {
                Some(name) => html.push_str(&format!(
                    "<span class=\"PreProc\">#include </span><span class=\"Constant\">{}</span>\n",
                    name
                )),
                None => {
                    html.push_str(&line);
                    html.push('\n');
                }
            }
        }

        html.push_str("</pre>\n</body>\n</html>\n");
        Ok(html)
    }
}

/// Renderer that always fails like Vim exiting non-zero.
#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
pub struct BrokenVim;

#[cfg(unix)]
impl Renderer for BrokenVim {
    fn render(&self, _path: &Path, _options: &ViewOptions) -> Result<String, RenderError> {
        use std::os::unix::process::ExitStatusExt;

        Err(RenderError::Failed {
            status: std::process::ExitStatus::from_raw(1 << 8),
            stderr: String::from("E185: Cannot find color scheme"),
        })
    }
}

async fn new_server<R>(config: Config, renderer: R, cache: RenderCache) -> anyhow::Result<Server>
where
    R: Renderer + 'static,
{
    let addr = lookup_host("localhost:0").await?.next().unwrap();
    Ok(Server::bind(&addr, config, renderer, cache).await?)
}

/// Client that reports redirects instead of following them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
