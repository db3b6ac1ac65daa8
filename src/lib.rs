//! codeserve turns a tree of source files into syntax-highlighted, cross-linked HTML that can be
//! browsed from a web browser.
//!
//! This crate provides a [`Server`] that answers `GET /<path>` by locating `<path>` under an
//! ordered list of search roots. Directories are listed. Files are handed to a [`Renderer`],
//! by default [`VimRenderer`] which runs Vim's `:TOhtml`, and the resulting document has its
//! `#include` directives turned into links to the included files. Rendered pages are kept in a
//! [`RenderCache`] keyed by file path and [`ViewOptions`], so a page is only rendered once for a
//! given set of display options.
//!
//! # Example
//!
//! ```no_run
//! use std::net::SocketAddr;
//! use codeserve::{Config, Memcached, RenderCache, Server, VimRenderer};
//!
//! # tokio_test::block_on(async {
//! let addr = "127.0.0.1:8000".parse::<SocketAddr>()?;
//! let config = Config::new("/usr/src/linux").with_search_roots(["include"]);
//! let cache = RenderCache::new(Memcached::default());
//!
//! let server = Server::bind(&addr, config, VimRenderer::new(), cache).await?;
//! println!("serving on {}", server.addr());
//! #   Ok::<_, Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! # View options
//!
//! The query string selects a color scheme (`colorscheme=<name>`), a background
//! (`bg=dark|light`) and line numbers (`nu=on|off`). Every link the server emits carries the
//! current options along, so they stay in effect while browsing.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::log::*;

pub mod cache;
mod config;
mod errors;
pub mod include;
mod options;
mod page;
pub mod render;
pub mod resolve;
mod service;
mod themes;

pub use crate::cache::{CacheKey, CacheStore, Memcached, MemoryStore, RenderCache};
pub use crate::config::{normalize, Config, DEFAULT_COLOR_DIR};
pub use crate::errors::Error;
pub use crate::options::{Background, LineNumbers, ViewOptions};
pub use crate::render::{RenderError, Renderer, VimRenderer};
pub use crate::themes::ThemeCatalog;

use crate::page::Pages;
use crate::service::AppState;

/// Source browsing server.
///
/// Listens for HTTP connections and serves directory listings and rendered source files. The
/// server runs in the background on the current `tokio` runtime and shuts down when this value
/// is dropped.
pub struct Server {
    addr: SocketAddr,
    config: Arc<Config>,
    _shutdown_tx: oneshot::Sender<()>,
}

impl Server {
    /// Binds the server to `addr`, serving the tree described by `config` with `renderer`.
    ///
    /// Binding to port 0 will request a port assignment from the OS. Use [`addr()`][Self::addr]
    /// to determine what port was assigned.
    pub async fn bind<R>(
        addr: &SocketAddr,
        config: Config,
        renderer: R,
        cache: RenderCache,
    ) -> Result<Server, Error>
    where
        R: Renderer + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let config = Arc::new(config);

        let state = AppState {
            config: Arc::clone(&config),
            renderer: Arc::new(renderer),
            cache,
            themes: ThemeCatalog::load(&config.theme_dir),
            pages: Pages::new()?,
        };

        let app = Router::new()
            .route("/", get(service::serve_root))
            .route("/{*path}", get(service::serve_path))
            .layer(Extension(Arc::new(state)))
            .layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("listening on {:?}", addr);

        let http_server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });

        tokio::spawn(async move {
            if let Err(e) = http_server.await {
                error!("server error: {}", e);
            }
        });

        Ok(Server {
            addr,
            config,
            _shutdown_tx: shutdown_tx,
        })
    }

    /// Returns the socket address that the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The configuration the server was started with.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Server")
            .field("addr", &self.addr)
            .field("config", &self.config)
            .field("_shutdown_tx", &self._shutdown_tx)
            .finish()
    }
}
