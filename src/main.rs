use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use codeserve::cache::DEFAULT_MEMCACHED_ADDR;
use codeserve::{Config, Memcached, MemoryStore, RenderCache, Server, VimRenderer, DEFAULT_COLOR_DIR};

/// Browse source code as syntax-highlighted, cross-linked HTML.
#[derive(Debug, Parser)]
#[command(name = "codeserve", version, about)]
struct Args {
    /// Include paths to use when searching for code, relative to the base path.
    #[arg(short, long = "include", value_name = "DIR", num_args = 1..)]
    include: Vec<PathBuf>,

    /// The base path to serve code from.
    #[arg(short, long, env = "CODESERVE_BASE_PATH", default_value = ".")]
    base_path: PathBuf,

    /// The port to run the server on.
    #[arg(short, long, env = "CODESERVE_PORT", default_value_t = 8000)]
    port: u16,

    /// The address to listen on.
    #[arg(long, env = "CODESERVE_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Extra commands to run in Vim before rendering, without the leading `+`.
    #[arg(short, long = "vim-args", value_name = "COMMAND", num_args = 1..)]
    vim_args: Vec<String>,

    /// The Vim executable used for rendering.
    #[arg(long, env = "CODESERVE_VIM", default_value = "vim")]
    vim: PathBuf,

    /// The directory to find Vim color schemes in.
    #[arg(short, long = "color-dir", env = "CODESERVE_COLOR_DIR", default_value = DEFAULT_COLOR_DIR)]
    color_dir: PathBuf,

    /// Where rendered pages are cached.
    #[arg(long, value_enum, env = "CODESERVE_CACHE", default_value_t = CacheBackend::Memcached)]
    cache: CacheBackend,

    /// Address of the memcached server.
    #[arg(long, env = "CODESERVE_MEMCACHED", default_value = DEFAULT_MEMCACHED_ADDR)]
    memcached: String,

    /// Prevent caching of the pages.
    #[arg(long)]
    no_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CacheBackend {
    /// A memcached server.
    Memcached,
    /// Memory of this process.
    Memory,
    /// No caching.
    Off,
}

impl Args {
    fn render_cache(&self) -> RenderCache {
        if self.no_cache {
            return RenderCache::disabled();
        }

        match self.cache {
            CacheBackend::Memcached => RenderCache::new(Memcached::new(self.memcached.clone())),
            CacheBackend::Memory => RenderCache::new(MemoryStore::new()),
            CacheBackend::Off => RenderCache::disabled(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("codeserve=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let config = Config::new(&args.base_path)
        .with_search_roots(args.include.iter().cloned())
        .with_theme_dir(&args.color_dir);

    let renderer = VimRenderer::new()
        .with_program(&args.vim)
        .with_directives(args.vim_args.clone());

    let addr = SocketAddr::new(args.host, args.port);
    let server = Server::bind(&addr, config, renderer, args.render_cache()).await?;

    println!(
        "Go to http://localhost:{} to view your source.",
        server.addr().port()
    );

    tokio::signal::ctrl_c().await?;

    Ok(())
}
