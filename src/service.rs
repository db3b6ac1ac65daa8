use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, RawQuery},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use tracing::log::*;

use crate::cache::{CacheKey, RenderCache};
use crate::include::{add_query_to_links, link_includes, INCLUDE_LINK_MARKER};
use crate::page::{insert_after_body, Pages};
use crate::render::Renderer;
use crate::resolve::{Resolved, Resolver};
use crate::themes::ThemeCatalog;
use crate::{Config, Error, ViewOptions};

/// Everything a request needs, shared by all requests.
pub(crate) struct AppState {
    pub config: Arc<Config>,
    pub renderer: Arc<dyn Renderer>,
    pub cache: RenderCache,
    pub themes: ThemeCatalog,
    pub pages: Pages,
}

pub(crate) async fn serve_root(
    Extension(state): Extension<Arc<AppState>>,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    serve(&state, "", &uri, query.as_deref()).await
}

pub(crate) async fn serve_path(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
    uri: Uri,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    serve(&state, &path, &uri, query.as_deref()).await
}

async fn serve(
    state: &AppState,
    path: &str,
    uri: &Uri,
    query: Option<&str>,
) -> Result<Response, Error> {
    let themes = state.themes.names();
    let mut options = ViewOptions::from_query(query);
    options.retain_known_theme(themes);

    let url = path.trim_matches('/');
    let url = if url.is_empty() { "." } else { url };

    let target = match Resolver::new(&state.config).resolve(url) {
        Some(target) => target,
        None => {
            info!("not found: {}", uri);
            return Err(Error::NotFound);
        }
    };

    if target.path.is_dir() {
        if !uri.path().ends_with('/') {
            return Ok(redirect_to_directory(uri));
        }

        return list_directory(state, &target, url, &options);
    }

    send_file(state, &target, url, &options, themes).await
}

/// Redirects `/dir?query` to `/dir/?query`.
fn redirect_to_directory(uri: &Uri) -> Response {
    let location = match uri.query() {
        Some(query) => format!("{}/?{}", uri.path(), query),
        None => format!("{}/", uri.path()),
    };

    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

fn list_directory(
    state: &AppState,
    target: &Resolved,
    url: &str,
    options: &ViewOptions,
) -> Result<Response, Error> {
    let listing = state.pages.listing(&target.path, url)?;
    let listing = add_query_to_links(&listing, "", &options.query_string());
    let listing = insert_after_body(&listing, &state.pages.up_link(url, options)?);

    Ok(Html(listing).into_response())
}

async fn send_file(
    state: &AppState,
    target: &Resolved,
    url: &str,
    options: &ViewOptions,
    themes: &[String],
) -> Result<Response, Error> {
    let key = CacheKey::new(&target.path, options);

    let html = match state.cache.get(&key).await {
        Some(html) => html,
        None => {
            let html = render_page(state, target, options, themes).await?;
            state.cache.set(&key, &html).await;
            html
        }
    };

    // The same file can be reached through several URLs, so the up link is never cached.
    let html = insert_after_body(&html, &state.pages.up_link(url, options)?);
    let html = add_query_to_links(&html, INCLUDE_LINK_MARKER, &options.query_string());

    Ok(Html(html.into_owned()).into_response())
}

/// Renders the file, links its includes and adds the view-options form.
async fn render_page(
    state: &AppState,
    target: &Resolved,
    options: &ViewOptions,
    themes: &[String],
) -> Result<String, Error> {
    let renderer = Arc::clone(&state.renderer);
    let path: PathBuf = target.path.clone();
    let render_options = options.clone();

    let html =
        tokio::task::spawn_blocking(move || renderer.render(&path, &render_options)).await??;

    let resolver = Resolver::new(&state.config);
    let html = link_includes(&html, &target.path, &resolver);

    let form = state.pages.view_options(options, themes)?;

    Ok(insert_after_body(&html, &form))
}
