use std::error::Error;
use std::fs;

use reqwest::StatusCode;

use codeserve::{Config, RenderCache};

use crate::{client, new_server, FakeVim};

fn tree() -> std::io::Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("src/net"))?;
    fs::create_dir_all(dir.path().join("include"))?;
    fs::write(dir.path().join("a.c"), "int main(void);\n")?;
    fs::write(dir.path().join("src/main.c"), "int main(void);\n")?;
    fs::write(dir.path().join("include/util.h"), "void util(void);\n")?;
    Ok(dir)
}

#[tokio::test]
async fn not_found() -> Result<(), Box<dyn Error>> {
    let dir = tree()?;
    let server = new_server(Config::new(dir.path()), FakeVim::default(), RenderCache::disabled())
        .await?;

    let res = reqwest::get(&format!("http://{}/non-existent.c", server.addr())).await?;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.text().await?.contains("Path does not exist"));

    Ok(())
}

#[tokio::test]
async fn root_listing() -> Result<(), Box<dyn Error>> {
    let dir = tree()?;
    let server = new_server(Config::new(dir.path()), FakeVim::default(), RenderCache::disabled())
        .await?;

    let res = reqwest::get(&format!("http://{}/", server.addr())).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["Content-Type"]
        .to_str()?
        .starts_with("text/html"));

    let body = res.text().await?;
    assert!(body.contains(r#"<a href="/a.c">a.c</a>"#));
    assert!(body.contains(r#"<a href="/include/">include/</a>"#));
    assert!(body.contains(r#"<a href="/src/">src/</a>"#));
    assert!(body.contains("Up directory"));

    Ok(())
}

#[tokio::test]
async fn nested_listing_links_carry_query() -> Result<(), Box<dyn Error>> {
    let dir = tree()?;
    let server = new_server(Config::new(dir.path()), FakeVim::default(), RenderCache::disabled())
        .await?;

    let body = reqwest::get(&format!("http://{}/src/?nu=on&bg=dark", server.addr()))
        .await?
        .text()
        .await?;

    assert!(body.contains(r#"<a href="/src/main.c?bg=dark&amp;nu=on">main.c</a>"#));
    assert!(body.contains(r#"<a href="/src/net/?bg=dark&amp;nu=on">net/</a>"#));
    assert!(body.contains(r#"href="/?bg=dark&amp;nu=on">Up directory</a>"#));

    Ok(())
}

#[tokio::test]
async fn directory_without_slash_redirects() -> Result<(), Box<dyn Error>> {
    let dir = tree()?;
    let server = new_server(Config::new(dir.path()), FakeVim::default(), RenderCache::disabled())
        .await?;
    let client = client();

    let res = client
        .get(format!("http://{}/src", server.addr()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()["Location"], "/src/");

    let res = client
        .get(format!("http://{}/src/net?colorscheme=desert&bg=light", server.addr()))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        res.headers()["Location"],
        "/src/net/?colorscheme=desert&bg=light"
    );

    Ok(())
}

#[tokio::test]
async fn additional_search_roots() -> Result<(), Box<dyn Error>> {
    let dir = tree()?;
    let config = Config::new(dir.path()).with_search_roots(["include"]);
    let renderer = FakeVim::default();
    let server = new_server(config, renderer.clone(), RenderCache::disabled()).await?;

    let res = reqwest::get(&format!("http://{}/util.h", server.addr())).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await?.contains("void util(void);"));
    assert_eq!(renderer.renders(), 1);

    Ok(())
}

#[tokio::test]
async fn traversal_outside_base_is_not_found() -> Result<(), Box<dyn Error>> {
    let dir = tree()?;
    let server = new_server(
        Config::new(dir.path().join("src")),
        FakeVim::default(),
        RenderCache::disabled(),
    )
    .await?;

    let res = reqwest::get(&format!("http://{}/%2E%2E/a.c", server.addr())).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = reqwest::get(&format!("http://{}/main.c", server.addr())).await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}
