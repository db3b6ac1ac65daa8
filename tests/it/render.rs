use std::error::Error;
use std::fs;

use reqwest::StatusCode;

use codeserve::{CacheKey, Config, MemoryStore, RenderCache, ViewOptions};

use crate::{new_server, FakeVim};

const LINKED_B_H: &str = r#"&quot;<a style="color: inherit" class="include" href="/b.h">b.h</a>&quot;"#;

#[tokio::test]
async fn includes_are_linked_and_cached() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("a.c"), "#include \"b.h\"\nint main(void);\n")?;
    fs::write(dir.path().join("b.h"), "int b;\n")?;

    let renderer = FakeVim::default();
    let store = MemoryStore::new();
    let server = new_server(
        Config::new(dir.path()),
        renderer.clone(),
        RenderCache::new(store.clone()),
    )
    .await?;

    let url = format!("http://{}/a.c", server.addr());

    let first = reqwest::get(&url).await?;
    assert_eq!(first.status(), StatusCode::OK);
    let first = first.text().await?;
    assert!(first.contains(LINKED_B_H));
    assert!(first.contains("Up directory"));
    assert!(first.contains(r#"<select name="colorscheme""#));

    let second = reqwest::get(&url).await?.text().await?;
    assert_eq!(first, second);
    assert_eq!(renderer.renders(), 1);

    assert_eq!(store.len(), 1);
    let key = CacheKey::new(&dir.path().join("a.c"), &ViewOptions::default());
    let cached = codeserve::CacheStore::get(&store, key.as_str()).await?.unwrap();
    assert!(cached.contains(LINKED_B_H));
    assert!(cached.contains(r#"<select name="colorscheme""#));
    assert!(!cached.contains("Up directory"));

    Ok(())
}

#[tokio::test]
async fn up_link_follows_request_url() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("include"))?;
    fs::write(dir.path().join("include/util.h"), "void util(void);\n")?;

    let renderer = FakeVim::default();
    let config = Config::new(dir.path()).with_search_roots(["include"]);
    let server = new_server(
        config,
        renderer.clone(),
        RenderCache::new(MemoryStore::new()),
    )
    .await?;

    let via_root = reqwest::get(&format!("http://{}/util.h", server.addr()))
        .await?
        .text()
        .await?;
    let direct = reqwest::get(&format!("http://{}/include/util.h", server.addr()))
        .await?
        .text()
        .await?;

    assert_eq!(renderer.renders(), 1);
    assert!(via_root.contains(r#"href="/">Up directory</a>"#));
    assert!(direct.contains(r#"href="/include/">Up directory</a>"#));
    assert_eq!(direct.matches("Up directory").count(), 1);

    Ok(())
}

#[tokio::test]
async fn paths_differing_by_whitespace_are_distinct() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("my file.c"), "int spaced;\n")?;
    fs::write(dir.path().join("myfile.c"), "int joined;\n")?;

    let server = new_server(
        Config::new(dir.path()),
        FakeVim::default(),
        RenderCache::new(MemoryStore::new()),
    )
    .await?;

    let spaced = reqwest::get(&format!("http://{}/my%20file.c", server.addr()))
        .await?
        .text()
        .await?;
    let joined = reqwest::get(&format!("http://{}/myfile.c", server.addr()))
        .await?
        .text()
        .await?;

    assert!(spaced.contains("int spaced;"));
    assert!(joined.contains("int joined;"));
    assert!(!joined.contains("int spaced;"));

    Ok(())
}

#[tokio::test]
async fn decorations_follow_body_tag() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("src"))?;
    fs::write(dir.path().join("src/main.c"), "int main(void);\n")?;

    let server = new_server(Config::new(dir.path()), FakeVim::default(), RenderCache::disabled())
        .await?;

    let body = reqwest::get(&format!("http://{}/src/main.c", server.addr()))
        .await?
        .text()
        .await?;

    let body_tag = body.find("<body>").unwrap();
    let up_link = body.find("Up directory").unwrap();
    let code = body.find("<pre id='vimCodeElement'>").unwrap();
    assert!(body_tag < up_link && up_link < code);
    assert!(body.contains(r#"href="/src/">Up directory</a>"#));

    Ok(())
}

#[tokio::test]
async fn missing_include_is_left_alone() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join("a.c"),
        "#include \"missing.h\"\n#include <stdio.h>\n",
    )?;

    let server = new_server(Config::new(dir.path()), FakeVim::default(), RenderCache::disabled())
        .await?;

    let body = reqwest::get(&format!("http://{}/a.c", server.addr()))
        .await?
        .text()
        .await?;

    assert!(body.contains(r#"<span class="Constant">&quot;missing.h&quot;</span>"#));
    assert!(body.contains(r#"<span class="Constant">&lt;stdio.h&gt;</span>"#));
    assert!(!body.contains(r#"class="include""#));

    Ok(())
}

#[tokio::test]
async fn includes_found_in_search_roots() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("include/sys"))?;
    fs::write(dir.path().join("a.c"), "#include <sys/types.h>\n")?;
    fs::write(dir.path().join("include/sys/types.h"), "typedef int pid_t;\n")?;

    let config = Config::new(dir.path()).with_search_roots(["include"]);
    let server = new_server(config, FakeVim::default(), RenderCache::disabled()).await?;

    let body = reqwest::get(&format!("http://{}/a.c", server.addr()))
        .await?
        .text()
        .await?;
    assert!(body.contains(
        r#"&lt;<a style="color: inherit" class="include" href="/sys/types.h">sys/types.h</a>&gt;"#
    ));

    let res = reqwest::get(&format!("http://{}/sys/types.h", server.addr())).await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn include_next_to_current_file() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("src"))?;
    fs::write(dir.path().join("src/main.c"), "#include \"local.h\"\n")?;
    fs::write(dir.path().join("src/local.h"), "int local;\n")?;

    let server = new_server(Config::new(dir.path()), FakeVim::default(), RenderCache::disabled())
        .await?;

    let body = reqwest::get(&format!("http://{}/src/main.c", server.addr()))
        .await?
        .text()
        .await?;
    assert!(body.contains(r#"class="include" href="/src/local.h">local.h</a>"#));

    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn render_failure_is_reported_and_not_cached() -> Result<(), Box<dyn Error>> {
    use crate::BrokenVim;

    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("a.c"), "int main(void);\n")?;

    let store = MemoryStore::new();
    let server = new_server(
        Config::new(dir.path()),
        BrokenVim,
        RenderCache::new(store.clone()),
    )
    .await?;

    let res = reqwest::get(&format!("http://{}/a.c", server.addr())).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = res.text().await?;
    assert!(body.starts_with("Vim error"));
    assert!(body.contains("E185: Cannot find color scheme"));
    assert!(store.is_empty());

    Ok(())
}
